#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod constraint;
pub mod driver;
pub mod dump;
pub mod engine;
pub mod geometry;
pub mod graph;
pub mod ports;
pub mod scene;
pub mod view;

#[cfg(feature = "cli")]
pub use cli::run;
