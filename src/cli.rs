use crate::config::load_config;
use crate::constraint::translate;
use crate::dump::{EngineInputDump, write_engine_dump};
use crate::graph::GraphStore;
use crate::ports::PortPlacer;
use crate::scene::{SceneAdapter, parse_scene, validate_scene};
use anyhow::Result;
use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "gcdump", version, about = "Engine-input inspector for graphcola scenes")]
pub struct Args {
    /// Input scene (.json/.json5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Print aggregate counts instead of the full dump
    #[arg(long = "stats")]
    pub stats: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let input = read_input(args.input.as_deref())?;
    let scene =
        parse_scene(&input).map_err(|message| anyhow::anyhow!("scene parse error: {message}"))?;
    validate_scene(&scene)?;

    let mut store = GraphStore::new(SceneAdapter);
    let report = store.reconcile(&scene.nodes, &scene.edges, &config.reconcile);
    let translated = translate(&scene.constraints, &store.index_map(), &config.constraint);
    let mut placer = PortPlacer::new(&config.ports);
    placer.place(&mut store);

    if args.stats {
        println!("nodes: {}", report.nodes);
        println!("edges: {}", report.edges);
        println!(
            "links: {}",
            store.engine_links().len() + translated.extra_links.len()
        );
        println!("constraints: {}", translated.constraints.len());
        return Ok(());
    }

    let dump = EngineInputDump::from_store(&store, &translated);
    match args.output.as_deref() {
        Some(path) => write_engine_dump(path, &dump)?,
        None => {
            serde_json::to_writer_pretty(io::stdout().lock(), &dump)?;
            println!();
        }
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
