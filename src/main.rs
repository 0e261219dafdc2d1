fn main() {
    if let Err(err) = graphcola::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
