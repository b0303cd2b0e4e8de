fn main() {
    if let Err(err) = health_analyzer::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
