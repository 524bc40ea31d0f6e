fn main() {
    if let Err(err) = result_analyzer::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
