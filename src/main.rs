fn main() {
    if let Err(err) = kronos_eye::cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
