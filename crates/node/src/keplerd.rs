fn main() {
    if let Err(err) = kepler::run_entry() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
