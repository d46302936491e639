fn main() {
    env_logger::init();

    if let Err(error) = volume_annotator::run_cli() {
        eprintln!("{error}");
        std::process::exit(1);
    }
}
