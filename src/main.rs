fn main() {
    if let Err(e) = labdispatch_lib::run() {
        eprintln!("labdispatch: {e}");
        std::process::exit(1);
    }
}
