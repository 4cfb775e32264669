//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = aerobase_cli::run() {
        eprintln!("aerobase: {err}");
        std::process::exit(1);
    }
}
