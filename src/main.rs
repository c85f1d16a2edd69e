use clap::Parser;
use telemetry_sink::cli::{dispatch, Cli};

fn main() {
    let cli = Cli::parse();
    if let Err(e) = dispatch(cli) {
        eprintln!("❌ {e:#}");
        std::process::exit(1);
    }
}
