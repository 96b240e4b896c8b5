use clap::Parser;
use gallery_tidy::cli::{Args, run_cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();
    gallery_tidy::init_logging(args.verbose);

    // Per-file problems are reported along the way and never fail the run.
    match run_cli(&args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
