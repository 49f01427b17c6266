// facepreserve-cli/src/main.rs
//
// Entry point for the `facepreserve` binary: parses arguments, installs the
// logger, dispatches to the command and maps failures to a non-zero exit.

use clap::Parser;
use facepreserve_cli::logging::init_logging;
use facepreserve_cli::{Cli, Commands, run_encode};
use std::process;

fn main() {
    let cli = Cli::parse();

    let log_path = match init_logging(cli.verbose, cli.log_file.as_deref()) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    if let Some(path) = &log_path {
        eprintln!("Logging to {}", path.display());
    }

    let result = match cli.command {
        Commands::Encode(args) => run_encode(args, log_path.is_some()),
    };

    if let Err(e) = result {
        log::error!("{e}");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
