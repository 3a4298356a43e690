//! snapkeep binary.
//!
//! Meant to be run periodically (cron, systemd timer). Each run creates the
//! current snapshot directories and rotates old ones.

use std::process::ExitCode;

use clap::Parser;
use snapkeep::exit::{codes, exit_code};
use snapkeep::{execute_snapshot, Cli, StderrLogger};
use snapkeep_clock::SystemClock;
use snapkeep_fs::RealFilesystem;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let logger = StderrLogger::stderr(cli.verbosity());

    match execute_snapshot(&cli, &SystemClock, &RealFilesystem, &logger) {
        Ok(_) => ExitCode::from(codes::SUCCESS),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}
