#![forbid(unsafe_code)]

use std::process::ExitCode;

use teamboard::app;
use teamboard::cli::{CliArgs, build_cli};

fn main() -> ExitCode {
    let matches = build_cli().get_matches();
    let result = CliArgs::from_matches(&matches).and_then(|args| app::run(&args));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("teamboard: {err}");
            ExitCode::FAILURE
        }
    }
}
