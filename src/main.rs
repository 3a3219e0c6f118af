//! wikistore binary entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    match wikistore::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
