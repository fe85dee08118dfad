//! Binary entrypoint for the `fsprobe` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    fsprobe::logging::init_tracing();
    match fsprobe::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
