use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match mllpd::run_daemon(std::env::args_os()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            // Nothing is left to report to when stderr itself fails.
            writeln!(io::stderr().lock(), "mllpd: {error}").ok();
            ExitCode::FAILURE
        }
    }
}
