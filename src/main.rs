use std::process::ExitCode;

fn main() -> ExitCode {
    match codescan::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
