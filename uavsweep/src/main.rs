use std::process::ExitCode;

fn main() -> ExitCode {
    match uavsweep::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if uavsweep::is_interrupted(&e) => {
            eprintln!("\n{}", e);
            ExitCode::from(130)
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
