mod app;

use std::process::ExitCode;

use app::error::TransplantError;

fn main() -> ExitCode {
    let Err(err) = app::run() else {
        return ExitCode::SUCCESS;
    };

    match err.downcast_ref::<TransplantError>() {
        // Let clap render --help, --version and usage errors itself
        Some(TransplantError::Usage(usage)) => usage.exit(),
        Some(typed) => {
            eprintln!("transplant: {:#}", err);
            ExitCode::from(typed.exit_code() as u8)
        }
        None => {
            eprintln!("transplant: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
