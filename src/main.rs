use colored::Colorize;
use promptspec::cli;
use promptspec::spec::SpecError;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Default the UI language from the system locale; `--lang` overrides it later.
    promptspec::init();

    match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            // Spec-load problems get their own exit code so CI can tell
            // "the spec is broken" apart from "a test failed".
            if e.downcast_ref::<SpecError>().is_some() {
                eprintln!("{} {e}", "Spec error:".red());
                ExitCode::from(2)
            } else {
                eprintln!("{} {e:#}", "Error:".red());
                ExitCode::FAILURE
            }
        }
    }
}
