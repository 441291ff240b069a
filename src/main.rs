use std::process::ExitCode;

use clap::Parser;
use patchmark::cli::{Cli, Commands};
use patchmark::error::PatchmarkError;

fn main() -> ExitCode {
    match run() {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            let serialized = serde_json::to_string_pretty(&error.to_error_response())
                .unwrap_or_else(|_| {
                    "{\"error\":{\"type\":\"serialization_error\",\"message\":\"Failed to serialize error response\"}}"
                        .to_string()
                });
            println!("{serialized}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<String, PatchmarkError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Apply(args) => {
            let response = patchmark::cli::apply::run_apply(args)?;
            serde_json::to_string_pretty(&response)
                .map_err(|source| PatchmarkError::ResponseSerialization { source })
        }
        Commands::Check(args) => {
            let response = patchmark::cli::check::run_check(args)?;
            serde_json::to_string_pretty(&response)
                .map_err(|source| PatchmarkError::ResponseSerialization { source })
        }
    }
}
