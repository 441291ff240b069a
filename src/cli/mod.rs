use std::fs;
use std::io::Read;
use std::path::Path;

use clap::{Parser, Subcommand};

use crate::error::PatchmarkError;

pub mod apply;
pub mod check;

#[derive(Debug, Parser)]
#[command(name = "patchmark")]
#[command(about = "Apply sentinel-wrapped unified diff patches")]
#[command(
    long_about = "Parses, validates, and applies '*** Begin Patch' wrapped unified diffs to a directory tree. Canonical flow: check a patch, then apply it."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Validate a patch and apply it under a root directory")]
    Apply(apply::ApplyArgs),
    #[command(about = "Parse and validate a patch without touching any file")]
    Check(check::CheckArgs),
}

pub(crate) fn read_patch_text(input: Option<&Path>) -> Result<String, PatchmarkError> {
    match input {
        Some(path) => fs::read_to_string(path).map_err(|error| PatchmarkError::io(path, error)),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|source| PatchmarkError::StdinRead { source })?;
            Ok(text)
        }
    }
}
