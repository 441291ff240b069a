use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::error::PatchmarkError;
use crate::parse::parse_plan;
use crate::plan::{Directive, PatchOperation};
use crate::validate::validate_plan;

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[arg(
        value_name = "PATCH",
        help = "Path to patch text; if omitted, read from stdin"
    )]
    pub input: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub directives: Vec<DirectiveSummary>,
}

#[derive(Debug, Serialize)]
pub struct DirectiveSummary {
    pub operation: PatchOperation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_path: Option<String>,
    pub hunks: usize,
}

pub fn run_check(args: CheckArgs) -> Result<CheckResponse, PatchmarkError> {
    let text = super::read_patch_text(args.input.as_deref())?;
    let plan = parse_plan(&text)?;
    validate_plan(&plan)?;

    let directives = plan.directives.iter().map(summarize_directive).collect();
    Ok(CheckResponse {
        title: plan.title,
        directives,
    })
}

fn summarize_directive(directive: &Directive) -> DirectiveSummary {
    DirectiveSummary {
        operation: directive.operation,
        old_path: directive.old_path.clone(),
        new_path: directive.new_path.clone(),
        hunks: directive.hunks.len(),
    }
}
