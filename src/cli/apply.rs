use std::path::PathBuf;

use clap::{Args, ValueEnum};
use serde::Serialize;

use crate::apply::{
    apply_plan, ApplyConfig, ApplyReport, ApplySummary, DirectiveResult, WhitespaceMode,
};
use crate::error::PatchmarkError;
use crate::parse::parse_plan;
use crate::store::{FsStore, SandboxStore};
use crate::validate::validate_plan;

#[derive(Debug, Args)]
pub struct ApplyArgs {
    #[arg(
        long,
        default_value = ".",
        help = "Directory the patch paths are resolved against"
    )]
    pub root: PathBuf,
    #[arg(long, help = "Reject paths that resolve outside the root directory")]
    pub sandbox: bool,
    #[arg(long, help = "Validate the patch without writing files")]
    pub dry_run: bool,
    #[arg(
        long,
        value_enum,
        default_value_t = WhitespaceArg::Exact,
        help = "Line comparison used while matching hunks"
    )]
    pub whitespace: WhitespaceArg,
    #[arg(
        long,
        default_value_t = 0,
        help = "Context lines a hunk may shed while searching for its anchor"
    )]
    pub context_tolerance: usize,
    #[arg(long, help = "Include per-directive results in output")]
    pub verbose: bool,
    #[arg(
        value_name = "PATCH",
        help = "Path to patch text; if omitted, read from stdin"
    )]
    pub input: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WhitespaceArg {
    Exact,
    IgnoreAll,
}

impl From<WhitespaceArg> for WhitespaceMode {
    fn from(value: WhitespaceArg) -> Self {
        match value {
            WhitespaceArg::Exact => Self::Exact,
            WhitespaceArg::IgnoreAll => Self::IgnoreAll,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Applied,
    DryRun,
}

#[derive(Debug, Serialize)]
pub struct ApplyCliResponse {
    pub summary: ApplySummary,
    pub transaction: TransactionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied: Option<Vec<DirectiveResult>>,
}

pub fn run_apply(args: ApplyArgs) -> Result<ApplyCliResponse, PatchmarkError> {
    let text = super::read_patch_text(args.input.as_deref())?;
    let plan = parse_plan(&text)?;
    let config = ApplyConfig {
        whitespace: args.whitespace.into(),
        context_tolerance: args.context_tolerance,
    };

    if args.dry_run {
        validate_plan(&plan)?;
        let summary = ApplySummary {
            files_changed: plan.directives.len(),
            hunks_applied: plan
                .directives
                .iter()
                .map(|directive| directive.hunks.len())
                .sum(),
        };
        return Ok(ApplyCliResponse {
            summary,
            transaction: TransactionStatus::DryRun,
            applied: None,
        });
    }

    let report = if args.sandbox {
        let mut store = SandboxStore::new(FsStore::new(&args.root), &args.root);
        apply_plan(&plan, &mut store, &config)?
    } else {
        let mut store = FsStore::new(&args.root);
        apply_plan(&plan, &mut store, &config)?
    };

    Ok(shape_apply_response(report, args.verbose))
}

fn shape_apply_response(report: ApplyReport, verbose: bool) -> ApplyCliResponse {
    ApplyCliResponse {
        summary: report.summary,
        transaction: TransactionStatus::Applied,
        applied: verbose.then_some(report.applied),
    }
}
