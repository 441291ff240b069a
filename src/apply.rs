use serde::Serialize;

use crate::error::PatchmarkError;
use crate::parse::parse_plan;
use crate::plan::{PatchOperation, Plan};
use crate::store::Store;
use crate::validate::validate_plan;

mod buffer;
mod hunks;
mod operations;

#[cfg(test)]
mod tests;

pub use buffer::FileBuffer;

/// Line comparison used while anchoring hunks in a buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WhitespaceMode {
    /// Compare lines verbatim.
    #[default]
    Exact,
    /// Compare after removing every Unicode whitespace code point.
    IgnoreAll,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyConfig {
    pub whitespace: WhitespaceMode,
    /// Maximum number of leading/trailing context lines a hunk may shed
    /// while searching for its anchor.
    pub context_tolerance: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    pub applied: Vec<DirectiveResult>,
    pub summary: ApplySummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectiveResult {
    pub path: String,
    pub operation: PatchOperation,
    pub hunks_applied: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplySummary {
    pub files_changed: usize,
    pub hunks_applied: usize,
}

/// Parses, validates, and applies patch text in one call.
pub fn apply_patch_text(
    text: &str,
    store: &mut dyn Store,
    config: &ApplyConfig,
) -> Result<ApplyReport, PatchmarkError> {
    let plan = parse_plan(text)?;
    apply_plan(&plan, store, config)
}

/// Validates the plan, then applies each directive in plan order. The first
/// failure propagates; directives already applied are not rolled back.
pub fn apply_plan(
    plan: &Plan,
    store: &mut dyn Store,
    config: &ApplyConfig,
) -> Result<ApplyReport, PatchmarkError> {
    validate_plan(plan)?;

    let mut applied = Vec::with_capacity(plan.directives.len());
    for directive in &plan.directives {
        applied.push(operations::apply_directive(directive, store, config)?);
    }

    let summary = summarize_applied(&applied);
    Ok(ApplyReport { applied, summary })
}

fn summarize_applied(applied: &[DirectiveResult]) -> ApplySummary {
    ApplySummary {
        files_changed: applied.len(),
        hunks_applied: applied.iter().map(|result| result.hunks_applied).sum(),
    }
}
