use std::collections::{BTreeMap, BTreeSet};

use crate::error::PatchmarkError;
use crate::parse::interpret_path_payload;
use crate::plan::{Directive, Hunk, Line, PatchOperation, Plan};


/// Checks every invariant a plan must satisfy before the applicator may run:
/// cross-directive path bookkeeping, intra-hunk shape, and metadata
/// consistency. Inspects only; never mutates the plan or touches a store.
pub fn validate_plan(plan: &Plan) -> Result<(), PatchmarkError> {
    let mut seen_old_paths: BTreeSet<&str> = BTreeSet::new();
    let mut new_path_owners: BTreeMap<&str, PatchOperation> = BTreeMap::new();

    for directive in &plan.directives {
        validate_directive_paths(directive, &mut seen_old_paths, &mut new_path_owners)?;
        for hunk in &directive.hunks {
            validate_hunk(hunk, directive.operation)?;
        }
        validate_directive_content(directive)?;
        validate_metadata(directive)?;
    }

    Ok(())
}

fn validate_directive_paths<'a>(
    directive: &'a Directive,
    seen_old_paths: &mut BTreeSet<&'a str>,
    new_path_owners: &mut BTreeMap<&'a str, PatchOperation>,
) -> Result<(), PatchmarkError> {
    let operation = directive.operation;
    match operation {
        PatchOperation::Add => {
            if directive.old_path.is_some() {
                return Err(PatchmarkError::validation(
                    "add directive must not carry an old path",
                ));
            }
            let new_path = required_path(&directive.new_path, operation, "target")?;
            claim_new_path(new_path_owners, new_path, operation)?;
        }
        PatchOperation::Delete => {
            if directive.new_path.is_some() {
                return Err(PatchmarkError::validation(
                    "delete directive must not carry a new path",
                ));
            }
            let old_path = required_path(&directive.old_path, operation, "source")?;
            record_old_path(seen_old_paths, old_path)?;
        }
        PatchOperation::Modify => {
            let old_path = required_path(&directive.old_path, operation, "target")?;
            let new_path = required_path(&directive.new_path, operation, "target")?;
            if old_path != new_path {
                return Err(PatchmarkError::validation(format!(
                    "modify directive paths disagree: '{old_path}' vs '{new_path}'"
                )));
            }
            record_old_path(seen_old_paths, old_path)?;
            match new_path_owners.get(old_path) {
                Some(PatchOperation::Modify) => {
                    return Err(PatchmarkError::validation(format!(
                        "path '{old_path}' is modified by more than one directive"
                    )));
                }
                Some(_) => {
                    new_path_owners.insert(old_path, PatchOperation::Modify);
                }
                None => {}
            }
        }
        PatchOperation::Rename => {
            let old_path = required_path(&directive.old_path, operation, "source")?;
            let new_path = required_path(&directive.new_path, operation, "destination")?;
            require_distinct(old_path, new_path, operation)?;
            record_old_path(seen_old_paths, old_path)?;
            claim_new_path(new_path_owners, new_path, operation)?;
        }
        PatchOperation::Copy => {
            let old_path = required_path(&directive.old_path, operation, "source")?;
            let new_path = required_path(&directive.new_path, operation, "destination")?;
            require_distinct(old_path, new_path, operation)?;
            claim_new_path(new_path_owners, new_path, operation)?;
        }
    }
    Ok(())
}

fn required_path<'a>(
    path: &'a Option<String>,
    operation: PatchOperation,
    role: &str,
) -> Result<&'a str, PatchmarkError> {
    path.as_deref().ok_or_else(|| {
        PatchmarkError::validation(format!(
            "{} directive requires a {role} path",
            operation.label()
        ))
    })
}

fn require_distinct(
    old_path: &str,
    new_path: &str,
    operation: PatchOperation,
) -> Result<(), PatchmarkError> {
    if old_path == new_path {
        return Err(PatchmarkError::validation(format!(
            "{} directive requires distinct paths, got '{old_path}' twice",
            operation.label()
        )));
    }
    Ok(())
}

fn record_old_path<'a>(
    seen_old_paths: &mut BTreeSet<&'a str>,
    path: &'a str,
) -> Result<(), PatchmarkError> {
    if !seen_old_paths.insert(path) {
        return Err(PatchmarkError::validation(format!(
            "path '{path}' is consumed by more than one directive"
        )));
    }
    Ok(())
}

fn claim_new_path<'a>(
    new_path_owners: &mut BTreeMap<&'a str, PatchOperation>,
    path: &'a str,
    operation: PatchOperation,
) -> Result<(), PatchmarkError> {
    if new_path_owners.contains_key(path) {
        return Err(PatchmarkError::validation(format!(
            "path '{path}' is produced by more than one directive"
        )));
    }
    new_path_owners.insert(path, operation);
    Ok(())
}

fn validate_directive_content(directive: &Directive) -> Result<(), PatchmarkError> {
    let requires_hunks = matches!(
        directive.operation,
        PatchOperation::Add | PatchOperation::Delete | PatchOperation::Modify
    );
    if requires_hunks && directive.hunks.is_empty() {
        return Err(PatchmarkError::validation(format!(
            "{} directive requires at least one hunk",
            directive.operation.label()
        )));
    }
    Ok(())
}

fn validate_hunk(hunk: &Hunk, operation: PatchOperation) -> Result<(), PatchmarkError> {
    if hunk.lines.is_empty() {
        return Err(PatchmarkError::validation("hunk has no lines"));
    }

    for line in &hunk.lines {
        if let Some(text) = line.text() {
            if text.contains('\r') {
                return Err(PatchmarkError::validation(
                    "carriage return in patch line; normalize line endings first",
                ));
            }
        }
    }

    validate_newline_markers(hunk)?;

    if let Some(range) = hunk.old_range {
        let old_side = hunk.old_side_count() as u64;
        if range.len != old_side {
            return Err(PatchmarkError::validation(format!(
                "hunk header claims {} old lines but the body has {old_side}",
                range.len
            )));
        }
    }
    if let Some(range) = hunk.new_range {
        let new_side = hunk.new_side_count() as u64;
        if range.len != new_side {
            return Err(PatchmarkError::validation(format!(
                "hunk header claims {} new lines but the body has {new_side}",
                range.len
            )));
        }
    }

    let additions = hunk
        .lines
        .iter()
        .filter(|line| matches!(line, Line::Addition(_)))
        .count();
    let deletions = hunk
        .lines
        .iter()
        .filter(|line| matches!(line, Line::Deletion(_)))
        .count();
    let contexts = hunk
        .lines
        .iter()
        .filter(|line| matches!(line, Line::Context(_)))
        .count();

    match operation {
        PatchOperation::Add => {
            if deletions > 0 || contexts > 0 {
                return Err(PatchmarkError::validation(
                    "add hunks may only contain added lines",
                ));
            }
            if additions == 0 {
                return Err(PatchmarkError::validation(
                    "add hunk must contain at least one added line",
                ));
            }
        }
        PatchOperation::Delete => {
            if additions > 0 || contexts > 0 {
                return Err(PatchmarkError::validation(
                    "delete hunks may only contain deleted lines",
                ));
            }
            if deletions == 0 {
                return Err(PatchmarkError::validation(
                    "delete hunk must contain at least one deleted line",
                ));
            }
        }
        PatchOperation::Modify | PatchOperation::Rename | PatchOperation::Copy => {
            if additions == 0 && deletions == 0 {
                return Err(PatchmarkError::validation("hunk changes nothing"));
            }
        }
    }

    Ok(())
}

/// A no-newline marker binds to the old side when it follows a deletion and
/// to the new side otherwise. Each side gets at most one, and nothing may
/// follow a marker except the other side's closing lines.
fn validate_newline_markers(hunk: &Hunk) -> Result<(), PatchmarkError> {
    let mut old_side_marker = false;
    let mut new_side_marker = false;

    for (index, line) in hunk.lines.iter().enumerate() {
        if !matches!(line, Line::NoNewlineMarker) {
            continue;
        }
        let preceding = hunk.lines[..index]
            .iter()
            .rev()
            .find(|line| !matches!(line, Line::NoNewlineMarker));
        let Some(preceding) = preceding else {
            return Err(PatchmarkError::validation(
                "no-newline marker must follow a patch line",
            ));
        };

        if matches!(preceding, Line::Deletion(_)) {
            if old_side_marker {
                return Err(PatchmarkError::validation(
                    "duplicate no-newline marker for the old file",
                ));
            }
            old_side_marker = true;
            for later in &hunk.lines[index + 1..] {
                if !matches!(later, Line::Addition(_) | Line::NoNewlineMarker) {
                    return Err(PatchmarkError::validation(
                        "no-newline marker must terminate the old side of a hunk",
                    ));
                }
            }
        } else {
            if new_side_marker {
                return Err(PatchmarkError::validation(
                    "duplicate no-newline marker for the new file",
                ));
            }
            new_side_marker = true;
            if index != hunk.lines.len() - 1 {
                return Err(PatchmarkError::validation(
                    "no-newline marker must be the final hunk line",
                ));
            }
        }
    }

    Ok(())
}

fn validate_metadata(directive: &Directive) -> Result<(), PatchmarkError> {
    let metadata = &directive.metadata;
    let operation = directive.operation;

    if metadata.is_binary {
        return Err(PatchmarkError::validation(
            "binary patches are not supported",
        ));
    }

    if metadata.rename_from.is_some() || metadata.rename_to.is_some() {
        if operation != PatchOperation::Rename {
            return Err(PatchmarkError::validation(format!(
                "rename metadata is not valid on a {} directive",
                operation.label()
            )));
        }
        check_metadata_path(&metadata.rename_from, &directive.old_path, "rename from")?;
        check_metadata_path(&metadata.rename_to, &directive.new_path, "rename to")?;
    }

    if metadata.copy_from.is_some() || metadata.copy_to.is_some() {
        if operation != PatchOperation::Copy {
            return Err(PatchmarkError::validation(format!(
                "copy metadata is not valid on a {} directive",
                operation.label()
            )));
        }
        check_metadata_path(&metadata.copy_from, &directive.old_path, "copy from")?;
        check_metadata_path(&metadata.copy_to, &directive.new_path, "copy to")?;
    }

    if metadata.similarity_index.is_some() || metadata.dissimilarity_index.is_some() {
        if !matches!(operation, PatchOperation::Rename | PatchOperation::Copy) {
            return Err(PatchmarkError::validation(format!(
                "similarity metadata is not valid on a {} directive",
                operation.label()
            )));
        }
    }

    if let Some(mode_change) = &metadata.mode_change {
        if operation == PatchOperation::Add && mode_change.old_mode.is_some() {
            return Err(PatchmarkError::validation(
                "old mode metadata is not valid on an add directive",
            ));
        }
        if operation == PatchOperation::Delete && mode_change.new_mode.is_some() {
            return Err(PatchmarkError::validation(
                "new mode metadata is not valid on a delete directive",
            ));
        }
    }

    Ok(())
}

fn check_metadata_path(
    metadata_value: &Option<String>,
    directive_path: &Option<String>,
    label: &str,
) -> Result<(), PatchmarkError> {
    let Some(value) = metadata_value else {
        return Ok(());
    };
    let normalized = interpret_path_payload(value);
    if normalized != *directive_path {
        return Err(PatchmarkError::validation(format!(
            "'{label}' metadata path '{value}' does not match the directive path"
        )));
    }
    Ok(())
}
