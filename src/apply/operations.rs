use std::path::Path;

use crate::error::PatchmarkError;
use crate::plan::{parse_file_mode, Directive, Line, PatchOperation};
use crate::store::Store;

use super::buffer::FileBuffer;
use super::hunks::apply_hunks;
use super::{ApplyConfig, DirectiveResult};

pub(super) fn apply_directive(
    directive: &Directive,
    store: &mut dyn Store,
    config: &ApplyConfig,
) -> Result<DirectiveResult, PatchmarkError> {
    match directive.operation {
        PatchOperation::Add => apply_add(directive, store),
        PatchOperation::Delete => apply_delete(directive, store, config),
        PatchOperation::Modify => apply_modify(directive, store, config),
        PatchOperation::Rename => apply_rename(directive, store, config),
        PatchOperation::Copy => apply_copy(directive, store, config),
    }
}

fn apply_add(
    directive: &Directive,
    store: &mut dyn Store,
) -> Result<DirectiveResult, PatchmarkError> {
    let path = required_path(&directive.new_path, directive.operation)?;
    if store.exists(path)? {
        return Err(PatchmarkError::validation(format!(
            "cannot add '{}': the path already exists",
            path.display()
        )));
    }

    let mut buffer = FileBuffer::empty();
    for hunk in &directive.hunks {
        for line in &hunk.lines {
            match line {
                Line::Addition(text) => buffer.lines.push(text.clone()),
                Line::NoNewlineMarker => buffer.has_trailing_newline = false,
                Line::Context(_) | Line::Deletion(_) => {
                    return Err(PatchmarkError::validation(
                        "add hunks may only contain added lines",
                    ));
                }
            }
        }
    }

    store.write(path, buffer.encode().as_bytes())?;
    apply_metadata_mode(directive, store, path)?;
    Ok(directive_result(path, directive))
}

fn apply_delete(
    directive: &Directive,
    store: &mut dyn Store,
    config: &ApplyConfig,
) -> Result<DirectiveResult, PatchmarkError> {
    let path = required_path(&directive.old_path, directive.operation)?;
    if !store.exists(path)? {
        return Err(PatchmarkError::validation(format!(
            "cannot delete '{}': the path does not exist",
            path.display()
        )));
    }

    let mut buffer = FileBuffer::decode(path, store.read(path)?)?;
    apply_hunks(&directive.hunks, &mut buffer, config)?;
    if !buffer.lines.is_empty() {
        return Err(PatchmarkError::validation(format!(
            "delete hunks must remove every line of '{}'",
            path.display()
        )));
    }

    store.remove(path)?;
    Ok(directive_result(path, directive))
}

fn apply_modify(
    directive: &Directive,
    store: &mut dyn Store,
    config: &ApplyConfig,
) -> Result<DirectiveResult, PatchmarkError> {
    let path = required_path(&directive.old_path, directive.operation)?;
    if !store.exists(path)? {
        return Err(PatchmarkError::validation(format!(
            "cannot modify '{}': the path does not exist",
            path.display()
        )));
    }

    let mut buffer = FileBuffer::decode(path, store.read(path)?)?;
    apply_hunks(&directive.hunks, &mut buffer, config)?;
    store.write(path, buffer.encode().as_bytes())?;
    apply_metadata_mode(directive, store, path)?;
    Ok(directive_result(path, directive))
}

fn apply_rename(
    directive: &Directive,
    store: &mut dyn Store,
    config: &ApplyConfig,
) -> Result<DirectiveResult, PatchmarkError> {
    let old_path = required_path(&directive.old_path, directive.operation)?;
    let new_path = required_path(&directive.new_path, directive.operation)?;
    if !store.exists(old_path)? {
        return Err(PatchmarkError::validation(format!(
            "cannot rename '{}': the source does not exist",
            old_path.display()
        )));
    }

    let captured_mode = store.permissions(old_path)?;

    if directive.hunks.is_empty() {
        store.move_file(old_path, new_path)?;
    } else {
        let mut buffer = FileBuffer::decode(old_path, store.read(old_path)?)?;
        apply_hunks(&directive.hunks, &mut buffer, config)?;
        store.write(new_path, buffer.encode().as_bytes())?;
        store.remove(old_path)?;
    }

    restore_or_apply_mode(directive, store, new_path, captured_mode)?;
    Ok(directive_result(new_path, directive))
}

fn apply_copy(
    directive: &Directive,
    store: &mut dyn Store,
    config: &ApplyConfig,
) -> Result<DirectiveResult, PatchmarkError> {
    let old_path = required_path(&directive.old_path, directive.operation)?;
    let new_path = required_path(&directive.new_path, directive.operation)?;
    if !store.exists(old_path)? {
        return Err(PatchmarkError::validation(format!(
            "cannot copy '{}': the source does not exist",
            old_path.display()
        )));
    }
    if store.exists(new_path)? {
        return Err(PatchmarkError::validation(format!(
            "cannot copy to '{}': the destination already exists",
            new_path.display()
        )));
    }

    let captured_mode = store.permissions(old_path)?;

    let mut buffer = FileBuffer::decode(old_path, store.read(old_path)?)?;
    apply_hunks(&directive.hunks, &mut buffer, config)?;
    store.write(new_path, buffer.encode().as_bytes())?;

    restore_or_apply_mode(directive, store, new_path, captured_mode)?;
    Ok(directive_result(new_path, directive))
}

fn required_path<'a>(
    path: &'a Option<String>,
    operation: PatchOperation,
) -> Result<&'a Path, PatchmarkError> {
    path.as_deref().map(Path::new).ok_or_else(|| {
        PatchmarkError::validation(format!(
            "{} directive is missing a path",
            operation.label()
        ))
    })
}

/// Sets the file mode from metadata when present; returns whether it did.
fn apply_metadata_mode(
    directive: &Directive,
    store: &mut dyn Store,
    path: &Path,
) -> Result<bool, PatchmarkError> {
    let Some(value) = directive.metadata.effective_new_mode() else {
        return Ok(false);
    };
    let Some(mode) = parse_file_mode(value) else {
        return Ok(false);
    };
    store.set_permissions(path, mode)?;
    Ok(true)
}

/// Metadata mode wins; without one, the permissions captured from the source
/// are carried over to the new path.
fn restore_or_apply_mode(
    directive: &Directive,
    store: &mut dyn Store,
    path: &Path,
    captured_mode: Option<u32>,
) -> Result<(), PatchmarkError> {
    if apply_metadata_mode(directive, store, path)? {
        return Ok(());
    }
    if let Some(mode) = captured_mode {
        store.set_permissions(path, mode)?;
    }
    Ok(())
}

fn directive_result(path: &Path, directive: &Directive) -> DirectiveResult {
    DirectiveResult {
        path: path.display().to_string(),
        operation: directive.operation,
        hunks_applied: directive.hunks.len(),
    }
}
