use crate::error::PatchmarkError;
use crate::plan::{FileModeChange, IndexLine, Metadata};

/// Parses accumulated metadata lines into a `Metadata`, keeping the raw
/// lines for lossless round-tripping. Prefixes are matched longest-first.
pub(super) fn parse_metadata_lines(lines: Vec<String>) -> Result<Metadata, PatchmarkError> {
    let mut metadata = Metadata {
        raw_lines: lines.clone(),
        ..Metadata::default()
    };
    for line in &lines {
        apply_metadata_line(&mut metadata, line)?;
    }
    Ok(metadata)
}

fn apply_metadata_line(metadata: &mut Metadata, line: &str) -> Result<(), PatchmarkError> {
    if let Some(value) = line.strip_prefix("deleted file executable mode ") {
        mode_change_mut(metadata).old_mode = Some(value.trim().to_string());
        return Ok(());
    }
    if let Some(value) = line.strip_prefix("new file executable mode ") {
        mode_change_mut(metadata).new_mode = Some(value.trim().to_string());
        return Ok(());
    }
    if let Some(value) = line.strip_prefix("dissimilarity index ") {
        metadata.dissimilarity_index = Some(parse_percentage(line, value)?);
        return Ok(());
    }
    if let Some(value) = line.strip_prefix("similarity index ") {
        metadata.similarity_index = Some(parse_percentage(line, value)?);
        return Ok(());
    }
    if let Some(value) = line.strip_prefix("deleted file mode ") {
        mode_change_mut(metadata).old_mode = Some(value.trim().to_string());
        return Ok(());
    }
    if let Some(value) = line.strip_prefix("new file mode ") {
        mode_change_mut(metadata).new_mode = Some(value.trim().to_string());
        return Ok(());
    }
    if let Some(value) = line.strip_prefix("mode change ") {
        let (old_mode, new_mode) = parse_mode_change(line, value)?;
        let change = mode_change_mut(metadata);
        change.old_mode = Some(old_mode);
        change.new_mode = Some(new_mode);
        return Ok(());
    }
    if let Some(value) = line.strip_prefix("rename from ") {
        metadata.rename_from = Some(value.trim().to_string());
        return Ok(());
    }
    if let Some(value) = line.strip_prefix("rename to ") {
        metadata.rename_to = Some(value.trim().to_string());
        return Ok(());
    }
    if let Some(value) = line.strip_prefix("copy from ") {
        metadata.copy_from = Some(value.trim().to_string());
        return Ok(());
    }
    if let Some(value) = line.strip_prefix("copy to ") {
        metadata.copy_to = Some(value.trim().to_string());
        return Ok(());
    }
    if let Some(value) = line.strip_prefix("old mode ") {
        mode_change_mut(metadata).old_mode = Some(value.trim().to_string());
        return Ok(());
    }
    if let Some(value) = line.strip_prefix("new mode ") {
        mode_change_mut(metadata).new_mode = Some(value.trim().to_string());
        return Ok(());
    }
    if let Some(value) = line.strip_prefix("index ") {
        metadata.index = Some(parse_index_line(line, value)?);
        return Ok(());
    }
    if line.starts_with("Binary files ") || line.starts_with("binary files ") {
        metadata.is_binary = true;
        return Ok(());
    }
    Err(PatchmarkError::malformed(format!(
        "unrecognized metadata line: '{line}'"
    )))
}

fn mode_change_mut(metadata: &mut Metadata) -> &mut FileModeChange {
    metadata.mode_change.get_or_insert_with(FileModeChange::default)
}

/// `index <oldhash>..<newhash>[ <mode>]`
fn parse_index_line(line: &str, value: &str) -> Result<IndexLine, PatchmarkError> {
    let value = value.trim();
    let (hashes, mode) = match value.split_once(' ') {
        Some((hashes, mode)) => (hashes, Some(mode.trim().to_string())),
        None => (value, None),
    };
    let (old_hash, new_hash) = hashes.split_once("..").ok_or_else(|| {
        PatchmarkError::malformed(format!("invalid index metadata line: '{line}'"))
    })?;
    Ok(IndexLine {
        old_hash: old_hash.to_string(),
        new_hash: new_hash.to_string(),
        mode: mode.filter(|mode| !mode.is_empty()),
    })
}

/// `mode change <old> => <new>`, tolerating repeated separators.
fn parse_mode_change(line: &str, value: &str) -> Result<(String, String), PatchmarkError> {
    let parts: Vec<&str> = value
        .split(|c| c == ' ' || c == '=' || c == '>')
        .filter(|part| !part.is_empty())
        .collect();
    match parts.as_slice() {
        [old_mode, new_mode] => Ok((old_mode.to_string(), new_mode.to_string())),
        _ => Err(PatchmarkError::malformed(format!(
            "invalid mode change metadata line: '{line}'"
        ))),
    }
}

/// `similarity index N%`
fn parse_percentage(line: &str, value: &str) -> Result<u8, PatchmarkError> {
    let digits = value.trim().trim_end_matches('%');
    let parsed: u8 = digits.parse().map_err(|_| {
        PatchmarkError::malformed(format!("invalid similarity metadata line: '{line}'"))
    })?;
    if parsed > 100 {
        return Err(PatchmarkError::malformed(format!(
            "similarity index above 100%: '{line}'"
        )));
    }
    Ok(parsed)
}
