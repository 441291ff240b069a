use std::sync::OnceLock;

use regex::Regex;

use crate::error::PatchmarkError;
use crate::plan::LineRange;

use super::paths::interpret_path_payload;

fn hunk_header_regex() -> &'static Regex {
    static HUNK_HEADER: OnceLock<Regex> = OnceLock::new();
    HUNK_HEADER.get_or_init(|| {
        Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@(?: (.*))?$")
            .expect("hunk header regex should compile")
    })
}

/// Parses `@@ -<oldStart>[,<oldLen>] +<newStart>[,<newLen>] @@[ <section>]`.
/// A bare `@@` is accepted and yields absent ranges; missing lengths default
/// to 1.
pub(super) fn parse_hunk_header(
    line: &str,
) -> Result<(Option<LineRange>, Option<LineRange>, Option<String>), PatchmarkError> {
    if line == "@@" {
        return Ok((None, None, None));
    }

    let captures = hunk_header_regex()
        .captures(line)
        .ok_or_else(|| PatchmarkError::malformed(format!("invalid hunk header: '{line}'")))?;

    let old_range = range_from_captures(line, captures.get(1), captures.get(2))?;
    let new_range = range_from_captures(line, captures.get(3), captures.get(4))?;
    let section = captures
        .get(5)
        .map(|capture| capture.as_str().to_string())
        .filter(|section| !section.is_empty());

    Ok((Some(old_range), Some(new_range), section))
}

fn range_from_captures(
    line: &str,
    start: Option<regex::Match<'_>>,
    len: Option<regex::Match<'_>>,
) -> Result<LineRange, PatchmarkError> {
    let parse = |capture: regex::Match<'_>| {
        capture.as_str().parse::<u64>().map_err(|_| {
            PatchmarkError::malformed(format!("hunk header number out of range: '{line}'"))
        })
    };
    let start = match start {
        Some(capture) => parse(capture)?,
        None => {
            return Err(PatchmarkError::malformed(format!(
                "invalid hunk header: '{line}'"
            )));
        }
    };
    let len = match len {
        Some(capture) => parse(capture)?,
        None => 1,
    };
    Ok(LineRange { start, len })
}

/// Derives paths from an implicit file header such as `Add File: foo.txt` or
/// `Rename File: old.txt -> new.txt`. Prefix matching is case-insensitive;
/// unrecognized headers yield no paths and are left to the validator.
pub(super) fn paths_from_file_header(
    header: &str,
) -> Result<(Option<String>, Option<String>), PatchmarkError> {
    if let Some(payload) = strip_header_prefix(header, "add file") {
        return Ok((None, interpret_path_payload(&payload)));
    }
    if let Some(payload) = strip_header_prefix(header, "update file") {
        let path = interpret_path_payload(&payload);
        return Ok((path.clone(), path));
    }
    if let Some(payload) = strip_header_prefix(header, "delete file") {
        return Ok((interpret_path_payload(&payload), None));
    }
    if let Some(payload) = strip_header_prefix(header, "rename file") {
        return split_arrow_payload(header, &payload);
    }
    if let Some(payload) = strip_header_prefix(header, "copy file") {
        return split_arrow_payload(header, &payload);
    }
    Ok((None, None))
}

fn strip_header_prefix(header: &str, prefix: &str) -> Option<String> {
    let head = header.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let mut payload = header[prefix.len()..].trim_start();
    payload = payload.strip_prefix(':').unwrap_or(payload);
    Some(payload.trim().to_string())
}

fn split_arrow_payload(
    header: &str,
    payload: &str,
) -> Result<(Option<String>, Option<String>), PatchmarkError> {
    let (old, new) = payload.split_once("->").ok_or_else(|| {
        PatchmarkError::malformed(format!("file header is missing '->': '{header}'"))
    })?;
    Ok((interpret_path_payload(old), interpret_path_payload(new)))
}
