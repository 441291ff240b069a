/// Interprets a `---`/`+++` path payload: trims surrounding whitespace,
/// treats `/dev/null` (and an empty payload) as an absent path, and strips
/// the Git-style `a/` or `b/` prefix.
pub(crate) fn interpret_path_payload(payload: &str) -> Option<String> {
    let trimmed = payload.trim();
    if trimmed.is_empty() || trimmed == "/dev/null" {
        return None;
    }
    let stripped = trimmed
        .strip_prefix("a/")
        .or_else(|| trimmed.strip_prefix("b/"))
        .unwrap_or(trimmed);
    Some(stripped.to_string())
}
