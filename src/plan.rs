use serde::Serialize;

/// A parsed patch: an optional title (the first `*** ` header encountered)
/// and the file-level directives in application order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub title: Option<String>,
    pub directives: Vec<Directive>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchOperation {
    Add,
    Delete,
    Modify,
    Rename,
    Copy,
}

impl PatchOperation {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Delete => "delete",
            Self::Modify => "modify",
            Self::Rename => "rename",
            Self::Copy => "copy",
        }
    }
}

/// One file-level change. Which paths and metadata are legal is determined
/// by the operation and enforced by the validator, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directive {
    pub operation: PatchOperation,
    pub old_path: Option<String>,
    pub new_path: Option<String>,
    pub hunks: Vec<Hunk>,
    pub metadata: Metadata,
    pub raw_header: Option<String>,
}

/// A 1-based start line and a length in lines, from a `@@` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineRange {
    pub start: u64,
    pub len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hunk {
    pub old_range: Option<LineRange>,
    pub new_range: Option<LineRange>,
    /// Trailing section heading from the hunk header, carried for diagnostics.
    pub section: Option<String>,
    pub lines: Vec<Line>,
}

impl Hunk {
    /// Context + Deletion lines: what the old file must contain.
    pub fn old_side_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|line| matches!(line, Line::Context(_) | Line::Deletion(_)))
            .count()
    }

    /// Context + Addition lines: what the new file will contain.
    pub fn new_side_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|line| matches!(line, Line::Context(_) | Line::Addition(_)))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Line {
    Context(String),
    Addition(String),
    Deletion(String),
    NoNewlineMarker,
}

impl Line {
    /// Text payload for the three content variants; `None` for the marker.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Context(text) | Self::Addition(text) | Self::Deletion(text) => Some(text),
            Self::NoNewlineMarker => None,
        }
    }
}

/// Parsed per-directive metadata. `raw_lines` preserves the original lines
/// in order so they can be round-tripped losslessly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub index: Option<IndexLine>,
    pub mode_change: Option<FileModeChange>,
    pub similarity_index: Option<u8>,
    pub dissimilarity_index: Option<u8>,
    pub rename_from: Option<String>,
    pub rename_to: Option<String>,
    pub copy_from: Option<String>,
    pub copy_to: Option<String>,
    pub is_binary: bool,
    pub raw_lines: Vec<String>,
}

impl Metadata {
    /// The mode the target file should end up with, if any metadata line
    /// supplied one. An explicit mode-change line wins over the index mode.
    pub fn effective_new_mode(&self) -> Option<&str> {
        self.mode_change
            .as_ref()
            .and_then(|change| change.new_mode.as_deref())
            .or_else(|| self.index.as_ref().and_then(|index| index.mode.as_deref()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexLine {
    pub old_hash: String,
    pub new_hash: String,
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileModeChange {
    pub old_mode: Option<String>,
    pub new_mode: Option<String>,
}

/// Parses an octal file mode string. Surrounding whitespace is stripped and
/// embedded spaces removed; non-octal input yields `None` so callers skip
/// mode application instead of failing. Only the low 12 bits survive.
pub fn parse_file_mode(value: &str) -> Option<u32> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }
    u32::from_str_radix(&compact, 8).ok().map(|mode| mode & 0o7777)
}
