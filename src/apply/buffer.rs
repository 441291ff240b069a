use std::path::Path;

use crate::error::PatchmarkError;

/// A file's text as lines plus the trailing-newline bit. The pair round-trips
/// losslessly: encoding joins with `\n` and appends a final `\n` iff
/// `has_trailing_newline`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBuffer {
    pub lines: Vec<String>,
    pub has_trailing_newline: bool,
}

impl FileBuffer {
    pub fn empty() -> Self {
        Self {
            lines: Vec::new(),
            has_trailing_newline: true,
        }
    }

    /// Decodes file bytes; the contents must be valid UTF-8.
    pub fn decode(path: &Path, bytes: Vec<u8>) -> Result<Self, PatchmarkError> {
        let text = String::from_utf8(bytes).map_err(|_| PatchmarkError::non_utf8(path))?;
        Ok(Self::from_text(&text))
    }

    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            return Self::empty();
        }
        let has_trailing_newline = text.ends_with('\n');
        let body = text.strip_suffix('\n').unwrap_or(text);
        Self {
            lines: body.split('\n').map(str::to_string).collect(),
            has_trailing_newline,
        }
    }

    pub fn encode(&self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        let mut text = self.lines.join("\n");
        if self.has_trailing_newline {
            text.push('\n');
        }
        text
    }
}
