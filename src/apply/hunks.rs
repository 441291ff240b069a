use crate::error::PatchmarkError;
use crate::plan::{Hunk, Line, LineRange};

use super::buffer::FileBuffer;
use super::{ApplyConfig, WhitespaceMode};

/// Applies hunks in order; each hunk sees the buffer produced by the
/// previous one.
pub(super) fn apply_hunks(
    hunks: &[Hunk],
    buffer: &mut FileBuffer,
    config: &ApplyConfig,
) -> Result<(), PatchmarkError> {
    for hunk in hunks {
        HunkTransform::from_hunk(hunk).apply(buffer, config)?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TaggedLine {
    text: String,
    is_context: bool,
}

/// The derived shape of one hunk: the lines the old file must contain, the
/// lines that replace them, and the trailing-newline facts carried by any
/// no-newline markers.
#[derive(Debug)]
pub(super) struct HunkTransform {
    expected: Vec<TaggedLine>,
    replacement: Vec<TaggedLine>,
    expected_trailing_newline: Option<bool>,
    replacement_trailing_newline: Option<bool>,
    old_range: Option<LineRange>,
    new_range: Option<LineRange>,
}

/// One context-trim variant: how many leading/trailing pure-context entries
/// to drop from both sequences before matching.
#[derive(Debug, Clone, Copy)]
struct TrimVariant {
    lead: usize,
    trail: usize,
}

impl HunkTransform {
    pub(super) fn from_hunk(hunk: &Hunk) -> Self {
        let mut expected = Vec::new();
        let mut replacement = Vec::new();
        let mut expected_trailing_newline = None;
        let mut replacement_trailing_newline = None;
        let mut last_significant: Option<&Line> = None;

        for line in &hunk.lines {
            match line {
                Line::Context(text) => {
                    expected.push(TaggedLine {
                        text: text.clone(),
                        is_context: true,
                    });
                    replacement.push(TaggedLine {
                        text: text.clone(),
                        is_context: true,
                    });
                    last_significant = Some(line);
                }
                Line::Deletion(text) => {
                    expected.push(TaggedLine {
                        text: text.clone(),
                        is_context: false,
                    });
                    last_significant = Some(line);
                }
                Line::Addition(text) => {
                    replacement.push(TaggedLine {
                        text: text.clone(),
                        is_context: false,
                    });
                    last_significant = Some(line);
                }
                Line::NoNewlineMarker => {
                    if matches!(last_significant, Some(Line::Deletion(_))) {
                        expected_trailing_newline = Some(false);
                    } else {
                        replacement_trailing_newline = Some(false);
                    }
                }
            }
        }

        Self {
            expected,
            replacement,
            expected_trailing_newline,
            replacement_trailing_newline,
            old_range: hunk.old_range,
            new_range: hunk.new_range,
        }
    }

    pub(super) fn apply(
        &self,
        buffer: &mut FileBuffer,
        config: &ApplyConfig,
    ) -> Result<(), PatchmarkError> {
        for variant in self.trim_variants(config.context_tolerance) {
            let expected = self.expected_slice(variant);
            match self.locate(buffer, expected, config.whitespace)? {
                Some(index) => {
                    self.splice(buffer, index, variant);
                    return Ok(());
                }
                None => continue,
            }
        }
        Err(PatchmarkError::validation(
            "context mismatch: hunk does not apply to the current file contents",
        ))
    }

    fn expected_slice(&self, variant: TrimVariant) -> &[TaggedLine] {
        &self.expected[variant.lead..self.expected.len() - variant.trail]
    }

    fn replacement_slice(&self, variant: TrimVariant) -> &[TaggedLine] {
        &self.replacement[variant.lead..self.replacement.len() - variant.trail]
    }

    /// Variants in ascending total-trim order, ties broken by smaller
    /// leading trim. Only pure-context entries are ever shed.
    fn trim_variants(&self, tolerance: usize) -> Vec<TrimVariant> {
        let leading = self
            .expected
            .iter()
            .take_while(|entry| entry.is_context)
            .count();
        let trailing = self
            .expected
            .iter()
            .rev()
            .take_while(|entry| entry.is_context)
            .count()
            .min(self.expected.len() - leading);

        let mut variants = Vec::new();
        for total in 0..=tolerance {
            for lead in 0..=total {
                let trail = total - lead;
                if lead <= leading && trail <= trailing {
                    variants.push(TrimVariant { lead, trail });
                }
            }
        }
        variants
    }

    /// Finds where `expected` sits in the buffer. The hunk header's old range
    /// is tried first and pre-empts the scan, which is what disambiguates
    /// repeated runs. A scan that matches more than once is ambiguous.
    fn locate(
        &self,
        buffer: &FileBuffer,
        expected: &[TaggedLine],
        whitespace: WhitespaceMode,
    ) -> Result<Option<usize>, PatchmarkError> {
        let buffer_len = buffer.lines.len();

        if expected.is_empty() {
            let index = match self.new_range {
                Some(range) => (range.start.saturating_sub(1) as usize).min(buffer_len),
                None => buffer_len,
            };
            return Ok(Some(index));
        }
        if expected.len() > buffer_len {
            return Ok(None);
        }

        let max_start = buffer_len - expected.len();
        if let Some(range) = self.old_range {
            let candidate = (range.start.saturating_sub(1) as usize).min(max_start);
            if matches_at(buffer, expected, candidate, whitespace) {
                return Ok(Some(candidate));
            }
        }

        let mut found = None;
        for start in 0..=max_start {
            if matches_at(buffer, expected, start, whitespace) {
                if found.is_some() {
                    return Err(PatchmarkError::validation(
                        "ambiguous hunk match: the expected lines occur at more than one position",
                    ));
                }
                found = Some(start);
            }
        }
        Ok(found)
    }

    fn splice(&self, buffer: &mut FileBuffer, index: usize, variant: TrimVariant) {
        let expected = self.expected_slice(variant);
        let replacement = self.replacement_slice(variant);

        let match_touched_end = index + expected.len() == buffer.lines.len();
        buffer.lines.splice(
            index..index + expected.len(),
            replacement.iter().map(|entry| entry.text.clone()),
        );
        let replacement_touches_end = index + replacement.len() == buffer.lines.len();

        match (replacement_touches_end, self.replacement_trailing_newline) {
            (true, Some(value)) => buffer.has_trailing_newline = value,
            _ => {
                if match_touched_end && self.expected_trailing_newline.is_some() {
                    buffer.has_trailing_newline = true;
                }
            }
        }
    }
}

fn matches_at(
    buffer: &FileBuffer,
    expected: &[TaggedLine],
    start: usize,
    whitespace: WhitespaceMode,
) -> bool {
    buffer.lines[start..start + expected.len()]
        .iter()
        .zip(expected)
        .all(|(buffer_line, entry)| lines_equal(buffer_line, &entry.text, whitespace))
}

fn lines_equal(left: &str, right: &str, whitespace: WhitespaceMode) -> bool {
    match whitespace {
        WhitespaceMode::Exact => left == right,
        WhitespaceMode::IgnoreAll => {
            let strip = |text: &str| -> String {
                text.chars().filter(|c| !c.is_whitespace()).collect()
            };
            strip(left) == strip(right)
        }
    }
}
