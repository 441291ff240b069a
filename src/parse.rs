use crate::error::PatchmarkError;
use crate::plan::{Directive, Hunk, Line, PatchOperation, Plan};
use crate::token::{tokenize, Token};

mod header;
mod metadata;
mod paths;


pub(crate) use paths::interpret_path_payload;

const NO_NEWLINE_MARKER_LINE: &str = "\\ No newline at end of file";
const GIT_BINARY_MARKER_LINE: &str = "GIT binary patch";

/// Tokenizes patch text and groups the tokens into a `Plan`.
pub fn parse_plan(text: &str) -> Result<Plan, PatchmarkError> {
    let tokens = tokenize(text)?;
    PlanParser::new(&tokens).parse()
}

struct PlanParser<'a> {
    tokens: &'a [Token],
    position: usize,
    title: Option<String>,
    pending_header: Option<String>,
    pending_metadata: Vec<String>,
    directives: Vec<Directive>,
}

impl<'a> PlanParser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            position: 0,
            title: None,
            pending_header: None,
            pending_metadata: Vec::new(),
            directives: Vec::new(),
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn parse(mut self) -> Result<Plan, PatchmarkError> {
        while let Some(token) = self.peek() {
            match token {
                Token::BeginMarker | Token::EndMarker => self.advance(),
                Token::Header(text) => {
                    let text = text.clone();
                    self.advance();
                    if self.title.is_none() {
                        self.title = Some(text.clone());
                    }
                    self.pending_header = Some(text);
                }
                Token::Metadata(line) => {
                    self.pending_metadata.push(line.clone());
                    self.advance();
                }
                Token::FileOld(payload) => {
                    let payload = payload.clone();
                    let directive = self.parse_explicit_directive(payload)?;
                    self.directives.push(directive);
                }
                Token::HunkHeader(_) => {
                    let Some(header) = self.pending_header.take() else {
                        return Err(PatchmarkError::malformed(
                            "hunk header without a file directive",
                        ));
                    };
                    let directive = self.parse_implicit_directive(header)?;
                    self.directives.push(directive);
                }
                Token::FileNew(_) => {
                    return Err(PatchmarkError::malformed(
                        "'+++' line without a preceding '---' line",
                    ));
                }
                Token::HunkLine(_) => {
                    return Err(PatchmarkError::malformed("patch line outside of a hunk"));
                }
                Token::Other(line) => return Err(unexpected_line_error(line)),
            }
        }

        if self.directives.is_empty() {
            return Err(PatchmarkError::malformed("patch contains no directives"));
        }

        Ok(Plan {
            title: self.title,
            directives: self.directives,
        })
    }

    fn parse_explicit_directive(&mut self, old_payload: String) -> Result<Directive, PatchmarkError> {
        self.advance();
        let new_payload = match self.peek() {
            Some(Token::FileNew(payload)) => {
                let payload = payload.clone();
                self.advance();
                payload
            }
            _ => {
                return Err(PatchmarkError::malformed(
                    "'---' line must be followed by a '+++' line",
                ));
            }
        };

        let old_path = paths::interpret_path_payload(&old_payload);
        let new_path = paths::interpret_path_payload(&new_payload);
        let raw_header = self.pending_header.take();
        let mut metadata_lines = std::mem::take(&mut self.pending_metadata);
        let hunks = self.collect_directive_body(&mut metadata_lines)?;

        let metadata = metadata::parse_metadata_lines(metadata_lines)?;
        let operation = infer_operation(raw_header.as_deref(), &old_path, &new_path);

        Ok(Directive {
            operation,
            old_path,
            new_path,
            hunks,
            metadata,
            raw_header,
        })
    }

    fn parse_implicit_directive(&mut self, header_text: String) -> Result<Directive, PatchmarkError> {
        let (old_path, new_path) = header::paths_from_file_header(&header_text)?;
        let mut metadata_lines = std::mem::take(&mut self.pending_metadata);
        let hunks = self.collect_directive_body(&mut metadata_lines)?;

        let metadata = metadata::parse_metadata_lines(metadata_lines)?;
        let operation = infer_operation(Some(&header_text), &old_path, &new_path);

        Ok(Directive {
            operation,
            old_path,
            new_path,
            hunks,
            metadata,
            raw_header: Some(header_text),
        })
    }

    /// Collects metadata lines and hunks until the next directive boundary:
    /// another `---`, another `*** ` header, or the end of the stream.
    fn collect_directive_body(
        &mut self,
        metadata_lines: &mut Vec<String>,
    ) -> Result<Vec<Hunk>, PatchmarkError> {
        let mut hunks = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Metadata(line)) => {
                    metadata_lines.push(line.clone());
                    self.advance();
                }
                Some(Token::HunkHeader(line)) => {
                    let line = line.clone();
                    hunks.push(self.parse_hunk(line)?);
                }
                Some(Token::HunkLine(_)) => {
                    return Err(PatchmarkError::malformed("patch line outside of a hunk"));
                }
                Some(Token::FileNew(_)) => {
                    return Err(PatchmarkError::malformed(
                        "'+++' line without a preceding '---' line",
                    ));
                }
                Some(Token::Other(line)) => return Err(unexpected_line_error(line)),
                Some(Token::FileOld(_))
                | Some(Token::Header(_))
                | Some(Token::BeginMarker)
                | Some(Token::EndMarker)
                | None => break,
            }
        }
        Ok(hunks)
    }

    fn parse_hunk(&mut self, header_line: String) -> Result<Hunk, PatchmarkError> {
        self.advance();
        let (old_range, new_range, section) = header::parse_hunk_header(&header_line)?;

        let mut lines = Vec::new();
        while let Some(Token::HunkLine(raw)) = self.peek() {
            let raw = raw.clone();
            self.advance();
            lines.push(parse_hunk_line(&raw)?);
        }

        Ok(Hunk {
            old_range,
            new_range,
            section,
            lines,
        })
    }
}

fn parse_hunk_line(raw: &str) -> Result<Line, PatchmarkError> {
    if raw == NO_NEWLINE_MARKER_LINE {
        return Ok(Line::NoNewlineMarker);
    }
    let Some(first) = raw.chars().next() else {
        return Err(PatchmarkError::malformed("empty hunk line"));
    };
    let rest = raw[first.len_utf8()..].to_string();
    match first {
        ' ' => Ok(Line::Context(rest)),
        '+' => Ok(Line::Addition(rest)),
        '-' => Ok(Line::Deletion(rest)),
        _ => Err(PatchmarkError::malformed(format!(
            "unexpected hunk line prefix in '{raw}'"
        ))),
    }
}

fn unexpected_line_error(line: &str) -> PatchmarkError {
    if line.trim() == GIT_BINARY_MARKER_LINE {
        return PatchmarkError::validation("binary patches are not supported");
    }
    PatchmarkError::malformed(format!("unexpected line in patch: '{line}'"))
}

/// Determines the operation for a directive. A header mentioning "copy" wins;
/// otherwise the presence and equality of the two paths decide.
fn infer_operation(
    header: Option<&str>,
    old_path: &Option<String>,
    new_path: &Option<String>,
) -> PatchOperation {
    if let Some(header) = header {
        if header.to_lowercase().contains("copy") {
            return PatchOperation::Copy;
        }
    }
    match (old_path, new_path) {
        (None, Some(_)) => PatchOperation::Add,
        (Some(_), None) => PatchOperation::Delete,
        (Some(old), Some(new)) if old == new => PatchOperation::Modify,
        (Some(_), Some(_)) => PatchOperation::Rename,
        (None, None) => PatchOperation::Modify,
    }
}
