use std::path::Path;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PatchmarkError {
    #[error("Malformed patch: {message}")]
    Malformed { message: String },

    #[error("Patch validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Failed to access '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File '{path}' is not valid UTF-8")]
    NonUtf8 { path: String },

    #[error("Path '{path}' resolves outside the sandbox root '{root}'")]
    SandboxViolation { path: String, root: String },

    #[error("Failed to read stdin: {source}")]
    StdinRead {
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize response JSON: {source}")]
    ResponseSerialization {
        #[source]
        source: serde_json::Error,
    },
}

impl PatchmarkError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn non_utf8(path: &Path) -> Self {
        Self::NonUtf8 {
            path: path.display().to_string(),
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        match self {
            Self::Malformed { .. } => ErrorResponse {
                error: ErrorBody {
                    r#type: "malformed_patch".to_string(),
                    message: self.to_string(),
                    suggestion: Some(
                        "Ensure the patch is wrapped in '*** Begin Patch' / '*** End Patch' markers"
                            .to_string(),
                    ),
                },
            },
            Self::ValidationFailed { .. } => ErrorResponse {
                error: ErrorBody {
                    r#type: "validation_failed".to_string(),
                    message: self.to_string(),
                    suggestion: None,
                },
            },
            Self::SandboxViolation { .. } => ErrorResponse {
                error: ErrorBody {
                    r#type: "io_error".to_string(),
                    message: self.to_string(),
                    suggestion: Some("Use paths relative to the sandbox root".to_string()),
                },
            },
            Self::Io { .. } | Self::NonUtf8 { .. } | Self::StdinRead { .. } => ErrorResponse {
                error: ErrorBody {
                    r#type: "io_error".to_string(),
                    message: self.to_string(),
                    suggestion: None,
                },
            },
            Self::ResponseSerialization { .. } => ErrorResponse {
                error: ErrorBody {
                    r#type: "serialization_error".to_string(),
                    message: self.to_string(),
                    suggestion: None,
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub r#type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}
