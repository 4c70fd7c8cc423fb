//! Error types for knit-build.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for knit-build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors that can occur while assembling or writing a build description.
#[derive(Error, Diagnostic, Debug)]
pub enum BuildError {
    /// Failed to read or write a file.
    #[error("I/O error on {}: {source}", .path.display())]
    #[diagnostic(code(knit::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML manifest.
    #[error("Failed to parse manifest: {0}")]
    #[diagnostic(code(knit::manifest))]
    ParseManifest(#[from] toml::de::Error),

    /// Failed to render the compilation database.
    #[error("Failed to encode compilation database: {0}")]
    #[diagnostic(code(knit::json))]
    Json(#[from] serde_json::Error),

    /// A source file name has no object counterpart.
    #[error("Malformed source name '{source_name}' in target '{target}'")]
    #[diagnostic(
        code(knit::malformed_source),
        help("source files must be named `<stem>.c` with no other dots")
    )]
    MalformedSource { target: String, source_name: String },

    /// A target with an empty name or no sources.
    #[error("Invalid target '{name}': {reason}")]
    #[diagnostic(code(knit::invalid_target))]
    InvalidTarget { name: String, reason: &'static str },

    /// A variable binding that cannot be written as a Ninja line.
    #[error("Invalid variable '{name}': {reason}")]
    #[diagnostic(code(knit::invalid_var))]
    InvalidVar { name: String, reason: &'static str },

    /// Two targets share one output path.
    #[error("Target '{0}' is already registered")]
    #[diagnostic(
        code(knit::duplicate_target),
        help("each program and test needs a unique name")
    )]
    DuplicateTarget(String),
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}
