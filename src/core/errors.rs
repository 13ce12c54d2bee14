//! QT-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::PathBuf;

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, QtopError>;

/// Top-level error type for qtop.
///
/// Recoverable conditions (fetch failures, rejected actions) never reach
/// this type — they are converted to display state at the boundary where
/// they occur. Anything surfacing here terminates the program with a
/// non-zero exit after terminal restoration.
#[derive(Debug, Error)]
pub enum QtopError {
    #[error("[QT-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[QT-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[QT-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[QT-2001] terminal failure during {stage}: {source}")]
    Terminal {
        stage: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("[QT-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl QtopError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "QT-1001",
            Self::MissingConfig { .. } => "QT-1002",
            Self::ConfigParse { .. } => "QT-1003",
            Self::Terminal { .. } => "QT-2001",
            Self::Runtime { .. } => "QT-3900",
        }
    }

    /// Convenience constructor for terminal I/O failures.
    #[must_use]
    pub const fn terminal(stage: &'static str, source: std::io::Error) -> Self {
        Self::Terminal { stage, source }
    }
}
