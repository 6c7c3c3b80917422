use std::path::PathBuf;

use thiserror::Error;

/// One candidate path that could not be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedAttempt {
    pub path: PathBuf,
    pub reason: String,
}

/// Why a module could not be made ready. Failures are plain data; the host
/// decides whether any of them is fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("module not found: {name} ({} locations tried)", attempts.len())]
    PathExhausted {
        name: String,
        attempts: Vec<FailedAttempt>,
    },

    #[error("module {module} is missing symbol {symbol}: {reason}")]
    SymbolMissing {
        module: String,
        symbol: &'static str,
        reason: String,
    },

    /// Not produced yet: `dllEntry` has no way to report failure.
    #[error("handshake with module {module} failed: {reason}")]
    HandshakeFailed { module: String, reason: String },

    #[error("unsupported target architecture: {0}")]
    UnsupportedArchitecture(String),
}
