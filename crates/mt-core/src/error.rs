//! Framework error type.
//!
//! Sub-crates define their own error enums (`LinkError`, `MonitorError`, …)
//! and wrap `MtError` as one variant where configuration problems can surface.

use thiserror::Error;

/// The top-level error type for `mt-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum MtError {
    /// Configuration rejected before a run starts (out-of-range fraction,
    /// non-positive count, empty monitored-edge set, …).
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `mt-*` crates.
pub type MtResult<T> = Result<T, MtError>;
