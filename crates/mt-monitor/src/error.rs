use mt_core::MtError;
use mt_link::LinkError;
use thiserror::Error;

/// Errors that prevent a run from starting.
///
/// Once a run is under way, a lost simulator ends it as
/// [`RunOutcome::Incomplete`](crate::RunOutcome::Incomplete) instead.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Config(#[from] MtError),

    #[error("simulator link error: {0}")]
    Link(#[from] LinkError),
}

pub type MonitorResult<T> = Result<T, MonitorError>;
