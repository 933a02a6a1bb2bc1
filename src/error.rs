use thiserror::Error;

/// Errors surfaced by the routing core.
///
/// `Unreachable` from the taxonomy is intentionally not a variant here: an
/// unreachable stop or target is expressed as [`crate::UNREACHED`] inside a
/// normal `Ok` result, never as an `Err`.
#[derive(Error, Debug)]
pub enum RaptorError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("frequency phasing has a cycle: {0}")]
    PhasingCycle(String),

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl RaptorError {
    /// Builds an [`RaptorError::InternalInvariant`] and logs it before returning,
    /// so the diagnostic is not lost if a caller only propagates the error.
    pub(crate) fn internal(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        log::error!("internal invariant violated: {msg}");
        RaptorError::InternalInvariant(msg)
    }
}
