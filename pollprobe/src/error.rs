use std::io;
use thiserror::Error;

/// Failure to construct a selector through a [`SelectorFactory`](crate::strategy::SelectorFactory).
#[derive(Debug, Error)]
pub(crate) enum OpenError {
    /// The construction path cannot be used right now. Recoverable: the
    /// strategy falls back to the default path for this call.
    #[error("{path} selector unavailable: {reason}")]
    Unsupported { path: &'static str, reason: String },

    /// The OS refused to open the handle.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<OpenError> for io::Error {
    fn from(err: OpenError) -> Self {
        match err {
            OpenError::Io(e) => e,
            unsupported @ OpenError::Unsupported { .. } => {
                io::Error::new(io::ErrorKind::Unsupported, unsupported.to_string())
            }
        }
    }
}

/// Errors raised while building or installing a [`SelectorConfig`](crate::SelectorConfig).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown selector provider `{0}` (expected `epoll` or `poll`)")]
    UnknownProvider(String),

    #[error("invalid value `{value}` for {key} (expected a boolean)")]
    InvalidFlag { key: &'static str, value: String },

    /// The selector strategy was already resolved for this process.
    #[error("selector strategy already resolved")]
    AlreadyResolved,
}
