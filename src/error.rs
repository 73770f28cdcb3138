use thiserror::Error;

/// Failures surfaced by the shim. Nothing is retried or recovered locally.
#[derive(Debug, Error)]
pub enum ShimError {
    /// The script asked for something the shim deliberately does not do,
    /// such as an asynchronous `XMLHttpRequest`. Raised before any host call.
    #[error("{operation} is not supported")]
    UnsupportedOperation { operation: &'static str },
    /// The host rejected the call, was unreachable, or answered with a value
    /// that does not fit the operation's contract.
    #[error("host call `{operation}` failed: {source}")]
    HostCall {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ShimError {
    pub fn unsupported(operation: &'static str) -> Self {
        Self::UnsupportedOperation { operation }
    }

    pub fn host_call(operation: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::HostCall {
            operation,
            source: source.into(),
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedOperation { .. })
    }
}

pub type Result<T, E = ShimError> = std::result::Result<T, E>;
