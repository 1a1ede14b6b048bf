//! Typed outcome of a gateway call

use thiserror::Error;

use crate::error::Error;

/// A backend call that did not produce a value.
///
/// Carries the last observed cause. `attempts` is zero when the call was
/// rejected before reaching the backend.
#[derive(Debug, Error)]
#[error("{operation} failed after {attempts} attempt(s): {cause}")]
pub struct GatewayError {
    pub operation: &'static str,
    pub attempts: u32,
    #[source]
    pub cause: Error,
}

impl GatewayError {
    /// A call refused up front, e.g. for lack of a signed-in user
    pub fn rejected(operation: &'static str, cause: Error) -> Self {
        Self {
            operation,
            attempts: 0,
            cause,
        }
    }

    pub fn cause(&self) -> &Error {
        &self.cause
    }

    pub fn into_cause(self) -> Error {
        self.cause
    }

    /// Whether the final attempt ran past its deadline
    pub fn is_timeout(&self) -> bool {
        self.cause.is_timeout()
    }
}

/// Success with a value, or a failure with its cause
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
