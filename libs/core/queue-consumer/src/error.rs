//! Consumer error types.
//!
//! Only two failures halt a unit of work: an invalid configuration halts
//! construction, and an exhausted receive-retry budget halts the affected
//! worker. Everything else is absorbed into log and metric signals.

use thiserror::Error;

/// Boxed transport or processing error, as reported by provider and
/// processor implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Consumer engine errors.
#[derive(Error, Debug)]
pub enum ConsumerError {
    /// Invalid configuration field. Fatal at construction time.
    #[error("invalid configuration: {field} {reason}")]
    Config {
        /// Name of the offending field.
        field: &'static str,
        reason: String,
    },

    /// Transport failure from the provider's receive call.
    #[error("receive failed: {0}")]
    Receive(#[source] BoxError),

    /// Transport failure from the provider's delete call.
    #[error("delete failed: {0}")]
    Delete(#[source] BoxError),

    /// A worker exhausted its receive retries. Fatal for that worker only;
    /// other workers keep polling.
    #[error("receive retries exhausted after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Total receive attempts issued (initial call plus retries).
        attempts: u32,
        #[source]
        source: BoxError,
    },
}

impl ConsumerError {
    /// Create a configuration error naming the offending field.
    pub fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Config {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the offending field, for configuration errors.
    pub fn config_field(&self) -> Option<&'static str> {
        match self {
            Self::Config { field, .. } => Some(field),
            _ => None,
        }
    }
}
