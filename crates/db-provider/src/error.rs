//! Provider error types.

use thiserror::Error;

use crate::connection::BoxError;

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the provider.
///
/// Every failure is reported to the caller unchanged: nothing is retried or
/// swallowed inside the provider. Construction failures carry the driver's
/// error as a source so callers can inspect the underlying cause.
#[derive(Debug, Error)]
pub enum Error {
    /// No usable construction path is configured: the provider has neither a
    /// producer nor a connection string with a factory.
    #[error("neither provider nor factory configured")]
    NeitherProviderNorFactory,

    /// A connection string is configured but no factory to consume it.
    #[error("no factory provided")]
    NoFactory,

    /// The factory or producer was invoked but failed to yield an open
    /// connection.
    #[error("failed to create connection")]
    ConnectionCreation(#[source] BoxError),

    /// The construction mutex could not be acquired within the configured
    /// timeout. Not retried here; retry policy belongs to the caller.
    #[error("failed to get mutex")]
    MutexAcquisition,

    /// `begin_transaction` was called while a transaction is already active.
    #[error("transaction already started")]
    TransactionAlreadyStarted,

    /// `commit_transaction` or `rollback_transaction` was called with no
    /// active transaction.
    #[error("no running transaction was found")]
    NoRunningTransaction,

    /// The underlying connection reported an error while executing a
    /// transaction operation. The provider's state is left unchanged.
    #[error("driver error during {operation}")]
    Driver {
        /// The operation that was delegated to the driver.
        operation: &'static str,
        /// The driver's error.
        #[source]
        source: BoxError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::NeitherProviderNorFactory.to_string(),
            "neither provider nor factory configured"
        );
        assert_eq!(Error::NoFactory.to_string(), "no factory provided");
        assert_eq!(
            Error::MutexAcquisition.to_string(),
            "failed to get mutex"
        );
        assert_eq!(
            Error::TransactionAlreadyStarted.to_string(),
            "transaction already started"
        );
        assert_eq!(
            Error::NoRunningTransaction.to_string(),
            "no running transaction was found"
        );
    }

    #[test]
    fn test_creation_error_preserves_cause() {
        let cause: BoxError = "connection refused".into();
        let err = Error::ConnectionCreation(cause);
        assert_eq!(err.to_string(), "failed to create connection");
        let source = std::error::Error::source(&err);
        assert_eq!(
            source.map(|s| s.to_string()).as_deref(),
            Some("connection refused")
        );
    }
}
