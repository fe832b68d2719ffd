//! The connection capability consumed by the provider.
//!
//! The provider never talks to a database itself. It is handed either a
//! factory (connection string in, connection out) or a producer (connection
//! out, no arguments) and manages the lifecycle of whatever handle those
//! return. The handle is opaque: anything implementing [`Connection`] works,
//! from a real driver connection to a test double.

use std::sync::Arc;

/// Boxed driver-side error.
///
/// Factories, producers, and [`Connection`] implementations report failures
/// with whatever error type the driver defines; the provider only needs to
/// carry it as a source for diagnostics.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for driver-side operations.
pub type DriverResult<T> = std::result::Result<T, BoxError>;

/// An open database connection, independent of driver.
///
/// Implementations are supplied by the database-driver side. The provider
/// may be shared across threads, so implementations are responsible for
/// their own internal synchronization.
pub trait Connection: Send + Sync {
    /// Open the connection.
    ///
    /// Called once by the provider, immediately after the factory or
    /// producer returns the handle.
    fn open(&self) -> DriverResult<()>;

    /// Close the connection.
    fn close(&self) -> DriverResult<()>;

    /// Start a transaction on this connection.
    fn begin_transaction(&self) -> DriverResult<()>;

    /// Commit the current transaction.
    fn commit(&self) -> DriverResult<()>;

    /// Roll back the current transaction.
    fn rollback(&self) -> DriverResult<()>;
}

/// A settled connection handle as returned by the provider.
///
/// The provider retains the handle for reuse; callers hold clones.
pub type SharedConnection = Arc<dyn Connection>;

/// A function mapping a connection string to a connection handle.
pub type ConnectionFactory =
    Box<dyn Fn(&str) -> DriverResult<Box<dyn Connection>> + Send + Sync>;

/// A zero-argument function that directly yields a connection handle.
pub type ConnectionProducer =
    Box<dyn Fn() -> DriverResult<Box<dyn Connection>> + Send + Sync>;
