//! The connection provider.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::config::ProviderConfig;
use crate::connection::{
    Connection, ConnectionFactory, ConnectionProducer, DriverResult, SharedConnection,
};
use crate::error::{Error, Result};
use crate::state::TransactionState;

/// Manages a single logical database connection and an optional transaction
/// scoped to it.
///
/// The provider decouples callers from connection construction: it is handed
/// a factory keyed by a connection string, a producer, or both, and
/// guarantees that concurrent callers never race to build two connections.
/// Construction happens at most once per settled handle; steady-state calls
/// return the existing handle without paying lock overhead.
///
/// A provider is shared across threads behind an [`Arc`]:
///
/// ```rust,ignore
/// let provider = Arc::new(DbProvider::with_factory(
///     "Server=localhost;Database=test;",
///     |conn_str| driver::connect(conn_str),
/// ));
///
/// let conn = provider.get_connection()?;
/// provider.begin_transaction()?;
/// // ...
/// provider.commit_transaction()?;
/// ```
pub struct DbProvider {
    config: ProviderConfig,

    /// Exclusive gate around the moment of construction. Never held during
    /// steady-state reads of the settled handle.
    construction_gate: Mutex<()>,

    /// The settled connection handle, if one has been constructed and not
    /// yet disposed.
    conn: RwLock<Option<SharedConnection>>,

    /// Transaction transitions are serialized by this lock; concurrent
    /// begin/commit calls on one provider are a caller error but must not
    /// corrupt state.
    tx_state: Mutex<TransactionState>,
}

/// The construction strategy selected from the provider's configuration.
enum ConstructionPath<'a> {
    Factory {
        connection_string: &'a str,
        factory: &'a ConnectionFactory,
        fallback: Option<&'a ConnectionProducer>,
    },
    Producer(&'a ConnectionProducer),
}

impl DbProvider {
    /// Create a provider from an explicit configuration.
    ///
    /// The configuration is not validated here; an unusable configuration
    /// surfaces as a configuration error on first use.
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            construction_gate: Mutex::new(()),
            conn: RwLock::new(None),
            tx_state: Mutex::new(TransactionState::NoTransaction),
        }
    }

    /// Create a provider builder.
    #[must_use]
    pub fn builder() -> ProviderBuilder {
        ProviderBuilder::new()
    }

    /// Create a provider that constructs its connection by passing
    /// `connection_string` to `factory`.
    pub fn with_factory<F>(connection_string: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&str) -> DriverResult<Box<dyn Connection>> + Send + Sync + 'static,
    {
        Self::builder()
            .connection_string(connection_string)
            .factory(factory)
            .build()
    }

    /// Create a provider that constructs its connection by invoking
    /// `producer`, bypassing the factory/string path.
    pub fn with_producer<P>(producer: P) -> Self
    where
        P: Fn() -> DriverResult<Box<dyn Connection>> + Send + Sync + 'static,
    {
        Self::builder().producer(producer).build()
    }

    /// Create a provider that prefers the factory/string path and falls back
    /// to `producer` when the factory invocation fails.
    pub fn with_factory_and_fallback<F, P>(
        connection_string: impl Into<String>,
        factory: F,
        producer: P,
    ) -> Self
    where
        F: Fn(&str) -> DriverResult<Box<dyn Connection>> + Send + Sync + 'static,
        P: Fn() -> DriverResult<Box<dyn Connection>> + Send + Sync + 'static,
    {
        Self::builder()
            .connection_string(connection_string)
            .factory(factory)
            .producer(producer)
            .build()
    }

    /// Get the managed connection, constructing it if necessary.
    ///
    /// The first successful call constructs exactly one handle; subsequent
    /// calls return the same handle without reinvoking the factory or
    /// producer. Among concurrent calls on a fresh provider, exactly one
    /// construction occurs and all callers observe the same handle. A failed
    /// construction is not cached: the mutex is released and a later call
    /// retries.
    pub fn get_connection(&self) -> Result<SharedConnection> {
        // Fast path: the handle is already settled.
        if let Some(conn) = self.conn.read().clone() {
            tracing::trace!("reusing settled connection");
            return Ok(conn);
        }

        // Classify the configuration before touching the gate: configuration
        // errors must fail without acquiring the construction mutex.
        let path = self.construction_path()?;

        let _gate = self
            .construction_gate
            .try_lock_for(self.config.mutex_timeout)
            .ok_or(Error::MutexAcquisition)?;

        // Another caller may have constructed the handle while this one
        // waited on the gate.
        if let Some(conn) = self.conn.read().clone() {
            tracing::trace!("connection settled while waiting on construction gate");
            return Ok(conn);
        }

        let conn = Self::construct(path)?;
        *self.conn.write() = Some(Arc::clone(&conn));
        tracing::debug!("connection settled");
        Ok(conn)
    }

    /// Whether a connection handle is currently settled.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.conn.read().is_some()
    }

    /// Current transaction state.
    #[must_use]
    pub fn transaction_state(&self) -> TransactionState {
        *self.tx_state.lock()
    }

    /// Start a transaction on the managed connection.
    ///
    /// Constructs the connection first if none is settled yet. The state
    /// transitions to `Active` only after the driver call succeeds; a driver
    /// failure leaves the state unchanged.
    pub fn begin_transaction(&self) -> Result<()> {
        let mut state = self.tx_state.lock();
        if state.is_active() {
            return Err(Error::TransactionAlreadyStarted);
        }

        let conn = self.get_connection()?;
        conn.begin_transaction().map_err(|source| Error::Driver {
            operation: "begin transaction",
            source,
        })?;

        *state = TransactionState::Active;
        tracing::debug!("transaction started");
        Ok(())
    }

    /// Commit the active transaction.
    ///
    /// A failed driver commit leaves the state `Active`, so the caller can
    /// retry the commit or roll back explicitly.
    pub fn commit_transaction(&self) -> Result<()> {
        let mut state = self.tx_state.lock();
        let conn = self.transaction_connection(*state)?;
        conn.commit().map_err(|source| Error::Driver {
            operation: "commit",
            source,
        })?;

        *state = TransactionState::NoTransaction;
        tracing::debug!("transaction committed");
        Ok(())
    }

    /// Roll back the active transaction.
    ///
    /// A failed driver rollback leaves the state `Active`.
    pub fn rollback_transaction(&self) -> Result<()> {
        let mut state = self.tx_state.lock();
        let conn = self.transaction_connection(*state)?;
        conn.rollback().map_err(|source| Error::Driver {
            operation: "rollback",
            source,
        })?;

        *state = TransactionState::NoTransaction;
        tracing::debug!("transaction rolled back");
        Ok(())
    }

    /// Release the managed connection and reset the transaction state.
    ///
    /// Idempotent. A driver failure while closing is logged and not
    /// surfaced. Also runs on drop.
    pub fn dispose(&self) {
        let mut state = self.tx_state.lock();
        // Handle assignment is only mutated under the construction gate;
        // waiting here means an in-flight construction settles its handle
        // before this call takes and closes it.
        let _gate = self.construction_gate.lock();
        if let Some(conn) = self.conn.write().take() {
            if let Err(error) = conn.close() {
                tracing::warn!(error = %error, "failed to close connection during dispose");
            }
            tracing::debug!("connection released");
        }
        *state = TransactionState::NoTransaction;
    }

    /// Resolve the connection for a commit or rollback.
    ///
    /// Requires an active transaction and a settled handle; an `Active`
    /// state implies a settled handle, since both are reset together under
    /// the state lock.
    fn transaction_connection(&self, state: TransactionState) -> Result<SharedConnection> {
        if !state.is_active() {
            return Err(Error::NoRunningTransaction);
        }
        self.conn.read().clone().ok_or(Error::NoRunningTransaction)
    }

    /// Select the construction strategy from the configuration.
    ///
    /// The factory/string path is preferred when complete; a producer alone
    /// is the producer-only path. A connection string without a factory
    /// signals factory-path intent and is rejected rather than silently
    /// rerouted.
    fn construction_path(&self) -> Result<ConstructionPath<'_>> {
        let config = &self.config;
        match (
            config.connection_string.as_deref(),
            config.factory.as_ref(),
            config.producer.as_ref(),
        ) {
            (Some(connection_string), Some(factory), fallback) => Ok(ConstructionPath::Factory {
                connection_string,
                factory,
                fallback,
            }),
            (Some(_), None, _) => Err(Error::NoFactory),
            (None, _, Some(producer)) => Ok(ConstructionPath::Producer(producer)),
            (None, _, None) => Err(Error::NeitherProviderNorFactory),
        }
    }

    /// Invoke the selected construction strategy and open the handle.
    fn construct(path: ConstructionPath<'_>) -> Result<SharedConnection> {
        let raw = match path {
            ConstructionPath::Factory {
                connection_string,
                factory,
                fallback,
            } => {
                tracing::debug!("constructing connection via factory");
                match factory(connection_string) {
                    Ok(conn) => conn,
                    Err(factory_error) => match fallback {
                        Some(producer) => {
                            tracing::warn!(
                                error = %factory_error,
                                "factory failed, falling back to producer"
                            );
                            producer().map_err(Error::ConnectionCreation)?
                        }
                        None => return Err(Error::ConnectionCreation(factory_error)),
                    },
                }
            }
            ConstructionPath::Producer(producer) => {
                tracing::debug!("constructing connection via producer");
                producer().map_err(Error::ConnectionCreation)?
            }
        };

        raw.open().map_err(Error::ConnectionCreation)?;
        Ok(Arc::from(raw))
    }
}

impl Drop for DbProvider {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for DbProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbProvider")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .field("transaction_state", &self.transaction_state())
            .finish()
    }
}

/// Builder for creating a provider.
///
/// # Example
///
/// ```rust,ignore
/// let provider = DbProvider::builder()
///     .connection_string("Server=localhost;Database=test;")
///     .factory(|conn_str| driver::connect(conn_str))
///     .mutex_timeout(Duration::from_secs(5))
///     .build();
/// ```
pub struct ProviderBuilder {
    config: ProviderConfig,
}

impl ProviderBuilder {
    /// Create a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ProviderConfig::default(),
        }
    }

    /// Set the connection string handed to the factory.
    #[must_use]
    pub fn connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.config.connection_string = Some(connection_string.into());
        self
    }

    /// Set the connection factory.
    #[must_use]
    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&str) -> DriverResult<Box<dyn Connection>> + Send + Sync + 'static,
    {
        self.config.factory = Some(Box::new(factory));
        self
    }

    /// Set the connection producer.
    #[must_use]
    pub fn producer<P>(mut self, producer: P) -> Self
    where
        P: Fn() -> DriverResult<Box<dyn Connection>> + Send + Sync + 'static,
    {
        self.config.producer = Some(Box::new(producer));
        self
    }

    /// Set the construction-mutex acquisition timeout.
    #[must_use]
    pub fn mutex_timeout(mut self, timeout: Duration) -> Self {
        self.config.mutex_timeout = timeout;
        self
    }

    /// Build the provider.
    ///
    /// Infallible: the configuration is classified lazily, when construction
    /// is first attempted.
    #[must_use]
    pub fn build(self) -> DbProvider {
        DbProvider::new(self.config)
    }
}

impl Default for ProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MUTEX_TIMEOUT;

    struct NullConnection;

    impl Connection for NullConnection {
        fn open(&self) -> DriverResult<()> {
            Ok(())
        }
        fn close(&self) -> DriverResult<()> {
            Ok(())
        }
        fn begin_transaction(&self) -> DriverResult<()> {
            Ok(())
        }
        fn commit(&self) -> DriverResult<()> {
            Ok(())
        }
        fn rollback(&self) -> DriverResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_builder_defaults() {
        let builder = ProviderBuilder::new();
        assert!(builder.config.connection_string.is_none());
        assert!(builder.config.factory.is_none());
        assert!(builder.config.producer.is_none());
        assert_eq!(builder.config.mutex_timeout, DEFAULT_MUTEX_TIMEOUT);
    }

    #[test]
    fn test_builder_fluent() {
        let builder = DbProvider::builder()
            .connection_string("Server=localhost;")
            .factory(|_| Ok(Box::new(NullConnection) as Box<dyn Connection>))
            .mutex_timeout(Duration::from_secs(5));

        assert_eq!(
            builder.config.connection_string.as_deref(),
            Some("Server=localhost;")
        );
        assert!(builder.config.factory.is_some());
        assert_eq!(builder.config.mutex_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_fresh_provider_state() {
        let provider = DbProvider::with_producer(|| {
            Ok(Box::new(NullConnection) as Box<dyn Connection>)
        });
        assert!(!provider.is_connected());
        assert_eq!(provider.transaction_state(), TransactionState::NoTransaction);
    }
}
