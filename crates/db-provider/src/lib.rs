//! # db-provider
//!
//! Single-flight database connection provider with strict transaction-state
//! tracking.
//!
//! A [`DbProvider`] manages the lifecycle of one logical database connection
//! and an optional transaction scoped to it, decoupling callers from
//! driver-specific connection construction. Construction is handed in as a
//! factory keyed by a connection string, a zero-argument producer, or both.
//!
//! ## Guarantees
//!
//! - **Single-flight construction**: among concurrent `get_connection` calls
//!   on one provider, the factory or producer is invoked exactly once, gated
//!   by a construction mutex with a bounded acquisition timeout.
//! - **Connection reuse**: once a handle is settled, callers get the same
//!   handle back without paying lock overhead.
//! - **Transaction discipline**: at most one active transaction per provider;
//!   begin/commit/rollback ordering is validated and out-of-order calls fail
//!   with distinct, matchable error kinds.
//!
//! ## Example
//!
//! ```rust,ignore
//! use db_provider::DbProvider;
//!
//! let provider = DbProvider::with_factory(
//!     "Server=localhost;Database=test;",
//!     |conn_str| driver::connect(conn_str),
//! );
//!
//! let conn = provider.get_connection()?;
//! provider.begin_transaction()?;
//! // ... work on the connection ...
//! provider.commit_transaction()?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod connection;
pub mod error;
pub mod provider;
pub mod state;

// Re-export commonly used types
pub use config::ProviderConfig;
pub use connection::{
    BoxError, Connection, ConnectionFactory, ConnectionProducer, DriverResult, SharedConnection,
};
pub use error::{Error, Result};
pub use provider::{DbProvider, ProviderBuilder};
pub use state::TransactionState;
