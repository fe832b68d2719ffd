//! Provider configuration.

use std::time::Duration;

use crate::connection::{ConnectionFactory, ConnectionProducer};

/// Default bound on construction-mutex acquisition.
pub const DEFAULT_MUTEX_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration describing how a provider obtains its connection.
///
/// The three supported shapes mirror the provider's named constructors:
///
/// - connection string + factory
/// - producer only
/// - connection string + factory + fallback producer
///
/// Other combinations are representable but not usable; they are classified
/// lazily, at the point construction is first attempted, not when the
/// provider is built. A provider with an unusable configuration fails
/// `get_connection` with a configuration error and never invokes the
/// construction mutex.
pub struct ProviderConfig {
    /// Connection string handed to the factory.
    pub connection_string: Option<String>,

    /// Factory mapping the connection string to a connection handle.
    pub factory: Option<ConnectionFactory>,

    /// Producer yielding a connection handle directly. When a factory and
    /// connection string are also present, the producer acts as a fallback
    /// for a failed factory invocation.
    pub producer: Option<ConnectionProducer>,

    /// How long a caller may wait on the construction mutex before the
    /// attempt fails.
    pub mutex_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            factory: None,
            producer: None,
            mutex_timeout: DEFAULT_MUTEX_TIMEOUT,
        }
    }
}

impl ProviderConfig {
    /// Create an empty configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The connection string may embed credentials; report presence only.
        f.debug_struct("ProviderConfig")
            .field("has_connection_string", &self.connection_string.is_some())
            .field("has_factory", &self.factory.is_some())
            .field("has_producer", &self.producer.is_some())
            .field("mutex_timeout", &self.mutex_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProviderConfig::new();
        assert!(config.connection_string.is_none());
        assert!(config.factory.is_none());
        assert!(config.producer.is_none());
        assert_eq!(config.mutex_timeout, DEFAULT_MUTEX_TIMEOUT);
    }

    #[test]
    fn test_debug_hides_connection_string() {
        let config = ProviderConfig {
            connection_string: Some("Server=localhost;Password=secret;".into()),
            ..ProviderConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(rendered.contains("has_connection_string: true"));
        assert!(!rendered.contains("secret"));
    }
}
