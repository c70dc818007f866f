//! Client registry
//!
//! [`ClientRegistry`] maps connection keys to SDK clients. [`get_client`] creates a
//! client on first use and hands out the same instance afterwards; [`create_client`]
//! always builds a fresh one and leaves the cache alone.
//!
//! ```rust,no_run
//! use graphlink::{ClientRegistry, RegistryConfig};
//!
//! let config = RegistryConfig::from_path("graphlink.json").unwrap();
//! let registry = ClientRegistry::from_config(config);
//! registry.initialize().unwrap();
//!
//! let client = registry.client().unwrap();
//! let same = registry.get_client("default").unwrap();
//! assert!(std::sync::Arc::ptr_eq(&client, &same));
//! ```
//!
//! [`get_client`]: ClientRegistry::get_client
//! [`create_client`]: ClientRegistry::create_client

use crate::cache::ClientCache;
use crate::config::{ConnectionConfig, ConnectionSet, DEFAULT_CONNECTION_KEY, RegistryConfig};
use crate::error::RegistryError;
use crate::factory::ClientFactory;
use crate::loader::{DylibFactory, DylibSource, SdkLoader};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Registry backed by the shared-library SDK
pub type DylibRegistry = ClientRegistry<DylibFactory>;

pub struct ClientRegistry<F: ClientFactory> {
    connections: ConnectionSet,
    loader: SdkLoader<F>,
    clients: ClientCache<F::Client>,
}

impl ClientRegistry<DylibFactory> {
    /// Build a registry that loads the SDK library from `config.sdk_lib_path`
    pub fn from_config(config: RegistryConfig) -> Self {
        let loader = SdkLoader::new(config.sdk_lib_path, DylibSource::default());
        Self::new(config.connections, loader)
    }
}

impl<F: ClientFactory> ClientRegistry<F> {
    pub fn new(connections: ConnectionSet, loader: SdkLoader<F>) -> Self {
        Self {
            connections,
            loader,
            clients: ClientCache::new(),
        }
    }

    /// Registry over an already available factory
    pub fn with_factory(connections: ConnectionSet, factory: F) -> Self {
        Self::new(connections, SdkLoader::preloaded(factory))
    }

    /// Initialization hook: load the SDK now so failures show up at startup
    pub fn initialize(&self) -> Result<(), RegistryError> {
        self.loader.ensure_loaded()?;
        Ok(())
    }

    /// Get the client for `key`, creating and caching it on first use
    pub fn get_client(&self, key: &str) -> Result<Arc<F::Client>, RegistryError> {
        if let Some(client) = self.clients.get(key) {
            debug!("Using cached client for connection '{}'", key);
            return Ok(client);
        }

        self.clients.get_or_try_insert_with(key, || {
            debug!("No cached client for connection '{}'", key);
            self.create_client(key)
        })
    }

    /// Get the client for the "default" connection
    pub fn client(&self) -> Result<Arc<F::Client>, RegistryError> {
        self.get_client(DEFAULT_CONNECTION_KEY)
    }

    /// Create a new, uncached client for `key`
    pub fn create_client(&self, key: &str) -> Result<F::Client, RegistryError> {
        let connection = self
            .connections
            .get(key)
            .ok_or_else(|| RegistryError::KeyNotFound(key.to_string()))?;

        let factory = self.loader.ensure_loaded()?;

        debug!(
            "Constructing client for connection '{}' with options [{}]",
            key,
            connection
                .options
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );

        factory.construct(&connection.options).map_err(|e| {
            warn!("Client construction for connection '{}' failed: {}", key, e);
            RegistryError::Construction {
                key: key.to_string(),
                source: e.into(),
            }
        })
    }

    /// Create a new, uncached client for the "default" connection
    pub fn create_default_client(&self) -> Result<F::Client, RegistryError> {
        self.create_client(DEFAULT_CONNECTION_KEY)
    }

    pub fn connection(&self, key: &str) -> Option<&ConnectionConfig> {
        self.connections.get(key)
    }

    pub fn connections(&self) -> &ConnectionSet {
        &self.connections
    }

    /// Configured connection keys, sorted
    pub fn connection_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.connections.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn is_cached(&self, key: &str) -> bool {
        self.clients.contains(key)
    }

    pub fn cached_len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_loaded(&self) -> bool {
        self.loader.is_loaded()
    }

    pub fn loader(&self) -> &SdkLoader<F> {
        &self.loader
    }
}

impl<F: ClientFactory> fmt::Debug for ClientRegistry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("connections", &self.connection_keys())
            .field("loader", &self.loader)
            .field("clients", &self.clients)
            .finish()
    }
}
