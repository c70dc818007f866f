//! # graphlink
//!
//! Named, lazily created clients for social graph API SDKs. Connection profiles come
//! from configuration, the SDK is loaded once, and each profile's client is built on
//! first use and reused afterwards.

pub mod cache;
pub mod config;
pub mod error;
pub mod factory;
pub mod loader;
pub mod registry;
pub mod shared;

// Re-export commonly used types
pub use config::{
    ConnectionConfig, ConnectionOptions, ConnectionSet, DEFAULT_CONNECTION_KEY, OptionValue,
    RegistryConfig,
};
pub use error::RegistryError;
pub use factory::{ClientFactory, FnFactory};
pub use loader::{LoadError, LoadState, SdkLoader, SdkSource};
pub use registry::{ClientRegistry, DylibRegistry};
pub use shared::{get_shared_registry, initialize_shared_registry, initialize_shared_registry_with_config};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
