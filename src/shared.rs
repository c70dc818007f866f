//! Process-wide registry instance
//!
//! Hosts that want a single global access point initialize it once at startup and
//! fetch it anywhere afterwards. Registries created directly are unaffected.

use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::registry::DylibRegistry;
use std::sync::OnceLock;
use tracing::info;

/// Global shared instance of the client registry
static SHARED_REGISTRY: OnceLock<DylibRegistry> = OnceLock::new();

/// Get the global shared client registry
pub fn get_shared_registry() -> Result<&'static DylibRegistry, RegistryError> {
    SHARED_REGISTRY
        .get()
        .ok_or(RegistryError::SharedNotInitialized)
}

/// Build, initialize and publish the shared registry.
///
/// The SDK is loaded before the registry is published, so a load failure leaves the
/// shared registry uninitialized. Once published, later calls fail without loading.
pub fn initialize_shared_registry_with_config(config: RegistryConfig) -> Result<(), RegistryError> {
    if SHARED_REGISTRY.get().is_some() {
        return Err(RegistryError::SharedAlreadyInitialized);
    }

    info!(
        "Initializing shared client registry with {} connection(s)",
        config.connections.len()
    );

    let registry = DylibRegistry::from_config(config);
    registry.initialize()?;

    SHARED_REGISTRY
        .set(registry)
        .map_err(|_| RegistryError::SharedAlreadyInitialized)?;

    info!("Shared client registry initialized successfully");
    Ok(())
}

/// Initialize the shared registry from a JSON configuration file
pub fn initialize_shared_registry(
    config_path: impl AsRef<std::path::Path>,
) -> Result<(), RegistryError> {
    initialize_shared_registry_with_config(RegistryConfig::from_path(config_path)?)
}
