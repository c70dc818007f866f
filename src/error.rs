use crate::config::ConfigError;
use crate::loader::LoadError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Unknown connection key '{0}'")]
    KeyNotFound(String),

    #[error("Failed to construct client for connection '{key}': {source}")]
    Construction {
        key: String,
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Shared client registry not initialized")]
    SharedNotInitialized,

    #[error("Shared client registry already initialized")]
    SharedAlreadyInitialized,
}
