//! SDK loading
//!
//! [`SdkLoader`] makes sure a [`ClientFactory`] is available before the first client is
//! constructed. The factory either comes preloaded from the host or is loaded once from
//! `<sdk_lib_path>/<entry file>` through an [`SdkSource`]. The one-time guard is a
//! [`LoadState`], which can be shared between loaders when several registries should
//! trigger a single load.

pub mod dylib;

use crate::error::BoxError;
use crate::factory::ClientFactory;
use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::{debug, info, warn};

pub use dylib::{DylibClient, DylibFactory, DylibSource};

/// Something that can turn an SDK entry file into a client factory
pub trait SdkSource: Send + Sync {
    type Factory: ClientFactory;

    /// File name of the SDK entry point, relative to the SDK directory
    fn entry_file(&self) -> PathBuf;

    /// Load the SDK from `entry`, which is known to exist
    fn load(&self, entry: &Path) -> Result<Self::Factory>;
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("SDK library path is not configured")]
    PathNotConfigured,

    #[error("No SDK source configured to load the client factory from")]
    NoSource,

    #[error("SDK entry file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to load SDK from {}: {source}", path.display())]
    Library {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
}

/// One-time guard holding the loaded client factory
pub struct LoadState<F> {
    factory: OnceLock<F>,
    init: Mutex<()>,
    loads: AtomicUsize,
}

impl<F> Default for LoadState<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> LoadState<F> {
    pub fn new() -> Self {
        Self {
            factory: OnceLock::new(),
            init: Mutex::new(()),
            loads: AtomicUsize::new(0),
        }
    }

    /// A state that is already satisfied, e.g. when the host provides the factory
    pub fn preloaded(factory: F) -> Self {
        Self {
            factory: OnceLock::from(factory),
            ..Self::new()
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.factory.get().is_some()
    }

    pub fn get(&self) -> Option<&F> {
        self.factory.get()
    }

    /// Number of loads that actually ran. Preloaded factories don't count.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    fn get_or_try_load(
        &self,
        load: impl FnOnce() -> Result<F, LoadError>,
    ) -> Result<&F, LoadError> {
        if let Some(factory) = self.factory.get() {
            return Ok(factory);
        }

        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(factory) = self.factory.get() {
            return Ok(factory);
        }

        let factory = load()?;
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.factory.get_or_init(|| factory))
    }
}

impl<F> fmt::Debug for LoadState<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadState")
            .field("loaded", &self.is_loaded())
            .field("loads", &self.load_count())
            .finish_non_exhaustive()
    }
}

/// Loads the SDK on demand, at most once per [`LoadState`]
pub struct SdkLoader<F: ClientFactory> {
    sdk_lib_path: Option<PathBuf>,
    source: Option<Box<dyn SdkSource<Factory = F>>>,
    state: Arc<LoadState<F>>,
}

impl<F: ClientFactory> SdkLoader<F> {
    /// Create a loader reading the SDK from `sdk_lib_path` through `source`
    pub fn new<S>(sdk_lib_path: Option<PathBuf>, source: S) -> Self
    where
        S: SdkSource<Factory = F> + 'static,
    {
        Self {
            sdk_lib_path,
            source: Some(Box::new(source)),
            state: Arc::new(LoadState::new()),
        }
    }

    /// Create a loader whose factory is already available
    pub fn preloaded(factory: F) -> Self {
        Self {
            sdk_lib_path: None,
            source: None,
            state: Arc::new(LoadState::preloaded(factory)),
        }
    }

    /// Use `state` as the load guard, sharing it with other loaders
    pub fn with_state(mut self, state: Arc<LoadState<F>>) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> &Arc<LoadState<F>> {
        &self.state
    }

    pub fn sdk_lib_path(&self) -> Option<&Path> {
        self.sdk_lib_path.as_deref()
    }

    /// Full path of the SDK entry file, if it can be resolved
    pub fn entry_path(&self) -> Option<PathBuf> {
        let dir = self.sdk_lib_path.as_ref()?;
        let source = self.source.as_ref()?;
        Some(dir.join(source.entry_file()))
    }

    pub fn is_loaded(&self) -> bool {
        self.state.is_loaded()
    }

    /// Return the client factory, loading the SDK first if nothing has loaded it yet
    pub fn ensure_loaded(&self) -> Result<&F, LoadError> {
        self.state.get_or_try_load(|| self.load()).inspect_err(|e| {
            warn!("SDK load failed: {}", e);
        })
    }

    fn load(&self) -> Result<F, LoadError> {
        let source = self.source.as_ref().ok_or(LoadError::NoSource)?;
        let dir = self
            .sdk_lib_path
            .as_ref()
            .ok_or(LoadError::PathNotConfigured)?;

        let entry = dir.join(source.entry_file());
        if !entry.is_file() {
            return Err(LoadError::NotFound { path: entry });
        }

        debug!("Loading SDK from {}", entry.display());
        let factory = source.load(&entry).map_err(|e| LoadError::Library {
            path: entry.clone(),
            source: e.into(),
        })?;

        info!("SDK loaded from {}", entry.display());
        Ok(factory)
    }
}

impl<F: ClientFactory> fmt::Debug for SdkLoader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdkLoader")
            .field("sdk_lib_path", &self.sdk_lib_path)
            .field("entry_path", &self.entry_path())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
