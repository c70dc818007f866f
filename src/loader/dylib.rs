//! Shared-library SDK adapter
//!
//! The SDK ships as a native library (`libgraph_sdk.so`, `libgraph_sdk.dylib` or
//! `graph_sdk.dll`) exporting a small C ABI:
//!
//! ```c
//! void *graph_sdk_client_new(const char *options_json); // NULL on failure
//! void graph_sdk_client_free(void *client);
//! ```
//!
//! Connection options are serialized to a JSON object and passed as-is.

use super::SdkSource;
use crate::config::ConnectionOptions;
use crate::factory::ClientFactory;
use anyhow::{Context, Result, bail};
use libloading::Library;
use std::ffi::{CString, c_char, c_void};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::Arc;
use tracing::debug;

/// Base name of the SDK library, before platform prefix/suffix
pub const SDK_LIBRARY_NAME: &str = "graph_sdk";

const CLIENT_NEW_SYMBOL: &[u8] = b"graph_sdk_client_new\0";
const CLIENT_FREE_SYMBOL: &[u8] = b"graph_sdk_client_free\0";

type ClientNewFn = unsafe extern "C" fn(options_json: *const c_char) -> *mut c_void;
type ClientFreeFn = unsafe extern "C" fn(client: *mut c_void);

/// [`SdkSource`] that loads the SDK as a shared library
#[derive(Debug, Clone)]
pub struct DylibSource {
    library_name: String,
}

impl Default for DylibSource {
    fn default() -> Self {
        Self::new(SDK_LIBRARY_NAME)
    }
}

impl DylibSource {
    pub fn new(library_name: impl Into<String>) -> Self {
        Self {
            library_name: library_name.into(),
        }
    }
}

impl SdkSource for DylibSource {
    type Factory = DylibFactory;

    fn entry_file(&self) -> PathBuf {
        PathBuf::from(libloading::library_filename(&self.library_name))
    }

    fn load(&self, entry: &Path) -> Result<DylibFactory> {
        // SAFETY: loading runs the library's initializers; the SDK is trusted code
        // configured by the operator.
        let library = unsafe { Library::new(entry) }
            .with_context(|| format!("Failed to load dylib: {}", entry.display()))?;

        // SAFETY: the symbol types match the SDK's documented C ABI. The copied
        // function pointers stay valid as long as `library` is alive, which every
        // factory and client guarantees by holding an `Arc<Library>`.
        let (client_new, client_free) = unsafe {
            let client_new = *library
                .get::<ClientNewFn>(CLIENT_NEW_SYMBOL)
                .context("SDK does not export graph_sdk_client_new")?;
            let client_free = *library
                .get::<ClientFreeFn>(CLIENT_FREE_SYMBOL)
                .context("SDK does not export graph_sdk_client_free")?;
            (client_new, client_free)
        };

        Ok(DylibFactory {
            library: Arc::new(library),
            client_new,
            client_free,
            path: entry.to_path_buf(),
        })
    }
}

/// Client factory calling into the loaded SDK library
pub struct DylibFactory {
    library: Arc<Library>,
    client_new: ClientNewFn,
    client_free: ClientFreeFn,
    path: PathBuf,
}

impl DylibFactory {
    /// Path the SDK library was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ClientFactory for DylibFactory {
    type Client = DylibClient;

    fn construct(&self, options: &ConnectionOptions) -> Result<DylibClient> {
        let json = serde_json::to_string(options).context("Failed to serialize options")?;
        let json = CString::new(json).context("Options contain an interior NUL byte")?;

        debug!(
            "Calling graph_sdk_client_new from {}",
            self.path.display()
        );
        // SAFETY: `json` is a valid NUL-terminated string that outlives the call.
        let raw = unsafe { (self.client_new)(json.as_ptr()) };
        let Some(handle) = NonNull::new(raw) else {
            bail!("SDK constructor returned a null client handle");
        };

        Ok(DylibClient {
            handle,
            free: self.client_free,
            _library: self.library.clone(),
        })
    }
}

/// Client handle owned by the SDK library, released on drop
pub struct DylibClient {
    handle: NonNull<c_void>,
    free: ClientFreeFn,
    _library: Arc<Library>,
}

impl DylibClient {
    /// Raw SDK handle, for calling other SDK functions
    pub fn as_ptr(&self) -> *mut c_void {
        self.handle.as_ptr()
    }
}

impl Drop for DylibClient {
    fn drop(&mut self) {
        // SAFETY: `handle` came from `graph_sdk_client_new` and is freed exactly once,
        // before `_library` is released.
        unsafe { (self.free)(self.handle.as_ptr()) }
    }
}

// SAFETY: the SDK ABI requires client handles to be usable from any thread.
unsafe impl Send for DylibClient {}
unsafe impl Sync for DylibClient {}

impl std::fmt::Debug for DylibClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DylibClient")
            .field("handle", &self.handle)
            .finish()
    }
}
