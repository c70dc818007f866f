//! Client factory seam
//!
//! The SDK's client constructor sits behind [`ClientFactory`], so the registry never
//! deals with the third-party boundary directly. Production code gets a factory from
//! the [`loader`](crate::loader); tests and embedding hosts can wrap a closure with
//! [`FnFactory`].

use crate::config::ConnectionOptions;
use anyhow::Result;

/// Constructs SDK clients from connection options
pub trait ClientFactory: Send + Sync {
    /// The opaque client handle produced by the SDK
    type Client: Send + Sync;

    /// Build a new client. `options` must be handed to the SDK unmodified.
    fn construct(&self, options: &ConnectionOptions) -> Result<Self::Client>;
}

/// [`ClientFactory`] backed by a closure
#[derive(Clone)]
pub struct FnFactory<F> {
    construct: F,
}

impl<F> FnFactory<F> {
    pub fn new(construct: F) -> Self {
        Self { construct }
    }
}

impl<F, C> ClientFactory for FnFactory<F>
where
    F: Fn(&ConnectionOptions) -> Result<C> + Send + Sync,
    C: Send + Sync,
{
    type Client = C;

    fn construct(&self, options: &ConnectionOptions) -> Result<C> {
        (self.construct)(options)
    }
}
