//! Browser host: mounts the blob on a canvas and exposes a small handle to
//! JavaScript for control messages.

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod events;
#[cfg(target_arch = "wasm32")]
mod frame;
#[cfg(target_arch = "wasm32")]
mod host;
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
mod pending;

#[cfg(target_arch = "wasm32")]
pub use host::{start, start_blob, BlobHandle};
#[cfg(target_arch = "wasm32")]
pub(crate) use host::SharedGovernor;
