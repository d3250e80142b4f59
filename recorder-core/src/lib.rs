//! # recorder-core
//!
//! Platform-agnostic core of the native recorder bridge.
//!
//! Resolves which prebuilt engine library fits the host, extracts it into a
//! content-fingerprinted cache, binds its exports into a typed table and
//! wraps the engine's recorder object in safe pull and push sessions.
//! Opening a dynamic library is delegated to the `LibraryLoader` trait so
//! that OS backends (see `recorder-native`) and statically linked builds
//! plug in behind the same interface.
//!
//! ## Architecture
//!
//! ```text
//! recorder-core (this crate)
//! ├── platform/   ← HostPlatform, resolve(), /proc/cpuinfo parsing
//! ├── storage/    ← AssetSource, AssetStore, fingerprint()
//! ├── traits/     ← LibraryLoader, NativeLibrary, FrameHandler
//! ├── loader/     ← StaticLoader (symbols linked into the executable)
//! ├── bridge/     ← Engine, Recorder, CallbackRecorder, device listing
//! └── models/     ← StatusCode, errors, configs, SessionState, descriptors
//! ```

pub mod bridge;
pub mod loader;
pub mod models;
pub mod platform;
pub mod storage;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types at crate root for convenience.
pub use bridge::callback::{frame_queue, CallbackRecorder, FrameQueue, FrameReceiver};
pub use bridge::exports::Engine;
pub use bridge::session::Recorder;
pub use loader::StaticLoader;
pub use models::config::{EngineMode, ProvisionConfig, RecorderConfig};
pub use models::descriptor::NativeAssetDescriptor;
pub use models::error::{ProvisionError, RecorderError};
pub use models::state::SessionState;
pub use models::status::{ErrorKind, StatusCode};
pub use platform::HostPlatform;
pub use storage::asset_source::{AssetSource, DirectoryAssets, EmbeddedAssets};
pub use storage::asset_store::{AssetCacheEntry, AssetStore};
pub use traits::frame_handler::FrameHandler;
pub use traits::library_loader::{LibraryLoader, NativeLibrary, SymbolAddr};
