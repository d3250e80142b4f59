//! # recorder-native
//!
//! OS loader backends and provisioning for the native recorder engine.
//!
//! Provides:
//! - `DlopenLoader` — `dlopen`/`dlsym` on Linux and macOS
//! - `LoadLibraryLoader` — `LoadLibraryExW`/`GetProcAddress` on Windows
//! - `provision` — resolve the host, extract the bundled binary, load it
//! - `init_global` — the process-wide engine, loaded at most once
//!
//! ## Usage
//! ```ignore
//! use recorder_core::{DirectoryAssets, ProvisionConfig, Recorder, RecorderConfig};
//!
//! let engine = recorder_native::init_global(
//!     &ProvisionConfig::default(),
//!     Box::new(DirectoryAssets::new("resources")),
//! )?;
//! let mut recorder = Recorder::init(engine, &RecorderConfig::default())?;
//! recorder.start()?;
//! let frame = recorder.read()?;
//! ```

#[cfg(unix)]
pub mod posix_loader;
pub mod provision;
#[cfg(windows)]
pub mod windows_loader;

#[cfg(unix)]
pub use posix_loader::DlopenLoader;
#[cfg(windows)]
pub use windows_loader::LoadLibraryLoader;

#[cfg(any(unix, windows))]
pub use provision::{init_global, provision};
pub use provision::{global, init_global_with, provision_static, provision_with};

/// The loader for the running OS.
#[cfg(unix)]
pub type SystemLoader = DlopenLoader;
/// The loader for the running OS.
#[cfg(windows)]
pub type SystemLoader = LoadLibraryLoader;
