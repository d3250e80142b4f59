use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::models::error::ProvisionError;

/// Where bundled native binaries are read from.
///
/// Paths are `/`-separated and relative to the bundle root
/// (`lib/<os-family>/<arch-tag>/<file>`).
pub trait AssetSource: Send + Sync {
    fn read(&self, relative_path: &str) -> Result<Cow<'static, [u8]>, ProvisionError>;
}

/// Binaries compiled into the application with `include_bytes!`.
///
/// ```ignore
/// static ASSETS: EmbeddedAssets = EmbeddedAssets::new(&[(
///     "lib/linux/x86_64/libpv_recorder.so",
///     include_bytes!("../lib/linux/x86_64/libpv_recorder.so"),
/// )]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedAssets {
    entries: &'static [(&'static str, &'static [u8])],
}

impl EmbeddedAssets {
    pub const fn new(entries: &'static [(&'static str, &'static [u8])]) -> Self {
        Self { entries }
    }
}

impl AssetSource for EmbeddedAssets {
    fn read(&self, relative_path: &str) -> Result<Cow<'static, [u8]>, ProvisionError> {
        self.entries
            .iter()
            .find(|(path, _)| *path == relative_path)
            .map(|(_, bytes)| Cow::Borrowed(*bytes))
            .ok_or_else(|| ProvisionError::AssetMissing(relative_path.to_string()))
    }
}

/// Binaries shipped as files in a resource directory next to the application.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for DirectoryAssets {
    fn read(&self, relative_path: &str) -> Result<Cow<'static, [u8]>, ProvisionError> {
        let path = relative_path
            .split('/')
            .fold(self.root.clone(), |path, segment| path.join(segment));
        match fs::read(&path) {
            Ok(bytes) => Ok(Cow::Owned(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ProvisionError::AssetMissing(relative_path.to_string()))
            }
            Err(source) => Err(ProvisionError::AssetRead { path, source }),
        }
    }
}
