use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use log::{debug, info, warn};
use uuid::Uuid;

use crate::models::descriptor::NativeAssetDescriptor;
use crate::models::error::ProvisionError;
use crate::storage::asset_source::AssetSource;
use crate::storage::fingerprint::fingerprint;

/// Temporary extraction files older than this are assumed abandoned by a
/// crashed writer.
pub const STALE_TEMP_AGE: Duration = Duration::from_secs(10 * 60);

/// A native binary extracted to local storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetCacheEntry {
    /// SHA-256 hex digest of the payload.
    pub fingerprint: String,
    pub path: PathBuf,
}

/// Content-addressed on-disk cache of bundled native binaries.
///
/// ## Layout
///
/// ```text
/// <cache_dir>/<sha256 of payload>/lib/<os-family>/<arch-tag>/<file>
/// ```
///
/// The digest segment keeps builds with different payloads apart, so a
/// stale or damaged copy from one version is never served to another.
/// Entries are created once and never modified.
pub struct AssetStore {
    cache_dir: PathBuf,
    source: Box<dyn AssetSource>,
}

impl AssetStore {
    pub fn new(cache_dir: impl Into<PathBuf>, source: Box<dyn AssetSource>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            source,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path an asset with `fingerprint` is (or would be) extracted to.
    pub fn cache_path(&self, fingerprint: &str, descriptor: &NativeAssetDescriptor) -> PathBuf {
        self.cache_dir
            .join(fingerprint)
            .join(descriptor.relative_fs_path())
    }

    /// Extract the binary for `descriptor`, reusing an earlier extraction.
    ///
    /// Safe to call concurrently from several processes: the payload is
    /// written to a unique temporary file and renamed into place, so the
    /// final path only ever holds complete contents.
    pub fn ensure_extracted(
        &self,
        descriptor: &NativeAssetDescriptor,
    ) -> Result<AssetCacheEntry, ProvisionError> {
        let bytes = self.source.read(&descriptor.relative_path())?;
        let fingerprint = fingerprint(&bytes);
        let path = self.cache_path(&fingerprint, descriptor);

        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() && meta.len() == bytes.len() as u64 => {
                debug!("Native library cache hit: {}", path.display());
                return Ok(AssetCacheEntry { fingerprint, path });
            }
            Ok(_) => warn!("Cached native library {} is incomplete, re-extracting", path.display()),
            Err(_) => {}
        }

        sweep_stale_temps(&path, STALE_TEMP_AGE);
        write_atomically(&path, &bytes)?;
        info!("Extracted {} to {}", descriptor, path.display());
        Ok(AssetCacheEntry { fingerprint, path })
    }
}

fn temp_prefix(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!(".{}.", file_name)
}

/// Remove temporary siblings of `path` last modified more than `max_age` ago.
///
/// Younger files may belong to a live writer in another process and are left
/// alone. Failures are ignored; a leftover file only costs disk space.
fn sweep_stale_temps(path: &Path, max_age: Duration) {
    let Some(parent) = path.parent() else {
        return;
    };
    let Ok(entries) = fs::read_dir(parent) else {
        return;
    };
    let prefix = temp_prefix(path);
    let now = SystemTime::now();

    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with(&prefix) || !name.ends_with(".tmp") {
            continue;
        }
        let stale = entry
            .metadata()
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .is_some_and(|age| age > max_age);
        if stale && fs::remove_file(entry.path()).is_ok() {
            debug!("Removed abandoned extraction file {}", entry.path().display());
        }
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), ProvisionError> {
    let extraction_error = |source: io::Error| ProvisionError::Extraction {
        path: path.to_path_buf(),
        source,
    };

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(extraction_error)?;

    let temp_path = parent.join(format!("{}{}.tmp", temp_prefix(path), Uuid::new_v4()));

    let result = write_file(&temp_path, bytes).and_then(|_| fs::rename(&temp_path, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path);
        // Another process published the same bytes first and holds the file open.
        if is_complete(path, bytes.len()) {
            debug!("Lost extraction race for {}, using existing copy", path.display());
            return Ok(());
        }
        return Err(extraction_error(e));
    }
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn is_complete(path: &Path, len: usize) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.len() == len as u64)
        .unwrap_or(false)
}
