//! Provisioning: platform resolution, extraction and loading in one step,
//! plus the process-wide engine.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use log::info;
use parking_lot::Mutex;

use recorder_core::models::config::{EngineMode, ProvisionConfig};
use recorder_core::models::descriptor::NativeAssetDescriptor;
use recorder_core::models::error::ProvisionError;
use recorder_core::storage::asset_source::AssetSource;
use recorder_core::storage::asset_store::AssetStore;
use recorder_core::traits::library_loader::LibraryLoader;
use recorder_core::{Engine, StaticLoader};

static ENGINE: OnceLock<Arc<Engine>> = OnceLock::new();
static INIT_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Resolve the host, extract its bundled binary and load it with the OS loader.
#[cfg(any(unix, windows))]
pub fn provision(
    config: &ProvisionConfig,
    source: Box<dyn AssetSource>,
) -> Result<Arc<Engine>, ProvisionError> {
    let descriptor = recorder_core::platform::resolve_current()?;
    provision_with(config, source, &descriptor, &crate::SystemLoader::default())
}

/// Extract the binary for `descriptor` into the configured cache and open
/// the cached copy with `loader`.
pub fn provision_with(
    config: &ProvisionConfig,
    source: Box<dyn AssetSource>,
    descriptor: &NativeAssetDescriptor,
    loader: &dyn LibraryLoader,
) -> Result<Arc<Engine>, ProvisionError> {
    let store = AssetStore::new(config.cache_dir(), source);
    let entry = store.ensure_extracted(descriptor)?;
    Engine::load(loader, &entry.path, config.mode)
}

/// Bind an engine linked into the executable. Nothing is extracted.
pub fn provision_static(loader: &StaticLoader, mode: EngineMode) -> Result<Arc<Engine>, ProvisionError> {
    Engine::load(loader, Path::new("<static>"), mode)
}

/// The process-wide engine, if one has been loaded.
pub fn global() -> Option<Arc<Engine>> {
    ENGINE.get().cloned()
}

/// Load the process-wide engine on first use; later calls return it.
#[cfg(any(unix, windows))]
pub fn init_global(
    config: &ProvisionConfig,
    source: Box<dyn AssetSource>,
) -> Result<Arc<Engine>, ProvisionError> {
    init_global_with(|| provision(config, source))
}

/// Like [`init_global`] with a caller-supplied provisioning step.
///
/// `load` runs at most once per process even under concurrent callers. A
/// failed load leaves nothing installed, so a later call may try again.
pub fn init_global_with<F>(load: F) -> Result<Arc<Engine>, ProvisionError>
where
    F: FnOnce() -> Result<Arc<Engine>, ProvisionError>,
{
    if let Some(engine) = ENGINE.get() {
        return Ok(Arc::clone(engine));
    }

    let _guard = INIT_LOCK.lock();
    if let Some(engine) = ENGINE.get() {
        return Ok(Arc::clone(engine));
    }

    let engine = load()?;
    let installed = ENGINE.get_or_init(|| engine);
    info!("Native recorder {} installed as the process engine", installed.version());
    Ok(Arc::clone(installed))
}
