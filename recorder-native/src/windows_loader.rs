//! `LoadLibraryExW`-based loader for Windows.

use std::ffi::c_void;
use std::path::Path;

use libloading::os::windows::{Library, LOAD_WITH_ALTERED_SEARCH_PATH};
use log::debug;

use recorder_core::models::error::ProvisionError;
use recorder_core::traits::library_loader::{LibraryLoader, NativeLibrary, SymbolAddr};

/// Opens libraries with `LOAD_WITH_ALTERED_SEARCH_PATH`, so the engine's own
/// dependencies are searched next to the extracted DLL first.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadLibraryLoader;

struct WindowsLibrary {
    library: Library,
}

impl LibraryLoader for LoadLibraryLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn NativeLibrary>, ProvisionError> {
        // SAFETY: loading runs DllMain; callers only pass engine binaries
        // they extracted themselves.
        let library = unsafe { Library::load_with_flags(path, LOAD_WITH_ALTERED_SEARCH_PATH) }
            .map_err(|e| ProvisionError::LibraryOpen {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        debug!("LoadLibraryExW {}", path.display());
        Ok(Box::new(WindowsLibrary { library }))
    }
}

impl NativeLibrary for WindowsLibrary {
    fn resolve(&self, name: &str) -> Result<SymbolAddr, ProvisionError> {
        // SAFETY: only the address is taken here.
        let symbol = unsafe { self.library.get::<unsafe extern "C" fn()>(name.as_bytes()) }
            .map_err(|e| ProvisionError::MissingSymbol {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        SymbolAddr::new(*symbol as *const c_void).ok_or_else(|| ProvisionError::MissingSymbol {
            name: name.to_string(),
            reason: "resolved to a null address".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_kernel32_and_resolves_exports() {
        let library = LoadLibraryLoader.open(Path::new("kernel32.dll")).unwrap();
        assert!(library.resolve("GetCurrentProcessId").is_ok());
        assert!(matches!(
            library.resolve("pv_recorder_definitely_not_here"),
            Err(ProvisionError::MissingSymbol { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("libpv_recorder.dll");
        assert!(matches!(
            LoadLibraryLoader.open(&path),
            Err(ProvisionError::LibraryOpen { .. })
        ));
    }
}
