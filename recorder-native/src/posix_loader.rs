//! `dlopen`-based loader for Linux and macOS.

use std::ffi::c_void;
use std::path::Path;

use libloading::os::unix::{Library, RTLD_LOCAL, RTLD_NOW};
use log::debug;

use recorder_core::models::error::ProvisionError;
use recorder_core::traits::library_loader::{LibraryLoader, NativeLibrary, SymbolAddr};

/// Opens libraries with `RTLD_NOW | RTLD_LOCAL`: every reference is bound
/// at load time and the engine's symbols stay out of the global namespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct DlopenLoader;

struct DlopenLibrary {
    library: Library,
}

impl LibraryLoader for DlopenLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn NativeLibrary>, ProvisionError> {
        // SAFETY: loading runs the library's initializers; callers only pass
        // engine binaries they extracted themselves.
        let library = unsafe { Library::open(Some(path), RTLD_NOW | RTLD_LOCAL) }.map_err(|e| {
            ProvisionError::LibraryOpen {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        debug!("dlopen {}", path.display());
        Ok(Box::new(DlopenLibrary { library }))
    }
}

impl NativeLibrary for DlopenLibrary {
    fn resolve(&self, name: &str) -> Result<SymbolAddr, ProvisionError> {
        // SAFETY: only the address is taken here; it is reinterpreted later
        // with the export's declared signature.
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
