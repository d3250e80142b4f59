use std::collections::HashMap;
use std::ffi::c_void;
use std::path::Path;

use crate::models::error::ProvisionError;
use crate::traits::library_loader::{LibraryLoader, NativeLibrary, SymbolAddr};

/// Loader for an engine linked into the executable.
///
/// Exports are registered by name up front; `open` ignores its path.
///
/// ```ignore
/// extern "C" {
///     fn pv_recorder_init(/* ... */) -> i32;
/// }
/// let loader = StaticLoader::new()
///     .with_symbol("pv_recorder_init", pv_recorder_init as *const c_void);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    symbols: HashMap<String, SymbolAddr>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `address` under `name`. Null addresses are ignored.
    pub fn with_symbol(mut self, name: &str, address: *const c_void) -> Self {
        match SymbolAddr::new(address) {
            Some(addr) => {
                self.symbols.insert(name.to_string(), addr);
            }
            None => {
                self.symbols.remove(name);
            }
        }
        self
    }

    pub fn without_symbol(mut self, name: &str) -> Self {
        self.symbols.remove(name);
        self
    }
}

struct StaticLibrary {
    symbols: HashMap<String, SymbolAddr>,
}

impl LibraryLoader for StaticLoader {
    fn open(&self, _path: &Path) -> Result<Box<dyn NativeLibrary>, ProvisionError> {
        Ok(Box::new(StaticLibrary {
            symbols: self.symbols.clone(),
        }))
    }
}

impl NativeLibrary for StaticLibrary {
    fn resolve(&self, name: &str) -> Result<SymbolAddr, ProvisionError> {
        self.symbols
            .get(name)
            .copied()
            .ok_or_else(|| ProvisionError::MissingSymbol {
                name: name.to_string(),
                reason: "not linked into this executable".into(),
            })
    }
}
