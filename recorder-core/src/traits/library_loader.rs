use std::ffi::c_void;
use std::mem;
use std::path::Path;

use crate::models::error::ProvisionError;

/// Address of a resolved export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolAddr(*const c_void);

// SAFETY: an export address is immutable for as long as its library is loaded.
unsafe impl Send for SymbolAddr {}
unsafe impl Sync for SymbolAddr {}

impl SymbolAddr {
    /// `None` for a null address.
    pub fn new(ptr: *const c_void) -> Option<Self> {
        (!ptr.is_null()).then_some(Self(ptr))
    }

    pub fn as_ptr(self) -> *const c_void {
        self.0
    }

    /// Reinterpret the address as a typed function pointer.
    ///
    /// # Safety
    /// `F` must be the `extern "C"` signature the export was compiled with,
    /// and the owning library must outlive every use of the result.
    pub unsafe fn cast<F: Copy>(self) -> F {
        assert_eq!(mem::size_of::<F>(), mem::size_of::<*const c_void>());
        mem::transmute_copy(&self.0)
    }
}

/// An opened native library.
///
/// Dropping it unloads the library; every address it resolved becomes invalid.
pub trait NativeLibrary: Send + Sync {
    fn resolve(&self, name: &str) -> Result<SymbolAddr, ProvisionError>;
}

/// Opens native libraries with one OS loading primitive.
///
/// Implementations: `dlopen` and `LoadLibraryEx` in `recorder-native`,
/// [`StaticLoader`](crate::loader::StaticLoader) for a statically linked engine.
/// Opening a library runs its initializers, so `path` must point at a
/// trusted engine binary.
pub trait LibraryLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn NativeLibrary>, ProvisionError>;
}
