//! The engine's exported function table and the loaded engine.

use std::ffi::{c_char, c_void};
use std::path::Path;
use std::sync::Arc;

use log::info;

use crate::bridge::marshal::copy_c_str;
use crate::models::config::EngineMode;
use crate::models::error::ProvisionError;
use crate::traits::library_loader::{LibraryLoader, NativeLibrary};

/// Opaque engine-side recorder object.
#[repr(C)]
pub struct CRecorder {
    _private: [u8; 0],
}

pub type InitFn = unsafe extern "C" fn(
    frame_length: i32,
    device_index: i32,
    buffered_frames_count: i32,
    object: *mut *mut CRecorder,
) -> i32;
pub type PushInitFn = unsafe extern "C" fn(
    device_index: i32,
    frame_length: i32,
    callback: FrameCallbackFn,
    user_data: *mut c_void,
    object: *mut *mut CRecorder,
) -> i32;
pub type FrameCallbackFn = unsafe extern "C" fn(pcm: *const i16, user_data: *mut c_void);
pub type DeleteFn = unsafe extern "C" fn(object: *mut CRecorder);
pub type StartFn = unsafe extern "C" fn(object: *mut CRecorder) -> i32;
pub type StopFn = unsafe extern "C" fn(object: *mut CRecorder) -> i32;
pub type ReadFn = unsafe extern "C" fn(object: *mut CRecorder, pcm: *mut i16) -> i32;
pub type SetDebugLoggingFn = unsafe extern "C" fn(object: *mut CRecorder, is_debug_logging: bool);
pub type GetIsRecordingFn = unsafe extern "C" fn(object: *mut CRecorder) -> bool;
pub type GetSelectedDeviceFn = unsafe extern "C" fn(object: *mut CRecorder) -> *const c_char;
pub type GetAvailableDevicesFn =
    unsafe extern "C" fn(device_list_length: *mut i32, device_list: *mut *mut *mut c_char) -> i32;
pub type FreeAvailableDevicesFn =
    unsafe extern "C" fn(device_list_length: i32, device_list: *mut *mut c_char);
pub type SampleRateFn = unsafe extern "C" fn() -> i32;
pub type VersionFn = unsafe extern "C" fn() -> *const c_char;

/// Exported symbol names.
pub mod symbols {
    pub const INIT: &str = "pv_recorder_init";
    pub const DELETE: &str = "pv_recorder_delete";
    pub const START: &str = "pv_recorder_start";
    pub const STOP: &str = "pv_recorder_stop";
    pub const READ: &str = "pv_recorder_read";
    pub const SET_DEBUG_LOGGING: &str = "pv_recorder_set_debug_logging";
    pub const GET_IS_RECORDING: &str = "pv_recorder_get_is_recording";
    pub const GET_SELECTED_DEVICE: &str = "pv_recorder_get_selected_device";
    pub const GET_AVAILABLE_DEVICES: &str = "pv_recorder_get_available_devices";
    pub const FREE_AVAILABLE_DEVICES: &str = "pv_recorder_free_available_devices";
    pub const VERSION: &str = "pv_recorder_version";
    pub const SAMPLE_RATE: &str = "pv_recorder_sample_rate";
}

/// Mode-specific entry points.
#[derive(Clone, Copy)]
pub(crate) enum Capture {
    Pull { init: InitFn, read: ReadFn },
    Push { init: PushInitFn },
}

/// Typed pointers for every export, resolved eagerly.
pub(crate) struct ExportTable {
    pub(crate) capture: Capture,
    pub(crate) delete: DeleteFn,
    pub(crate) start: StartFn,
    pub(crate) stop: StopFn,
    pub(crate) set_debug_logging: SetDebugLoggingFn,
    pub(crate) get_is_recording: GetIsRecordingFn,
    pub(crate) get_selected_device: GetSelectedDeviceFn,
    pub(crate) get_available_devices: GetAvailableDevicesFn,
    pub(crate) free_available_devices: FreeAvailableDevicesFn,
    pub(crate) sample_rate: SampleRateFn,
    pub(crate) version: VersionFn,
}

unsafe fn load<F: Copy>(library: &dyn NativeLibrary, name: &str) -> Result<F, ProvisionError> {
    Ok(library.resolve(name)?.cast())
}

impl ExportTable {
    /// Resolve the whole table; the first missing export fails the load.
    fn resolve(library: &dyn NativeLibrary, mode: EngineMode) -> Result<Self, ProvisionError> {
        // SAFETY: each name is cast to the signature declared by the engine
        // header. The table is stored next to the library in `Engine`, which
        // keeps the library loaded for as long as the pointers exist.
        unsafe {
            let capture = match mode {
                EngineMode::Pull => Capture::Pull {
                    init: load(library, symbols::INIT)?,
                    read: load(library, symbols::READ)?,
                },
                EngineMode::Push => Capture::Push {
                    init: load(library, symbols::INIT)?,
                },
            };
            Ok(Self {
                capture,
                delete: load(library, symbols::DELETE)?,
                start: load(library, symbols::START)?,
                stop: load(library, symbols::STOP)?,
                set_debug_logging: load(library, symbols::SET_DEBUG_LOGGING)?,
                get_is_recording: load(library, symbols::GET_IS_RECORDING)?,
                get_selected_device: load(library, symbols::GET_SELECTED_DEVICE)?,
                get_available_devices: load(library, symbols::GET_AVAILABLE_DEVICES)?,
                free_available_devices: load(library, symbols::FREE_AVAILABLE_DEVICES)?,
                sample_rate: load(library, symbols::SAMPLE_RATE)?,
                version: load(library, symbols::VERSION)?,
            })
        }
    }
}

/// A loaded native engine with its resolved export table.
///
/// Read-only after construction; share it between sessions with `Arc`.
pub struct Engine {
    mode: EngineMode,
    table: ExportTable,
    version: String,
    sample_rate: i32,
    // Dropped last: the table points into this library.
    _library: Box<dyn NativeLibrary>,
}

impl Engine {
    /// Open the library at `path` and resolve every export.
    pub fn load(
        loader: &dyn LibraryLoader,
        path: &Path,
        mode: EngineMode,
    ) -> Result<Arc<Self>, ProvisionError> {
        let library = loader.open(path)?;
        let engine = Self::from_library(library, mode)?;
        info!(
            "Loaded native recorder {} from {} ({} Hz, {:?} mode)",
            engine.version,
            path.display(),
            engine.sample_rate,
            mode
        );
        Ok(engine)
    }

    pub fn from_library(
        library: Box<dyn NativeLibrary>,
        mode: EngineMode,
    ) -> Result<Arc<Self>, ProvisionError> {
        let table = ExportTable::resolve(library.as_ref(), mode)?;

        // SAFETY: both functions take no arguments; the version string is a
        // static owned by the library.
        let (version, sample_rate) = unsafe {
            let version = copy_c_str((table.version)(), "version string")
                .map_err(|_| ProvisionError::InvalidVersionString)?;
            (version, (table.sample_rate)())
        };

        Ok(Arc::new(Self {
            mode,
            table,
            version,
            sample_rate,
            _library: library,
        }))
    }

    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Sample rate of every delivered frame, in Hz.
    pub fn sample_rate(&self) -> i32 {
        self.sample_rate
    }

    pub(crate) fn table(&self) -> &ExportTable {
        &self.table
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("mode", &self.mode)
            .field("version", &self.version)
            .field("sample_rate", &self.sample_rate)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn caches_version_and_sample_rate() {
        let engine = testing::pull_engine();
        assert_eq!(engine.version(), "1.2.0");
        assert_eq!(engine.sample_rate(), 16000);
        assert_eq!(engine.mode(), EngineMode::Pull);
    }

    #[test]
    fn missing_export_fails_the_whole_load() {
        let loader = testing::pull_loader().without_symbol(symbols::FREE_AVAILABLE_DEVICES);
        let err = Engine::load(&loader, Path::new("libpv_recorder.so"), EngineMode::Pull).unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::MissingSymbol { ref name, .. } if name == symbols::FREE_AVAILABLE_DEVICES
        ));
    }

    #[test]
    fn push_mode_does_not_need_read() {
        let loader = testing::push_loader().without_symbol(symbols::READ);
        let engine = Engine::load(&loader, Path::new(""), EngineMode::Push).unwrap();
        assert_eq!(engine.mode(), EngineMode::Push);

        let loader = testing::pull_loader().without_symbol(symbols::READ);
        assert!(Engine::load(&loader, Path::new(""), EngineMode::Pull).is_err());
    }
}
