use std::ptr::{self, NonNull};
use std::sync::Arc;

use log::debug;

use crate::bridge::exports::{CRecorder, Capture, Engine, ReadFn};
use crate::bridge::marshal::{copy_c_str, FrameBuffer};
use crate::models::config::{EngineMode, RecorderConfig};
use crate::models::error::{check_status, RecorderError};
use crate::models::state::SessionState;

/// A pull-mode capture session owning one native recorder handle.
///
/// Not `Clone`: the handle has exactly one owner, and the native delete runs
/// exactly once, either through [`Recorder::delete`] or on drop.
///
/// Start/stop ordering is not checked here; the engine reports
/// `INVALID_STATE` itself. Only use after delete is refused locally.
pub struct Recorder {
    engine: Arc<Engine>,
    handle: NonNull<CRecorder>,
    read_fn: ReadFn,
    frame: FrameBuffer,
    state: SessionState,
}

// SAFETY: the handle is exclusively owned and every call that uses it goes
// through `&self`/`&mut self`, so it is never used from two threads at once
// (`Recorder` is not `Sync`).
unsafe impl Send for Recorder {}

impl Recorder {
    /// Create a session. On failure no handle exists and nothing needs releasing.
    pub fn init(engine: Arc<Engine>, config: &RecorderConfig) -> Result<Self, RecorderError> {
        config.validate()?;

        let Capture::Pull { init, read } = engine.table().capture else {
            return Err(RecorderError::ModeMismatch {
                loaded: engine.mode(),
                required: EngineMode::Pull,
            });
        };

        let mut object = ptr::null_mut();
        // SAFETY: `object` is a live out-pointer; arguments were validated.
        let raw = unsafe {
            init(
                config.frame_length,
                config.device_index,
                config.buffered_frames_count,
                &mut object,
            )
        };
        check_status("init", raw)?;
        let handle = NonNull::new(object).ok_or(RecorderError::NullPointer("recorder handle"))?;

        let mut recorder = Self {
            engine,
            handle,
            read_fn: read,
            frame: FrameBuffer::new(config.frame_length as usize),
            state: SessionState::Initialized,
        };
        if config.debug_logging {
            recorder.set_debug_logging(true)?;
        }

        debug!(
            "Recorder initialized: frame_length={}, device_index={}, buffered_frames={}",
            config.frame_length, config.device_index, config.buffered_frames_count
        );
        Ok(recorder)
    }

    fn live_handle(&self) -> Result<*mut CRecorder, RecorderError> {
        if self.state.is_deleted() {
            return Err(RecorderError::Deleted);
        }
        Ok(self.handle.as_ptr())
    }

    pub fn start(&mut self) -> Result<(), RecorderError> {
        let handle = self.live_handle()?;
        // SAFETY: live handle owned by this session.
        let raw = unsafe { (self.engine.table().start)(handle) };
        check_status("start", raw)?;
        self.state = SessionState::Recording;
        debug!("Recorder started");
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), RecorderError> {
        let handle = self.live_handle()?;
        // SAFETY: live handle owned by this session.
        let raw = unsafe { (self.engine.table().stop)(handle) };
        check_status("stop", raw)?;
        self.state = SessionState::Stopped;
        debug!("Recorder stopped");
        Ok(())
    }

    /// Read one frame into the session's buffer and return a view of it.
    ///
    /// May block until a full frame is available. Whether reading outside
    /// `Recording` is allowed is up to the engine.
    pub fn read(&mut self) -> Result<&[i16], RecorderError> {
        let handle = self.live_handle()?;
        // SAFETY: the buffer holds exactly `frame_length` samples, the size
        // the engine was initialized with.
        let raw = unsafe { (self.read_fn)(handle, self.frame.as_mut_ptr()) };
        check_status("read", raw)?;
        Ok(self.frame.as_slice())
    }

    /// Read one frame into `out`, which must hold exactly `frame_length` samples.
    pub fn read_into(&mut self, out: &mut [i16]) -> Result<(), RecorderError> {
        if out.len() != self.frame.len() {
            return Err(RecorderError::InvalidConfig(format!(
                "read buffer holds {} samples, frame_length is {}",
                out.len(),
                self.frame.len()
            )));
        }
        let handle = self.live_handle()?;
        // SAFETY: `out` holds exactly `frame_length` samples.
        let raw = unsafe { (self.read_fn)(handle, out.as_mut_ptr()) };
        check_status("read", raw)
    }

    /// Read one frame into a new vector.
    pub fn read_vec(&mut self) -> Result<Vec<i16>, RecorderError> {
        self.read().map(<[i16]>::to_vec)
    }

    pub fn set_debug_logging(&mut self, enabled: bool) -> Result<(), RecorderError> {
        let handle = self.live_handle()?;
        // SAFETY: live handle owned by this session.
        unsafe { (self.engine.table().set_debug_logging)(handle, enabled) };
        Ok(())
    }

    /// Engine-reported recording flag; `false` once deleted.
    pub fn is_recording(&self) -> bool {
        match self.live_handle() {
            // SAFETY: live handle owned by this session.
            Ok(handle) => unsafe { (self.engine.table().get_is_recording)(handle) },
            Err(_) => false,
        }
    }

    /// Name of the device this session captures from.
    pub fn selected_device(&self) -> Result<String, RecorderError> {
        let handle = self.live_handle()?;
        // SAFETY: the returned string is owned by the recorder object, which
        // outlives this call.
        unsafe { copy_c_str((self.engine.table().get_selected_device)(handle), "selected device") }
    }

    /// Release the native recorder.
    ///
    /// Stop the session and let in-flight reads return first. A second call
    /// returns [`RecorderError::Deleted`] without touching the engine.
    pub fn delete(&mut self) -> Result<(), RecorderError> {
        let handle = self.live_handle()?;
        // SAFETY: called at most once per handle; the state flips below.
        unsafe { (self.engine.table().delete)(handle) };
        self.state = SessionState::Deleted;
        debug!("Recorder deleted");
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn frame_length(&self) -> usize {
        self.frame.len()
    }

    pub fn sample_rate(&self) -> i32 {
        self.engine.sample_rate()
    }

    pub fn version(&self) -> &str {
        self.engine.version()
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    #[cfg(test)]
    pub(crate) fn raw_handle(&self) -> *mut CRecorder {
        self.handle.as_ptr()
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if !self.state.is_deleted() {
            let _ = self.delete();
        }
    }
}
