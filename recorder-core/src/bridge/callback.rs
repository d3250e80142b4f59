//! Push-mode sessions: the engine calls back into Rust on its capture thread.
//!
//! The engine receives a fixed trampoline and a pointer to a heap-allocated
//! [`CallbackContext`]. The trampoline builds a bounded view over exactly
//! `frame_length` samples and hands it to the registered [`FrameHandler`]
//! directly. It never allocates or blocks; handlers that need to do heavier
//! work register a [`FrameQueue`] and drain it from their own thread.

use std::ffi::c_void;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, error, warn};
use parking_lot::Mutex;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::bridge::exports::{CRecorder, Capture, Engine};
use crate::bridge::marshal::{copy_c_str, frame_view};
use crate::models::config::{EngineMode, RecorderConfig};
use crate::models::error::{check_status, RecorderError};
use crate::models::state::SessionState;
use crate::traits::frame_handler::FrameHandler;

/// State shared with the trampoline through the engine's user-data pointer.
struct CallbackContext {
    handler: Arc<dyn FrameHandler>,
    frame_length: usize,
    delivered: AtomicU64,
    panicked: AtomicU64,
}

unsafe extern "C" fn trampoline(pcm: *const i16, user_data: *mut c_void) {
    if user_data.is_null() {
        return;
    }
    // SAFETY: `user_data` is the context registered at init, kept alive by
    // its session until after the native delete returns.
    let context = &*(user_data as *const CallbackContext);
    // SAFETY: the engine passes a frame of the length it was initialized with.
    let Some(frame) = frame_view(pcm, context.frame_length) else {
        return;
    };

    // Unwinding into the engine's thread would abort the process.
    match panic::catch_unwind(AssertUnwindSafe(|| context.handler.on_frame(frame))) {
        Ok(()) => {
            context.delivered.fetch_add(1, Ordering::Relaxed);
        }
        Err(_) => {
            context.panicked.fetch_add(1, Ordering::Relaxed);
            error!("Frame handler panicked; frame dropped");
        }
    }
}

/// Release a context created by `CallbackRecorder::init`.
///
/// # Safety
/// The engine must no longer be able to invoke the trampoline with it, and
/// it must not be released twice.
unsafe fn release_context(context: NonNull<CallbackContext>) {
    drop(Box::from_raw(context.as_ptr()));
}

/// A push-mode capture session.
///
/// The handler context outlives the native recorder: it is released only
/// after the native delete has returned. It is held as a raw allocation,
/// never as a `Box`, because the engine thread aliases it for the whole
/// life of the session.
pub struct CallbackRecorder {
    engine: Arc<Engine>,
    handle: NonNull<CRecorder>,
    state: SessionState,
    frame_length: usize,
    context: Option<NonNull<CallbackContext>>,
}

// SAFETY: see `Recorder`; the context is only shared with the engine thread
// through atomics and the `Sync` handler.
unsafe impl Send for CallbackRecorder {}

impl CallbackRecorder {
    /// Create a session delivering every frame to `handler`.
    ///
    /// `buffered_frames_count` is ignored; push engines have no read buffer.
    pub fn init(
        engine: Arc<Engine>,
        config: &RecorderConfig,
        handler: Arc<dyn FrameHandler>,
    ) -> Result<Self, RecorderError> {
        config.validate()?;

        let Capture::Push { init } = engine.table().capture else {
            return Err(RecorderError::ModeMismatch {
                loaded: engine.mode(),
                required: EngineMode::Push,
            });
        };

        let frame_length = config.frame_length as usize;
        let context = NonNull::from(Box::leak(Box::new(CallbackContext {
            handler,
            frame_length,
            delivered: AtomicU64::new(0),
            panicked: AtomicU64::new(0),
        })));
        let user_data = context.as_ptr().cast::<c_void>();

        let mut object = ptr::null_mut();
        // SAFETY: `user_data` stays valid for the life of the session; if
        // init fails the engine has not retained it.
        let raw = unsafe {
            init(
                config.device_index,
                config.frame_length,
                trampoline,
                user_data,
                &mut object,
            )
        };
        let handle = check_status("init", raw).and_then(|()| {
            NonNull::new(object).ok_or(RecorderError::NullPointer("recorder handle"))
        });
        let handle = match handle {
            Ok(handle) => handle,
            Err(e) => {
                // SAFETY: no recorder exists, so the engine kept no reference.
                unsafe { release_context(context) };
                return Err(e);
            }
        };

        let mut recorder = Self {
            engine,
            handle,
            state: SessionState::Initialized,
            frame_length,
            context: Some(context),
        };
        if config.debug_logging {
            recorder.set_debug_logging(true)?;
        }

        debug!(
            "Callback recorder initialized: frame_length={}, device_index={}",
            config.frame_length, config.device_index
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
        Ok(())
    }

    /// Stop capture. A callback already in flight may still complete.
    pub fn stop(&mut self) -> Result<(), RecorderError> {
        let handle = self.live_handle()?;
        // SAFETY: live handle owned by this session.
        let raw = unsafe { (self.engine.table().stop)(handle) };
        check_status("stop", raw)?;
        self.state = SessionState::Stopped;
        Ok(())
    }

    pub fn set_debug_logging(&mut self, enabled: bool) -> Result<(), RecorderError> {
        let handle = self.live_handle()?;
        // SAFETY: live handle owned by this session.
        unsafe { (self.engine.table().set_debug_logging)(handle, enabled) };
        Ok(())
    }

    pub fn is_recording(&self) -> bool {
        match self.live_handle() {
            // SAFETY: live handle owned by this session.
            Ok(handle) => unsafe { (self.engine.table().get_is_recording)(handle) },
            Err(_) => false,
        }
    }

    pub fn selected_device(&self) -> Result<String, RecorderError> {
        let handle = self.live_handle()?;
        // SAFETY: the string is owned by the live recorder object.
        unsafe { copy_c_str((self.engine.table().get_selected_device)(handle), "selected device") }
    }

    /// Release the native recorder, then the handler context.
    pub fn delete(&mut self) -> Result<(), RecorderError> {
        let handle = self.live_handle()?;
        // SAFETY: called at most once per handle.
        unsafe { (self.engine.table().delete)(handle) };
        self.state = SessionState::Deleted;
        if let Some(context) = self.context.take() {
            // SAFETY: the native delete has returned; the engine can no
            // longer invoke the trampoline.
            unsafe { release_context(context) };
        }
        debug!("Callback recorder deleted");
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn frame_length(&self) -> usize {
        self.frame_length
    }

    pub fn sample_rate(&self) -> i32 {
        self.engine.sample_rate()
    }

    pub fn version(&self) -> &str {
        self.engine.version()
    }

    fn context(&self) -> Option<&CallbackContext> {
        // SAFETY: the allocation lives until `delete` takes it; the engine
        // thread only reads it through shared references and atomics.
        self.context.map(|c| unsafe { &*c.as_ptr() })
    }

    /// Frames handed to the handler so far.
    pub fn delivered_frames(&self) -> u64 {
        self.context()
            .map_or(0, |c| c.delivered.load(Ordering::Relaxed))
    }

    /// Handler invocations that panicked.
    pub fn handler_panics(&self) -> u64 {
        self.context()
            .map_or(0, |c| c.panicked.load(Ordering::Relaxed))
    }
}

impl Drop for CallbackRecorder {
    fn drop(&mut self) {
        if !self.state.is_deleted() {
            let _ = self.delete();
        }
    }
}

/// Bounded handoff from the capture thread to a consumer thread.
///
/// Implements [`FrameHandler`] by copying each frame into a preallocated
/// lock-free ring. Frames that do not fit are dropped and counted rather
/// than waiting for the consumer.
pub struct FrameQueue {
    producer: Mutex<HeapProd<i16>>,
    frame_length: usize,
    dropped: AtomicU64,
}

/// Consumer half of a [`FrameQueue`].
pub struct FrameReceiver {
    consumer: HeapCons<i16>,
    queue: Arc<FrameQueue>,
    reported_dropped: u64,
}

/// Create a queue holding up to `capacity_frames` frames of `frame_length` samples.
///
/// Both sizes must be non-zero and the total must be allocatable.
pub fn frame_queue(
    frame_length: usize,
    capacity_frames: usize,
) -> Result<(Arc<FrameQueue>, FrameReceiver), RecorderError> {
    if frame_length == 0 || capacity_frames == 0 {
        return Err(RecorderError::InvalidConfig(format!(
            "frame queue needs a non-zero size, got frame_length={} capacity_frames={}",
            frame_length, capacity_frames
        )));
    }
    let samples = frame_length
        .checked_mul(capacity_frames)
        .filter(|n| n.checked_mul(mem::size_of::<i16>()).is_some_and(|b| b <= isize::MAX as usize))
        .ok_or_else(|| {
            RecorderError::InvalidConfig(format!(
                "frame queue of {} x {} samples is too large",
                capacity_frames, frame_length
            ))
        })?;

    let (producer, consumer) = HeapRb::<i16>::new(samples).split();
    let queue = Arc::new(FrameQueue {
        producer: Mutex::new(producer),
        frame_length,
        dropped: AtomicU64::new(0),
    });
    let receiver = FrameReceiver {
        consumer,
        queue: Arc::clone(&queue),
        reported_dropped: 0,
    };
    Ok((queue, receiver))
}

impl FrameQueue {
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl FrameHandler for FrameQueue {
    fn on_frame(&self, frame: &[i16]) {
        // Only the engine thread locks the producer, so this never contends.
        let Some(mut producer) = self.producer.try_lock() else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        };
        if frame.len() != self.frame_length || producer.vacant_len() < frame.len() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        producer.push_slice(frame);
    }
}

impl FrameReceiver {
    pub fn frame_length(&self) -> usize {
        self.queue.frame_length
    }

    /// Whole frames waiting to be popped.
    pub fn available_frames(&self) -> usize {
        self.consumer.occupied_len() / self.queue.frame_length
    }

    /// Pop the oldest frame into `out`, which must hold exactly `frame_length`
    /// samples. Returns `false` when no full frame is queued.
    pub fn pop_frame(&mut self, out: &mut [i16]) -> bool {
        self.report_drops();
        if out.len() != self.queue.frame_length || self.consumer.occupied_len() < out.len() {
            return false;
        }
        self.consumer.pop_slice(out) == out.len()
    }

    pub fn pop_vec(&mut self) -> Option<Vec<i16>> {
        let mut frame = vec![0; self.queue.frame_length];
        self.pop_frame(&mut frame).then_some(frame)
    }

    pub fn dropped_frames(&self) -> u64 {
        self.queue.dropped_frames()
    }

    fn report_drops(&mut self) {
        let dropped = self.queue.dropped_frames();
        if dropped > self.reported_dropped {
            warn!(
                "Frame queue full: dropped {} frames",
                dropped - self.reported_dropped
            );
            self.reported_dropped = dropped;
        }
    }
}
