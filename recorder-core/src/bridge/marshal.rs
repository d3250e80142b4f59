//! Ownership rules at the FFI boundary.
//!
//! Sample frames are allocated by the caller and filled by the engine; the
//! engine never frees them. Device lists are allocated by the engine, copied
//! into owned strings here, and handed back to the engine's own free function
//! exactly once.

use std::ffi::{c_char, CStr};
use std::ptr;
use std::slice;

use crate::bridge::exports::{FreeAvailableDevicesFn, GetAvailableDevicesFn};
use crate::models::error::{check_status, RecorderError};

/// Caller-owned frame buffer passed to the engine's `read`.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    samples: Vec<i16>,
}

impl FrameBuffer {
    pub fn new(frame_length: usize) -> Self {
        Self {
            samples: vec![0; frame_length],
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn as_slice(&self) -> &[i16] {
        &self.samples
    }

    /// Pointer to exactly `len()` writable samples.
    pub fn as_mut_ptr(&mut self) -> *mut i16 {
        self.samples.as_mut_ptr()
    }
}

/// Read-only view over `len` samples owned by the engine.
///
/// # Safety
/// If non-null, `pcm` must point to at least `len` initialized samples that
/// stay valid and unmodified for `'a`.
pub unsafe fn frame_view<'a>(pcm: *const i16, len: usize) -> Option<&'a [i16]> {
    if pcm.is_null() {
        return None;
    }
    Some(slice::from_raw_parts(pcm, len))
}

/// Copy a NUL-terminated engine string into an owned `String`.
///
/// # Safety
/// If non-null, `ptr` must point to a NUL-terminated string that stays valid
/// for the duration of the call.
pub unsafe fn copy_c_str(ptr: *const c_char, what: &'static str) -> Result<String, RecorderError> {
    if ptr.is_null() {
        return Err(RecorderError::NullPointer(what));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(str::to_owned)
        .map_err(|_| RecorderError::InvalidString(what))
}

/// A device list allocated by the engine.
///
/// Released through the engine's free function when dropped, whether or not
/// copying its contents succeeded.
pub(crate) struct NativeDeviceList {
    count: i32,
    list: *mut *mut c_char,
    free: FreeAvailableDevicesFn,
}

impl NativeDeviceList {
    pub(crate) fn fetch(
        get: GetAvailableDevicesFn,
        free: FreeAvailableDevicesFn,
    ) -> Result<Self, RecorderError> {
        let mut count = 0;
        let mut list = ptr::null_mut();
        // SAFETY: both out-pointers reference live locals.
        let raw = unsafe { get(&mut count, &mut list) };
        check_status("get_available_devices", raw)?;
        Ok(Self { count, list, free })
    }

    /// Copy every name into caller-owned memory.
    pub(crate) fn to_names(&self) -> Result<Vec<String>, RecorderError> {
        if self.count <= 0 {
            return Ok(Vec::new());
        }
        if self.list.is_null() {
            return Err(RecorderError::NullPointer("device list"));
        }
        (0..self.count as usize)
            // SAFETY: the engine returned `count` string pointers at `list`,
            // valid until the free call in `drop`.
            .map(|i| unsafe { copy_c_str(*self.list.add(i), "device name") })
            .collect()
    }
}

impl Drop for NativeDeviceList {
    fn drop(&mut self) {
        if self.list.is_null() {
            return;
        }
        // SAFETY: `list` came from the matching get call and is freed once.
        unsafe { (self.free)(self.count, self.list) };
    }
}
