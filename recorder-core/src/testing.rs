//! In-process fake of the native recorder engine, registered through
//! `StaticLoader`. Mirrors the engine's state machine, device registry and
//! status codes closely enough to drive the bridge end to end.

use std::ffi::{c_char, c_void, CStr, CString};
use std::path::Path;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use crate::bridge::exports::{
    symbols, CRecorder, DeleteFn, Engine, FrameCallbackFn, FreeAvailableDevicesFn,
    GetAvailableDevicesFn, GetIsRecordingFn, GetSelectedDeviceFn, InitFn, PushInitFn, ReadFn,
    SampleRateFn, SetDebugLoggingFn, StartFn, StopFn, VersionFn,
};
use crate::bridge::session::Recorder;
use crate::loader::StaticLoader;
use crate::models::config::EngineMode;

pub const DEVICE_COUNT: usize = 8;

static DEVICES: [&CStr; DEVICE_COUNT] = [
    c"Built-in Microphone",
    c"USB Audio Interface",
    c"Headset Microphone",
    c"Line In",
    c"Loopback 1",
    c"Loopback 2",
    c"Virtual Cable",
    c"Webcam Microphone",
];

static CLAIMED: Mutex<[bool; DEVICE_COUNT]> = parking_lot::const_mutex([false; DEVICE_COUNT]);

const SUCCESS: i32 = 0;
const INVALID_ARGUMENT: i32 = 2;
const INVALID_STATE: i32 = 3;
const BACKEND_ERROR: i32 = 4;
const DEVICE_ALREADY_INITIALIZED: i32 = 5;

#[derive(Clone, Copy)]
struct Emitter {
    callback: FrameCallbackFn,
    user_data: *mut c_void,
}

// SAFETY: the bridge guarantees `user_data` is valid on any thread until delete returns.
unsafe impl Send for Emitter {}

struct FakeRecorder {
    frame_length: usize,
    device: Option<usize>,
    selected: &'static CStr,
    recording: bool,
    debug_logging: bool,
    next_sample: i16,
    emitter: Option<Emitter>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl FakeRecorder {
    fn halt(&mut self) {
        self.recording = false;
        self.running.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

unsafe fn fake<'a>(object: *mut CRecorder) -> &'a mut FakeRecorder {
    &mut *object.cast::<FakeRecorder>()
}

unsafe fn create(
    frame_length: i32,
    device_index: i32,
    buffered_frames_count: i32,
    emitter: Option<Emitter>,
    object: *mut *mut CRecorder,
) -> i32 {
    if object.is_null()
        || frame_length <= 0
        || buffered_frames_count <= 0
        || device_index < -1
        || device_index >= DEVICE_COUNT as i32
    {
        return INVALID_ARGUMENT;
    }

    let device = (device_index >= 0).then_some(device_index as usize);
    if let Some(index) = device {
        let mut claimed = CLAIMED.lock();
        if claimed[index] {
            return DEVICE_ALREADY_INITIALIZED;
        }
        claimed[index] = true;
    }

    let recorder = Box::new(FakeRecorder {
        frame_length: frame_length as usize,
        device,
        selected: DEVICES[device.unwrap_or(0)],
        recording: false,
        debug_logging: false,
        next_sample: 0,
        emitter,
        running: Arc::new(AtomicBool::new(false)),
        worker: None,
    });
    *object = Box::into_raw(recorder).cast();
    SUCCESS
}

unsafe extern "C" fn fake_init(
    frame_length: i32,
    device_index: i32,
    buffered_frames_count: i32,
    object: *mut *mut CRecorder,
) -> i32 {
    create(frame_length, device_index, buffered_frames_count, None, object)
}

unsafe extern "C" fn fake_push_init(
    device_index: i32,
    frame_length: i32,
    callback: FrameCallbackFn,
    user_data: *mut c_void,
    object: *mut *mut CRecorder,
) -> i32 {
    create(frame_length, device_index, 1, Some(Emitter { callback, user_data }), object)
}

unsafe extern "C" fn fake_delete(object: *mut CRecorder) {
    if object.is_null() {
        return;
    }
    let mut recorder = Box::from_raw(object.cast::<FakeRecorder>());
    recorder.halt();
    if let Some(index) = recorder.device {
        CLAIMED.lock()[index] = false;
    }
}

fn emit(emitter: Emitter, frame_length: usize, running: Arc<AtomicBool>) {
    let mut frame = vec![0i16; frame_length];
    let mut next: i16 = 0;
    while running.load(Ordering::Acquire) {
        for sample in frame.iter_mut() {
            *sample = next;
            next = next.wrapping_add(1);
        }
        unsafe { (emitter.callback)(frame.as_ptr(), emitter.user_data) };
        thread::sleep(Duration::from_millis(1));
    }
}

unsafe extern "C" fn fake_start(object: *mut CRecorder) -> i32 {
    let recorder = fake(object);
    if recorder.recording {
        return INVALID_STATE;
    }
    recorder.recording = true;
    if let Some(emitter) = recorder.emitter {
        let running = Arc::clone(&recorder.running);
        running.store(true, Ordering::Release);
        let frame_length = recorder.frame_length;
        recorder.worker = Some(thread::spawn(move || emit(emitter, frame_length, running)));
    }
    SUCCESS
}

unsafe extern "C" fn fake_stop(object: *mut CRecorder) -> i32 {
    let recorder = fake(object);
    if !recorder.recording {
        return INVALID_STATE;
    }
    recorder.halt();
    SUCCESS
}

unsafe extern "C" fn fake_read(object: *mut CRecorder, pcm: *mut i16) -> i32 {
    let recorder = fake(object);
    if !recorder.recording || pcm.is_null() {
        return INVALID_STATE;
    }
    for i in 0..recorder.frame_length {
        *pcm.add(i) = recorder.next_sample;
        recorder.next_sample = recorder.next_sample.wrapping_add(1);
    }
    SUCCESS
}

unsafe extern "C" fn fake_set_debug_logging(object: *mut CRecorder, enabled: bool) {
    fake(object).debug_logging = enabled;
}

unsafe extern "C" fn fake_get_is_recording(object: *mut CRecorder) -> bool {
    fake(object).recording
}

unsafe extern "C" fn fake_get_selected_device(object: *mut CRecorder) -> *const c_char {
    fake(object).selected.as_ptr()
}

unsafe fn allocate_list(names: &[&CStr], count: *mut i32, list: *mut *mut *mut c_char) {
    let owned: Box<[*mut c_char]> = names.iter().map(|n| CString::from(*n).into_raw()).collect();
    *count = owned.len() as i32;
    *list = Box::into_raw(owned).cast::<*mut c_char>();
}

unsafe extern "C" fn fake_get_available_devices(count: *mut i32, list: *mut *mut *mut c_char) -> i32 {
    allocate_list(&DEVICES, count, list);
    SUCCESS
}

unsafe extern "C" fn fake_free_available_devices(count: i32, list: *mut *mut c_char) {
    if list.is_null() {
        return;
    }
    let names = Box::from_raw(ptr::slice_from_raw_parts_mut(list, count as usize));
    for name in names.iter() {
        drop(CString::from_raw(*name));
    }
}

static COUNTING_ALLOCATED: AtomicUsize = AtomicUsize::new(0);
static COUNTING_FREED: AtomicUsize = AtomicUsize::new(0);

unsafe extern "C" fn counting_get_devices(count: *mut i32, list: *mut *mut *mut c_char) -> i32 {
    allocate_list(&[c"Counting Mic"], count, list);
    COUNTING_ALLOCATED.fetch_add(1, Ordering::SeqCst);
    SUCCESS
}

unsafe extern "C" fn counting_free_devices(count: i32, list: *mut *mut c_char) {
    fake_free_available_devices(count, list);
    COUNTING_FREED.fetch_add(1, Ordering::SeqCst);
}

unsafe extern "C" fn empty_get_devices(count: *mut i32, list: *mut *mut *mut c_char) -> i32 {
    *count = 0;
    *list = ptr::null_mut();
    SUCCESS
}

unsafe extern "C" fn failing_get_devices(_count: *mut i32, _list: *mut *mut *mut c_char) -> i32 {
    BACKEND_ERROR
}

unsafe extern "C" fn fake_sample_rate() -> i32 {
    16000
}

unsafe extern "C" fn fake_version() -> *const c_char {
    c"1.2.0".as_ptr()
}

pub fn counting_get_devices_addr() -> *const c_void {
    counting_get_devices as GetAvailableDevicesFn as *const c_void
}

pub fn counting_free_devices_addr() -> *const c_void {
    counting_free_devices as FreeAvailableDevicesFn as *const c_void
}

/// `(allocated, freed)` lists from the counting device functions.
pub fn counting_device_lists() -> (usize, usize) {
    (
        COUNTING_ALLOCATED.load(Ordering::SeqCst),
        COUNTING_FREED.load(Ordering::SeqCst),
    )
}

pub fn empty_get_devices_addr() -> *const c_void {
    empty_get_devices as GetAvailableDevicesFn as *const c_void
}

pub fn failing_get_devices_addr() -> *const c_void {
    failing_get_devices as GetAvailableDevicesFn as *const c_void
}

fn common_loader() -> StaticLoader {
    StaticLoader::new()
        .with_symbol(symbols::DELETE, fake_delete as DeleteFn as *const c_void)
        .with_symbol(symbols::START, fake_start as StartFn as *const c_void)
        .with_symbol(symbols::STOP, fake_stop as StopFn as *const c_void)
        .with_symbol(
            symbols::SET_DEBUG_LOGGING,
            fake_set_debug_logging as SetDebugLoggingFn as *const c_void,
        )
        .with_symbol(
            symbols::GET_IS_RECORDING,
            fake_get_is_recording as GetIsRecordingFn as *const c_void,
        )
        .with_symbol(
            symbols::GET_SELECTED_DEVICE,
            fake_get_selected_device as GetSelectedDeviceFn as *const c_void,
        )
        .with_symbol(
            symbols::GET_AVAILABLE_DEVICES,
            fake_get_available_devices as GetAvailableDevicesFn as *const c_void,
        )
        .with_symbol(
            symbols::FREE_AVAILABLE_DEVICES,
            fake_free_available_devices as FreeAvailableDevicesFn as *const c_void,
        )
        .with_symbol(symbols::SAMPLE_RATE, fake_sample_rate as SampleRateFn as *const c_void)
        .with_symbol(symbols::VERSION, fake_version as VersionFn as *const c_void)
}

pub fn pull_loader() -> StaticLoader {
    common_loader()
        .with_symbol(symbols::INIT, fake_init as InitFn as *const c_void)
        .with_symbol(symbols::READ, fake_read as ReadFn as *const c_void)
}

pub fn push_loader() -> StaticLoader {
    common_loader().with_symbol(symbols::INIT, fake_push_init as PushInitFn as *const c_void)
}

pub fn pull_engine() -> Arc<Engine> {
    static ENGINE: OnceLock<Arc<Engine>> = OnceLock::new();
    ENGINE
        .get_or_init(|| {
            Engine::load(&pull_loader(), Path::new("libpv_recorder.so"), EngineMode::Pull)
                .expect("fake pull engine loads")
        })
        .clone()
}

pub fn push_engine() -> Arc<Engine> {
    static ENGINE: OnceLock<Arc<Engine>> = OnceLock::new();
    ENGINE
        .get_or_init(|| {
            Engine::load(&push_loader(), Path::new("libpv_recorder.so"), EngineMode::Push)
                .expect("fake push engine loads")
        })
        .clone()
}

/// Debug-logging flag as seen by the fake engine.
pub fn debug_logging(recorder: &Recorder) -> bool {
    unsafe { fake(recorder.raw_handle()).debug_logging }
}
