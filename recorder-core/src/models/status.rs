use std::fmt;

/// Status codes returned by every native engine call.
///
/// Values are fixed by the engine's C ABI. Native functions are typed as
/// returning `i32` and converted with [`StatusCode::from_raw`], so an
/// out-of-range value from a mismatched binary never becomes an invalid enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum StatusCode {
    Success = 0,
    OutOfMemory = 1,
    InvalidArgument = 2,
    InvalidState = 3,
    BackendError = 4,
    DeviceAlreadyInitialized = 5,
    DeviceNotInitialized = 6,
    IoError = 7,
    RuntimeError = 8,
}

/// Broad failure class of a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad frame length, device index or buffer count.
    Configuration,
    /// Lifecycle-ordering bug in the caller.
    State,
    /// Out of memory.
    Resource,
    Backend,
    Io,
    Runtime,
}

impl ErrorKind {
    /// Whether the caller may retry (after fixing parameters or freeing memory).
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Configuration | Self::Resource)
    }
}

impl StatusCode {
    pub fn from_raw(raw: i32) -> Option<Self> {
        Some(match raw {
            0 => Self::Success,
            1 => Self::OutOfMemory,
            2 => Self::InvalidArgument,
            3 => Self::InvalidState,
            4 => Self::BackendError,
            5 => Self::DeviceAlreadyInitialized,
            6 => Self::DeviceNotInitialized,
            7 => Self::IoError,
            8 => Self::RuntimeError,
            _ => return None,
        })
    }

    pub fn as_raw(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    /// Failure class, or `None` for [`StatusCode::Success`].
    pub fn kind(self) -> Option<ErrorKind> {
        match self {
            Self::Success => None,
            Self::InvalidArgument => Some(ErrorKind::Configuration),
            Self::InvalidState | Self::DeviceAlreadyInitialized | Self::DeviceNotInitialized => {
                Some(ErrorKind::State)
            }
            Self::OutOfMemory => Some(ErrorKind::Resource),
            Self::BackendError => Some(ErrorKind::Backend),
            Self::IoError => Some(ErrorKind::Io),
            Self::RuntimeError => Some(ErrorKind::Runtime),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::OutOfMemory => "OUT_OF_MEMORY",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::InvalidState => "INVALID_STATE",
            Self::BackendError => "BACKEND_ERROR",
            Self::DeviceAlreadyInitialized => "DEVICE_ALREADY_INITIALIZED",
            Self::DeviceNotInitialized => "DEVICE_NOT_INITIALIZED",
            Self::IoError => "IO_ERROR",
            Self::RuntimeError => "RUNTIME_ERROR",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
