use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::status::{ErrorKind, StatusCode};

/// Fatal startup failures: there is no usable engine after any of these.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("unsupported platform: os={os}, arch={arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("unsupported CPU part: {0}")]
    UnsupportedCpu(String),

    #[error("failed to read CPU information: {0}")]
    CpuInfo(#[source] io::Error),

    #[error("no embedded asset at {0}")]
    AssetMissing(String),

    #[error("failed to read asset {path}: {source}")]
    AssetRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to extract {path}: {source}")]
    Extraction {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open native library {path}: {reason}")]
    LibraryOpen { path: PathBuf, reason: String },

    #[error("missing exported symbol `{name}`: {reason}")]
    MissingSymbol { name: String, reason: String },

    #[error("native library returned an invalid version string")]
    InvalidVersionString,
}

/// Errors surfaced by recorder sessions and device queries.
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("`{operation}` failed with {status}")]
    Status {
        operation: &'static str,
        status: StatusCode,
    },

    #[error("`{operation}` returned unknown status code {raw}")]
    UnknownStatus { operation: &'static str, raw: i32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("session has been deleted")]
    Deleted,

    #[error("engine was loaded in {loaded:?} mode, session requires {required:?}")]
    ModeMismatch {
        loaded: crate::models::config::EngineMode,
        required: crate::models::config::EngineMode,
    },

    #[error("native library returned a non UTF-8 {0}")]
    InvalidString(&'static str),

    #[error("native library returned a null {0}")]
    NullPointer(&'static str),

    #[error(transparent)]
    Provision(#[from] ProvisionError),
}

impl RecorderError {
    /// The native status this error corresponds to, if any.
    ///
    /// Configuration rejected before reaching the engine reports
    /// `INVALID_ARGUMENT`, the same code the engine itself would return.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::InvalidConfig(_) => Some(StatusCode::InvalidArgument),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Status { status, .. } => status.kind().unwrap_or(ErrorKind::Runtime),
            Self::InvalidConfig(_) => ErrorKind::Configuration,
            Self::Deleted | Self::ModeMismatch { .. } => ErrorKind::State,
            Self::UnknownStatus { .. }
            | Self::InvalidString(_)
            | Self::NullPointer(_)
            | Self::Provision(_) => ErrorKind::Runtime,
        }
    }
}

/// Convert a raw native status into a result at the call site.
pub fn check_status(operation: &'static str, raw: i32) -> Result<(), RecorderError> {
    match StatusCode::from_raw(raw) {
        Some(StatusCode::Success) => Ok(()),
        Some(status) => Err(RecorderError::Status { operation, status }),
        None => Err(RecorderError::UnknownStatus { operation, raw }),
    }
}
