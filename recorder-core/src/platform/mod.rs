//! Maps the running OS and CPU to the bundled binary that must be loaded.

pub mod cpuinfo;

use std::path::Path;

use crate::models::descriptor::NativeAssetDescriptor;
use crate::models::error::ProvisionError;

pub const LIBRARY_STEM: &str = "libpv_recorder";

/// Read-only facts about the host, as reported by `std::env::consts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPlatform {
    pub os: String,
    pub arch: String,
}

impl HostPlatform {
    pub fn current() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    fn is_arm(&self) -> bool {
        matches!(self.arch.as_str(), "arm" | "aarch64")
    }

    /// Whether descriptor resolution needs a cpuinfo source.
    pub fn needs_cpu_info(&self) -> bool {
        self.os == "linux" && self.is_arm()
    }

    fn unsupported(&self) -> ProvisionError {
        ProvisionError::UnsupportedPlatform {
            os: self.os.clone(),
            arch: self.arch.clone(),
        }
    }
}

/// Resolve the descriptor for the running host, reading `/proc/cpuinfo` on
/// ARM Linux.
pub fn resolve_current() -> Result<NativeAssetDescriptor, ProvisionError> {
    let host = HostPlatform::current();
    let cpu_info = if host.needs_cpu_info() {
        Some(cpuinfo::read_cpu_info(Path::new(cpuinfo::CPU_INFO_PATH))?)
    } else {
        None
    };
    resolve(&host, cpu_info.as_deref())
}

/// Resolve the descriptor for `host`.
///
/// `cpu_info` is only consulted on ARM Linux, where it is required.
pub fn resolve(host: &HostPlatform, cpu_info: Option<&str>) -> Result<NativeAssetDescriptor, ProvisionError> {
    let (family, arch_tag, extension) = match host.os.as_str() {
        "macos" => {
            let arch = match host.arch.as_str() {
                "x86_64" => "x86_64",
                "aarch64" => "arm64",
                _ => return Err(host.unsupported()),
            };
            ("mac", arch.to_string(), "dylib")
        }
        "windows" => {
            let arch = match host.arch.as_str() {
                "x86_64" => "amd64",
                "aarch64" => "arm64",
                _ => return Err(host.unsupported()),
            };
            ("windows", arch.to_string(), "dll")
        }
        "linux" if host.arch == "x86_64" => ("linux", "x86_64".to_string(), "so"),
        "linux" if host.is_arm() => {
            let cpu_info = cpu_info.ok_or_else(|| {
                ProvisionError::UnsupportedCpu("cpu information unavailable".into())
            })?;
            let machine = cpuinfo::detect_machine(cpu_info)?;
            let tag = if host.arch == "aarch64" {
                format!("{}-aarch64", machine)
            } else {
                machine.to_string()
            };
            ("raspberry-pi", tag, "so")
        }
        _ => return Err(host.unsupported()),
    };

    Ok(NativeAssetDescriptor::new(
        family,
        arch_tag,
        format!("{}.{}", LIBRARY_STEM, extension),
    ))
}
