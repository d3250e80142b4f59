//! CPU part detection for ARM Linux boards.

use std::fs;
use std::path::Path;

use crate::models::error::ProvisionError;

pub const CPU_INFO_PATH: &str = "/proc/cpuinfo";

/// Known single-board-computer cores, by `CPU part` identifier.
const KNOWN_PARTS: [(&str, &str); 4] = [
    ("0xb76", "arm11"),
    ("0xd03", "cortex-a53"),
    ("0xd08", "cortex-a72"),
    ("0xd0b", "cortex-a76"),
];

/// First `CPU part` value in a cpuinfo dump, lowercased.
pub fn parse_cpu_part(cpu_info: &str) -> Option<String> {
    cpu_info
        .lines()
        .filter(|line| line.contains("CPU part"))
        .find_map(|line| line.split_whitespace().last())
        .map(|part| part.to_lowercase())
}

/// Board tag for a `CPU part` identifier.
///
/// There is no generic fallback: a binary built for the wrong core crashes
/// or misbehaves silently.
pub fn machine_for_part(part: &str) -> Result<&'static str, ProvisionError> {
    KNOWN_PARTS
        .iter()
        .find(|(id, _)| *id == part)
        .map(|(_, machine)| *machine)
        .ok_or_else(|| ProvisionError::UnsupportedCpu(part.to_string()))
}

/// Detect the board tag from a cpuinfo source.
pub fn detect_machine(cpu_info: &str) -> Result<&'static str, ProvisionError> {
    let part = parse_cpu_part(cpu_info)
        .ok_or_else(|| ProvisionError::UnsupportedCpu("no `CPU part` entry".into()))?;
    machine_for_part(&part)
}

pub fn read_cpu_info(path: &Path) -> Result<String, ProvisionError> {
    fs::read_to_string(path).map_err(ProvisionError::CpuInfo)
}
