use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::RecorderError;

pub const DEFAULT_FRAME_LENGTH: i32 = 512;
pub const DEFAULT_DEVICE_INDEX: i32 = -1;
pub const DEFAULT_BUFFERED_FRAMES_COUNT: i32 = 50;
pub const DEFAULT_PRODUCT_NAME: &str = "pvrecorder";

/// How the native engine delivers frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineMode {
    /// Caller polls frames with `read`.
    #[default]
    Pull,
    /// Engine invokes a registered callback on its capture thread.
    Push,
}

/// Configuration for a capture session.
///
/// Integer widths match the engine ABI (`int32_t`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Samples per read/callback. Must be > 0.
    pub frame_length: i32,

    /// Capture device index, or -1 for the system default.
    pub device_index: i32,

    /// Size of the engine's internal buffer, in frames. Must be > 0.
    /// Ignored by push-mode engines.
    pub buffered_frames_count: i32,

    /// Enable the engine's overflow/silence diagnostics.
    pub debug_logging: bool,
}

impl RecorderConfig {
    pub fn new(frame_length: i32) -> Self {
        Self {
            frame_length,
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, RecorderError> {
        serde_json::from_str(json)
            .map_err(|e| RecorderError::InvalidConfig(format!("failed to parse config: {}", e)))
    }

    pub fn validate(&self) -> Result<(), RecorderError> {
        if self.frame_length <= 0 {
            return Err(RecorderError::InvalidConfig(format!(
                "frame_length must be greater than zero, got {}",
                self.frame_length
            )));
        }
        if self.device_index < -1 {
            return Err(RecorderError::InvalidConfig(format!(
                "device_index must be -1 or a device index, got {}",
                self.device_index
            )));
        }
        if self.buffered_frames_count <= 0 {
            return Err(RecorderError::InvalidConfig(format!(
                "buffered_frames_count must be greater than zero, got {}",
                self.buffered_frames_count
            )));
        }
        Ok(())
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            frame_length: DEFAULT_FRAME_LENGTH,
            device_index: DEFAULT_DEVICE_INDEX,
            buffered_frames_count: DEFAULT_BUFFERED_FRAMES_COUNT,
            debug_logging: false,
        }
    }
}

/// Where and how the native engine is provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Directory name under the cache root.
    pub product_name: String,

    /// Cache root; the OS temp directory when unset.
    pub cache_root: Option<PathBuf>,

    pub mode: EngineMode,
}

impl ProvisionConfig {
    pub fn from_json(json: &str) -> Result<Self, RecorderError> {
        serde_json::from_str(json)
            .map_err(|e| RecorderError::InvalidConfig(format!("failed to parse config: {}", e)))
    }

    /// `<cache_root>/<product_name>`
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
            .join(&self.product_name)
    }
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            product_name: DEFAULT_PRODUCT_NAME.to_string(),
            cache_root: None,
            mode: EngineMode::Pull,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RecorderConfig::default();
        assert_eq!(config.frame_length, 512);
        assert_eq!(config.device_index, -1);
        assert_eq!(config.buffered_frames_count, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        assert!(RecorderConfig::new(0).validate().is_err());
        assert!(RecorderConfig::new(-5).validate().is_err());

        let config = RecorderConfig {
            device_index: -2,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = RecorderConfig {
            buffered_frames_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = RecorderConfig::from_json(r#"{ "frame_length": 256, "debug_logging": true }"#).unwrap();
        assert_eq!(config.frame_length, 256);
        assert_eq!(config.device_index, -1);
        assert!(config.debug_logging);

        assert!(RecorderConfig::from_json("{ not json").is_err());
    }

    #[test]
    fn provision_cache_dir_appends_product_name() {
        let config = ProvisionConfig::from_json(r#"{ "cache_root": "/var/cache", "mode": "push" }"#).unwrap();
        assert_eq!(config.cache_dir(), PathBuf::from("/var/cache/pvrecorder"));
        assert_eq!(config.mode, EngineMode::Push);

        let config = ProvisionConfig::default();
        assert_eq!(config.cache_dir(), std::env::temp_dir().join("pvrecorder"));
    }
}
