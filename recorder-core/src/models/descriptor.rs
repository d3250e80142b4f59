use std::fmt;
use std::path::PathBuf;

/// Root of the bundled library tree.
pub const LIBRARY_ROOT: &str = "lib";

/// Identifies which bundled native binary to extract.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NativeAssetDescriptor {
    /// `mac`, `linux`, `windows` or `raspberry-pi`.
    pub os_family: String,
    /// ISA tag, optionally suffixed with a CPU model. Empty for single-binary families.
    pub arch_tag: String,
    pub file_name: String,
}

impl NativeAssetDescriptor {
    pub fn new(os_family: impl Into<String>, arch_tag: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            os_family: os_family.into(),
            arch_tag: arch_tag.into(),
            file_name: file_name.into(),
        }
    }

    /// `lib/<os-family>/<arch-tag>/<file>`, with `/` separators on every OS.
    pub fn relative_path(&self) -> String {
        if self.arch_tag.is_empty() {
            format!("{}/{}/{}", LIBRARY_ROOT, self.os_family, self.file_name)
        } else {
            format!(
                "{}/{}/{}/{}",
                LIBRARY_ROOT, self.os_family, self.arch_tag, self.file_name
            )
        }
    }

    /// The relative path as a native filesystem path.
    pub fn relative_fs_path(&self) -> PathBuf {
        self.relative_path().split('/').collect()
    }
}

impl fmt::Display for NativeAssetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative_path())
    }
}
