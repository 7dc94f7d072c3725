//! Versioning configuration.
//!
//! Deserializes from the application's settings file; every field has a
//! default so a missing section yields a working configuration.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Which intermediate snapshots to persist on save.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct Snapshots: u8 {
        /// Before overwriting in place, move the pre-edit file to an
        /// intermediate name so the last session's state survives.
        const AFTER_EACH_SESSION    = 1 << 0;
        /// Keep the state right after a raw-conversion step.
        const AFTER_RAW_CONVERSION  = 1 << 1;
        /// Keep the state after every step that cannot be replayed exactly.
        const WHEN_NOT_REPRODUCIBLE = 1 << 2;
    }
}

/// Settings the version policy consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSettings {
    /// Target format for saved versions.
    #[serde(default = "default_format")]
    pub format: String,
    /// Intermediate snapshot policies, independently combinable.
    #[serde(default)]
    pub save_intermediates: Snapshots,
    /// Formats the workspace can re-open losslessly, in addition to the
    /// built-in list and the configured target format.
    #[serde(default)]
    pub extra_workspace_formats: Vec<String>,
}

impl Default for VersionSettings {
    fn default() -> Self {
        Self {
            format: default_format(),
            save_intermediates: Snapshots::empty(),
            extra_workspace_formats: Vec::new(),
        }
    }
}

fn default_format() -> String {
    "JPG".to_string()
}

impl VersionSettings {
    /// The formats a loaded file may have and still be overwritten in
    /// place: the built-in workspace list, the configured target format,
    /// and any configured extras. Uppercase, duplicates removed,
    /// insertion order kept.
    #[must_use]
    pub fn workspace_file_formats(&self) -> Vec<String> {
        let mut formats: Vec<String> = ["JPG", "PNG", "TIFF", "PGF", "JP2"]
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut push_unique = |f: String| {
            if !formats.contains(&f) {
                formats.push(f);
            }
        };
        push_unique(self.format.to_uppercase());
        for extra in &self.extra_workspace_formats {
            push_unique(extra.to_uppercase());
        }
        formats
    }
}
