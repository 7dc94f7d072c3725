//! Error types for the version policy.

use std::path::PathBuf;

/// Errors that can stop a save plan from being computed.
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    /// The probing loop exhausted its bound without a free name. The
    /// policy surfaces this rather than ever risking an overwrite.
    #[error("no collision-free name for base {base_name:?} in {}", directory.display())]
    NoFreeName {
        /// Directory that was probed.
        directory: PathBuf,
        /// Base name the candidates were derived from.
        base_name: String,
    },

    /// The target directory listing could not be read. The policy never
    /// creates missing directories.
    #[error("directory listing failed: {0}")]
    Io(#[from] std::io::Error),
}
