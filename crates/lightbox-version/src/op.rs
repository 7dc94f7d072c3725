//! The save plan handed to the I/O layer.
//!
//! A [`VersionFileOperation`] is produced fresh per save request and
//! consumed immediately; it owns no graph state and this subsystem never
//! performs the writes/moves/deletes it describes.

use std::collections::BTreeMap;
use std::path::PathBuf;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// What the I/O layer must do to execute the plan.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct Tasks: u8 {
        /// Write the result to a brand-new file.
        const NEW_FILE             = 1 << 0;
        /// Overwrite the loaded file in place.
        const REPLACE              = 1 << 1;
        /// Save under a new name, then delete the loaded file
        /// (in-place edit whose format changed).
        const SAVE_AND_DELETE      = 1 << 2;
        /// First move the existing on-disk file to
        /// `intermediate_for_loaded_file`.
        const MOVE_TO_INTERMEDIATE = 1 << 3;
        /// Additionally write the files listed in `intermediates`.
        const STORE_INTERMEDIATES  = 1 << 4;
    }
}

/// One file: directory, name, and format. Immutable value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VersionFileInfo {
    /// Directory the file lives in.
    pub path: PathBuf,
    /// File name including extension.
    pub file_name: String,
    /// Format tag as the codec layer understands it (`"JPG"`, `"RAW"`, …).
    pub format: String,
}

impl VersionFileInfo {
    /// Build an info value.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, file_name: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file_name: file_name.into(),
            format: format.into(),
        }
    }

    /// Full path of the file.
    #[must_use]
    pub fn file_path(&self) -> PathBuf {
        self.path.join(&self.file_name)
    }
}

/// The complete save plan for one request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VersionFileOperation {
    /// The file the editor has open.
    pub loaded_file: VersionFileInfo,
    /// Where the result goes.
    pub save_file: VersionFileInfo,
    /// What to do.
    pub tasks: Tasks,
    /// Intermediate name the loaded file moves to when
    /// [`Tasks::MOVE_TO_INTERMEDIATE`] is set.
    pub intermediate_for_loaded_file: Option<VersionFileInfo>,
    /// Snapshots to store, keyed by history step index, in step order.
    pub intermediates: BTreeMap<usize, VersionFileInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_path_joins_directory_and_name() {
        let info = VersionFileInfo::new("/photos", "IMG_0001.JPG", "JPG");
        assert_eq!(info.file_path(), PathBuf::from("/photos/IMG_0001.JPG"));
    }

    #[test]
    fn task_combinations_are_sets_not_integers() {
        let tasks = Tasks::REPLACE | Tasks::MOVE_TO_INTERMEDIATE | Tasks::STORE_INTERMEDIATES;
        assert!(tasks.contains(Tasks::REPLACE));
        assert!(!tasks.contains(Tasks::NEW_FILE));
        assert!(!tasks.contains(Tasks::SAVE_AND_DELETE));
    }

    #[test]
    fn operation_serde_round_trip() {
        let mut op = VersionFileOperation {
            loaded_file: VersionFileInfo::new("/p", "a.jpg", "JPG"),
            save_file: VersionFileInfo::new("/p", "a_v1.jpg", "JPG"),
            tasks: Tasks::NEW_FILE,
            intermediate_for_loaded_file: None,
            intermediates: BTreeMap::new(),
        };
        op.intermediates
            .insert(2, VersionFileInfo::new("/p", "a_v1-1.jpg", "JPG"));

        let json = serde_json::to_string(&op).expect("serialize");
        let back: VersionFileOperation = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, op);
    }
}
