//! The per-request decision policy.
//!
//! One [`VersionNameCreator`] serves exactly one save request and is driven
//! through a fixed sequence by [`crate::manager::VersionManager`]:
//! need-check (or fork) → directory → format → file name → operation →
//! intermediates. The sequence is not reentrant; a new request gets a new
//! creator.
//!
//! # Hard guarantees
//!
//! - A produced filename never already exists on disk: every candidate is
//!   checked against a directory listing read fresh at the start of the
//!   probe loop, and the loop surfaces [`VersionError::NoFreeName`] rather
//!   than ever falling through to an existing name.
//! - The decision is deterministic given histories, settings, and the
//!   directory listing.
//!
//! The directory listing is the only I/O: a read-only scan, bounded by the
//! entry count + 1 (a version number cannot need more probes than there are
//! files).

use std::fs;
use std::path::{Path, PathBuf};

use lightbox_history::{EditHistory, FilterRegistry, Roles};
use tracing::{debug, warn};

use crate::error::VersionError;
use crate::naming::VersionNamingScheme;
use crate::op::{Tasks, VersionFileInfo, VersionFileOperation};
use crate::settings::{Snapshots, VersionSettings};

pub(crate) struct VersionNameCreator<'a> {
    settings: &'a VersionSettings,
    scheme: &'a dyn VersionNamingScheme,
    registry: &'a FilterRegistry,

    loaded_file: VersionFileInfo,
    resolved_initial_history: &'a EditHistory,
    current_history: &'a EditHistory,

    from_raw: bool,
    new_version: bool,

    version: u32,
    intermediate_counter: u32,
    base_name: String,
    intermediate_path: PathBuf,

    result: VersionFileInfo,
    operation: VersionFileOperation,
}

impl<'a> VersionNameCreator<'a> {
    pub(crate) fn new(
        settings: &'a VersionSettings,
        scheme: &'a dyn VersionNamingScheme,
        registry: &'a FilterRegistry,
        loaded_file: &VersionFileInfo,
        resolved_initial_history: &'a EditHistory,
        current_history: &'a EditHistory,
    ) -> Self {
        let mut loaded_file = loaded_file.clone();
        loaded_file.format = loaded_file.format.to_uppercase();
        // Accept both plain "RAW" and vendor-specific "RAW-..." tags.
        let from_raw = loaded_file.format.starts_with("RAW");

        Self {
            settings,
            scheme,
            registry,
            loaded_file,
            resolved_initial_history,
            current_history,
            from_raw,
            new_version: false,
            version: scheme.initial_counter(),
            intermediate_counter: scheme.initial_counter(),
            base_name: String::new(),
            intermediate_path: PathBuf::new(),
            result: VersionFileInfo::default(),
            operation: VersionFileOperation::default(),
        }
    }

    /// Decide whether this save forks a new version or may overwrite in
    /// place. The loaded file itself carries the `Current` role; what
    /// matters is whether the resolved initial history refers to anything
    /// worth branching from.
    pub(crate) fn check_need_new_version(&mut self) {
        let has_branch_point = self
            .resolved_initial_history
            .has_referred_of_role(Roles::ORIGINAL | Roles::INTERMEDIATE);
        let workspace = self
            .settings
            .workspace_file_formats()
            .contains(&self.loaded_file.format);

        debug!(
            has_branch_point,
            from_raw = self.from_raw,
            workspace,
            "need-new-version check"
        );

        self.new_version = !has_branch_point || self.from_raw || !workspace;
    }

    /// Unconditionally fork a new version ("Save As New Version").
    pub(crate) fn fork(&mut self) {
        self.new_version = true;
    }

    pub(crate) fn set_save_directory(&mut self) {
        self.result.path = self
            .scheme
            .directory(&self.loaded_file.path, &self.loaded_file.file_name);
        self.intermediate_path = self.result.path.clone();
    }

    pub(crate) fn set_save_directory_to(&mut self, path: &Path) {
        self.result.path = path.to_path_buf();
        self.intermediate_path = path.to_path_buf();
    }

    pub(crate) fn set_save_format(&mut self) {
        self.result.format = self.settings.format.to_uppercase();
    }

    pub(crate) fn set_save_format_to(&mut self, format: &str) {
        self.result.format = format.to_uppercase();
    }

    /// Compute the target file name.
    ///
    /// In-place saves reuse the loaded name (re-suffixed only when the
    /// format changed). New versions probe the target directory for the
    /// first collision-free versioned name.
    pub(crate) fn set_save_file_name(&mut self) -> Result<(), VersionError> {
        debug!(new_version = self.new_version, "computing save file name");

        self.base_name = self.scheme.base_name(
            &self.loaded_file.path,
            &self.loaded_file.file_name,
            &mut self.version,
            &mut self.intermediate_counter,
        );

        debug!(
            file = %self.loaded_file.file_name,
            base = %self.base_name,
            version = self.version,
            intermediate = self.intermediate_counter,
            "analyzed loaded file name"
        );

        // Keep the user's own TIFF/JPEG suffix spelling: a loaded `.tif`
        // stays `TIF` when saving TIFF, a loaded `.jpeg` stays `JPEG` when
        // saving JPG.
        if let Some(dot) = self.loaded_file.file_name.rfind('.') {
            let suffix = self.loaded_file.file_name[dot + 1..].to_uppercase();
            let tif = self.result.format == "TIFF";
            let jpg = self.result.format == "JPG";
            if (suffix == "TIF" && tif) || (suffix == "JPEG" && jpg) {
                self.result.format = suffix;
            }
        }

        if self.new_version {
            self.probe_version_name()
        } else {
            self.result.file_name = self.loaded_file.file_name.clone();
            if self.loaded_file.format != self.result.format {
                set_file_suffix(&mut self.result.file_name, &self.result.format);
            }
            Ok(())
        }
    }

    /// Explicit target name ("Save As"): taken verbatim, no probing.
    pub(crate) fn set_save_file_name_to(&mut self, file_name: &str) {
        self.result.file_name = file_name.to_string();
        self.base_name = match file_name.find('.') {
            Some(dot) => file_name[..dot].to_string(),
            None => file_name.to_string(),
        };
        // The version number stays unknown.
    }

    pub(crate) fn init_operation(&mut self) {
        self.operation.loaded_file = self.loaded_file.clone();
        self.operation.save_file = self.result.clone();

        if self.new_version {
            self.operation.tasks |= Tasks::NEW_FILE;
        } else if self.result.file_name == self.loaded_file.file_name {
            self.operation.tasks |= Tasks::REPLACE;
        } else {
            self.operation.tasks |= Tasks::SAVE_AND_DELETE;
        }
    }

    /// Apply the three additive snapshot policies. Call after the task set
    /// has been determined.
    pub(crate) fn check_intermediates(&mut self) -> Result<(), VersionError> {
        debug!(
            replace = self.operation.tasks.contains(Tasks::REPLACE),
            policies = ?self.settings.save_intermediates,
            "checking intermediates"
        );

        if self
            .settings
            .save_intermediates
            .contains(Snapshots::AFTER_EACH_SESSION)
            && self.operation.tasks.contains(Tasks::REPLACE)
        {
            // The main file is about to be overwritten; treat the on-disk
            // state as the last session's snapshot and move it aside first.
            self.operation.tasks |= Tasks::MOVE_TO_INTERMEDIATE;
            let format = self.loaded_file.format.clone();
            self.operation.intermediate_for_loaded_file = Some(self.next_intermediate(&format)?);
        }

        // The states we may have to store lie strictly between the loaded
        // file (last entry of the resolved initial history) and the current
        // result (last entry of the current history).
        let mut first_step = self.resolved_initial_history.len();
        let last_step = match self.current_history.len().checked_sub(2) {
            Some(last) => last,
            None => return Ok(()),
        };

        debug!(
            initial = self.resolved_initial_history.len(),
            current = self.current_history.len(),
            first_step,
            last_step,
            "intermediate step range"
        );

        if last_step < first_step {
            // A single editing step, or history went backwards via redo.
            return Ok(());
        }

        if first_step == 0 {
            warn!("resolved initial history has no entries; clamping range start to 1");
            first_step = 1;
        }

        if self
            .settings
            .save_intermediates
            .contains(Snapshots::AFTER_RAW_CONVERSION)
        {
            let mut raw_step = None;
            for step in first_step..=last_step {
                if let Some(action) = self.current_history.action(step) {
                    if self.registry.is_raw_conversion(&action.identifier) {
                        // Last one wins should the history somehow carry
                        // several conversions.
                        raw_step = Some(step);
                    }
                }
            }
            if let Some(step) = raw_step {
                self.operation.intermediates.insert(step, VersionFileInfo::default());
            }
        }

        if self
            .settings
            .save_intermediates
            .contains(Snapshots::WHEN_NOT_REPRODUCIBLE)
        {
            for step in first_step..=last_step {
                if let Some(action) = self.current_history.action(step) {
                    debug!(step, category = ?action.category, "reproducibility check");
                    if action.category.is_lossy_to_replay() {
                        self.operation.intermediates.insert(step, VersionFileInfo::default());
                    }
                }
            }
        }

        if !self.operation.intermediates.is_empty() {
            self.operation.tasks |= Tasks::STORE_INTERMEDIATES;

            // Steps are collected in order; now assign each its file.
            let steps: Vec<usize> = self.operation.intermediates.keys().copied().collect();
            let format = self.result.format.clone();
            for step in steps {
                let info = self.next_intermediate(&format)?;
                self.operation.intermediates.insert(step, info);
            }
        }

        Ok(())
    }

    pub(crate) fn into_operation(self) -> VersionFileOperation {
        self.operation
    }

    // -----------------------------------------------------------------------
    // Probing
    // -----------------------------------------------------------------------

    fn probe_version_name(&mut self) -> Result<(), VersionError> {
        let entries = read_directory(&self.result.path)?;

        for _ in 0..=entries.len() {
            let candidate =
                self.scheme
                    .version_file_name(&self.result.path, &self.base_name, self.version);

            // Hard guarantee: the name must not exist with any extension.
            if name_is_free(&entries, &candidate) {
                self.result.file_name = candidate;
                add_file_suffix(
                    &mut self.result.file_name,
                    &self.result.format,
                    Some(&self.loaded_file.file_name),
                );
                return Ok(());
            }

            self.version = self.scheme.incremented_counter(self.version);
        }

        Err(VersionError::NoFreeName {
            directory: self.result.path.clone(),
            base_name: self.base_name.clone(),
        })
    }

    /// Next collision-free intermediate name in the intermediate directory.
    ///
    /// The counter advances on every probe, so a sequence of snapshots
    /// planned in one request gets distinct names before anything is
    /// written to disk.
    fn next_intermediate(&mut self, format: &str) -> Result<VersionFileInfo, VersionError> {
        let entries = read_directory(&self.intermediate_path)?;

        for _ in 0..=entries.len() {
            let candidate = self.scheme.intermediate_file_name(
                &self.intermediate_path,
                &self.base_name,
                self.version,
                self.intermediate_counter,
            );
            self.intermediate_counter = self.scheme.incremented_counter(self.intermediate_counter);

            if name_is_free(&entries, &candidate) {
                let mut file_name = candidate;
                set_file_suffix(&mut file_name, format);
                return Ok(VersionFileInfo::new(
                    self.intermediate_path.clone(),
                    file_name,
                    format.to_string(),
                ));
            }
        }

        Err(VersionError::NoFreeName {
            directory: self.intermediate_path.clone(),
            base_name: self.base_name.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Filename helpers
// ---------------------------------------------------------------------------

/// Replace the extension of `file_name` with `format`, keeping the case
/// convention of the existing suffix. A name without a dot gains one. The
/// suffix is left alone when it already matches the format
/// case-insensitively.
fn set_file_suffix(file_name: &mut String, format: &str) {
    if file_name.is_empty() {
        return;
    }

    let (suffix_begin, is_lower) = match file_name.rfind('.') {
        Some(dot) => {
            let is_lower = file_name
                .chars()
                .last()
                .is_some_and(char::is_lowercase);
            (dot + 1, is_lower)
        }
        None => {
            file_name.push('.');
            (file_name.len(), true)
        }
    };

    if !file_name[suffix_begin..].eq_ignore_ascii_case(format) {
        file_name.truncate(suffix_begin);
        file_name.push_str(&cased(format, is_lower));
    }
}

/// Append `format` as the extension of `file_name`, following the case of
/// `original_name`'s trailing character when given.
fn add_file_suffix(file_name: &mut String, format: &str, original_name: Option<&str>) {
    if file_name.is_empty() {
        return;
    }

    let is_lower = original_name
        .and_then(|name| name.chars().last())
        .is_none_or(char::is_lowercase);

    if !file_name.ends_with('.') {
        file_name.push('.');
    }
    file_name.push_str(&cased(format, is_lower));
}

fn cased(format: &str, lower: bool) -> String {
    if lower {
        format.to_lowercase()
    } else {
        format.to_uppercase()
    }
}

/// `true` when no entry is the candidate itself or the candidate plus an
/// extension.
fn name_is_free(entries: &[String], candidate: &str) -> bool {
    !entries
        .iter()
        .any(|entry| entry == candidate || entry.strip_prefix(candidate).is_some_and(|rest| rest.starts_with('.')))
}

/// Fresh, read-only listing of the plain files in `dir`.
///
/// Errors propagate; the policy never creates missing directories.
fn read_directory(dir: &Path) -> Result<Vec<String>, VersionError> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Suffix handling
    // -----------------------------------------------------------------------

    #[test]
    fn set_suffix_replaces_and_keeps_case() {
        let mut name = "IMG_0001.png".to_string();
        set_file_suffix(&mut name, "JPG");
        assert_eq!(name, "IMG_0001.jpg");

        let mut name = "IMG_0001.PNG".to_string();
        set_file_suffix(&mut name, "JPG");
        assert_eq!(name, "IMG_0001.JPG");
    }

    #[test]
    fn set_suffix_leaves_matching_suffix_alone() {
        let mut name = "IMG_0001.jpg".to_string();
        set_file_suffix(&mut name, "JPG");
        assert_eq!(name, "IMG_0001.jpg");
    }

    #[test]
    fn set_suffix_adds_dot_when_missing() {
        let mut name = "IMG_0001".to_string();
        set_file_suffix(&mut name, "JPG");
        assert_eq!(name, "IMG_0001.jpg");
    }

    #[test]
    fn add_suffix_follows_original_case() {
        let mut name = "IMG_0001_v1".to_string();
        add_file_suffix(&mut name, "JPG", Some("IMG_0001.png"));
        assert_eq!(name, "IMG_0001_v1.jpg");

        let mut name = "IMG_0001_v1".to_string();
        add_file_suffix(&mut name, "JPG", Some("IMG_0001.PNG"));
        assert_eq!(name, "IMG_0001_v1.JPG");
    }

    // -----------------------------------------------------------------------
    // Collision predicate
    // -----------------------------------------------------------------------

    #[test]
    fn name_is_free_blocks_any_extension() {
        let entries = vec!["IMG_0001_v1.JPG".to_string(), "notes.txt".to_string()];
        assert!(!name_is_free(&entries, "IMG_0001_v1"));
        assert!(name_is_free(&entries, "IMG_0001_v2"));
    }

    #[test]
    fn name_is_free_blocks_exact_match() {
        let entries = vec!["IMG_0001_v1".to_string()];
        assert!(!name_is_free(&entries, "IMG_0001_v1"));
    }

    #[test]
    fn name_is_free_ignores_longer_bases() {
        // `IMG_0001_v12.JPG` must not block `IMG_0001_v1`.
        let entries = vec!["IMG_0001_v12.JPG".to_string()];
        assert!(name_is_free(&entries, "IMG_0001_v1"));
    }
}
