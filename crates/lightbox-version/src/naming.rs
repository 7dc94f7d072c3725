//! Version naming grammar.
//!
//! A [`VersionNamingScheme`] turns `(directory, base name, counter)` into
//! candidate filenames and parses existing versioned names back apart. It
//! is pure string work — collision checking against the filesystem is the
//! caller's job ([`crate::creator`]).
//!
//! The default grammar is `<base>_v<N>` for versions and `<base>_v<N>-<M>`
//! for intermediates, extensions handled by the caller.

use std::path::{Path, PathBuf};

/// Naming rules for versioned files. Implementations never touch the
/// filesystem.
pub trait VersionNamingScheme {
    /// First counter value to probe.
    fn initial_counter(&self) -> u32 {
        1
    }

    /// The counter to try after `counter`.
    fn incremented_counter(&self, counter: u32) -> u32 {
        counter.saturating_add(1)
    }

    /// Directory where versions of the loaded file are stored.
    fn directory(&self, loaded_path: &Path, loaded_file_name: &str) -> PathBuf;

    /// Parse `file_name` back into its base name, leaving each counter one
    /// step ahead of any version / intermediate number found in the name.
    /// Counters are untouched when the name carries no version suffix.
    fn base_name(
        &self,
        path: &Path,
        file_name: &str,
        version: &mut u32,
        intermediate: &mut u32,
    ) -> String;

    /// Candidate version filename, without extension.
    fn version_file_name(&self, directory: &Path, base_name: &str, counter: u32) -> String;

    /// Candidate intermediate filename, without extension.
    fn intermediate_file_name(
        &self,
        directory: &Path,
        base_name: &str,
        version: u32,
        counter: u32,
    ) -> String;
}

// ---------------------------------------------------------------------------
// Default scheme
// ---------------------------------------------------------------------------

/// The `<base>_v<N>` / `<base>_v<N>-<M>` grammar, versions stored next to
/// the loaded file.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultVersionNamingScheme;

impl VersionNamingScheme for DefaultVersionNamingScheme {
    fn directory(&self, loaded_path: &Path, _loaded_file_name: &str) -> PathBuf {
        loaded_path.to_path_buf()
    }

    fn base_name(
        &self,
        _path: &Path,
        file_name: &str,
        version: &mut u32,
        intermediate: &mut u32,
    ) -> String {
        let stem = match file_name.rfind('.') {
            Some(dot) => &file_name[..dot],
            None => file_name,
        };

        let Some((base, numbers)) = stem.rsplit_once("_v") else {
            return stem.to_string();
        };
        let (version_digits, intermediate_digits) = match numbers.split_once('-') {
            Some((v, m)) => (v, Some(m)),
            None => (numbers, None),
        };

        let Ok(parsed_version) = version_digits.parse::<u32>() else {
            return stem.to_string();
        };
        if base.is_empty() {
            return stem.to_string();
        }
        if let Some(digits) = intermediate_digits {
            let Ok(parsed) = digits.parse::<u32>() else {
                return stem.to_string();
            };
            *intermediate = self.incremented_counter(parsed);
        }

        *version = self.incremented_counter(parsed_version);
        base.to_string()
    }

    fn version_file_name(&self, _directory: &Path, base_name: &str, counter: u32) -> String {
        format!("{base_name}_v{counter}")
    }

    fn intermediate_file_name(
        &self,
        _directory: &Path,
        base_name: &str,
        version: u32,
        counter: u32,
    ) -> String {
        format!("{base_name}_v{version}-{counter}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(file_name: &str) -> (String, u32, u32) {
        let scheme = DefaultVersionNamingScheme;
        let mut version = scheme.initial_counter();
        let mut intermediate = scheme.initial_counter();
        let base = scheme.base_name(Path::new("/photos"), file_name, &mut version, &mut intermediate);
        (base, version, intermediate)
    }

    #[test]
    fn plain_name_keeps_initial_counters() {
        let (base, version, intermediate) = parse("IMG_0001.JPG");
        assert_eq!(base, "IMG_0001");
        assert_eq!(version, 1);
        assert_eq!(intermediate, 1);
    }

    #[test]
    fn versioned_name_parses_back() {
        let (base, version, intermediate) = parse("IMG_0001_v3.JPG");
        assert_eq!(base, "IMG_0001");
        assert_eq!(version, 4, "counter is one step ahead of the parsed version");
        assert_eq!(intermediate, 1);
    }

    #[test]
    fn intermediate_name_parses_both_counters() {
        let (base, version, intermediate) = parse("IMG_0001_v2-5.PGF");
        assert_eq!(base, "IMG_0001");
        assert_eq!(version, 3);
        assert_eq!(intermediate, 6);
    }

    #[test]
    fn round_trip_is_one_step_ahead() {
        let scheme = DefaultVersionNamingScheme;
        let dir = Path::new("/photos");
        let produced = scheme.version_file_name(dir, "IMG_0001", 7);
        assert_eq!(produced, "IMG_0001_v7");

        let mut version = scheme.initial_counter();
        let mut intermediate = scheme.initial_counter();
        let base = scheme.base_name(dir, &produced, &mut version, &mut intermediate);
        assert_eq!(base, "IMG_0001");
        assert_eq!(version, 8);
    }

    #[test]
    fn non_numeric_version_suffix_is_part_of_the_base() {
        let (base, version, _) = parse("holiday_very_nice.png");
        assert_eq!(base, "holiday_very_nice");
        assert_eq!(version, 1);
    }

    #[test]
    fn extension_is_split_at_the_last_dot() {
        let (base, _, _) = parse("scan.2026.tiff");
        assert_eq!(base, "scan.2026");
    }

    #[test]
    fn intermediate_file_name_grammar() {
        let scheme = DefaultVersionNamingScheme;
        let name = scheme.intermediate_file_name(Path::new("/p"), "IMG_0001", 2, 3);
        assert_eq!(name, "IMG_0001_v2-3");
    }

    #[test]
    fn directory_is_the_loaded_files_directory() {
        let scheme = DefaultVersionNamingScheme;
        let dir = scheme.directory(Path::new("/photos/2026"), "IMG_0001.JPG");
        assert_eq!(dir, PathBuf::from("/photos/2026"));
    }
}
