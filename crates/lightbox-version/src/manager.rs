//! Entry points of the version policy.
//!
//! A [`VersionManager`] holds the session-scoped pieces — settings, naming
//! scheme, filter registry — and spins up one
//! [`VersionNameCreator`](crate::creator) per save request. Everything is
//! injected explicitly; there is no process-wide instance.
//!
//! Callers serialize save requests per file (one request per file session);
//! requests for different files are independent. Each request runs to
//! completion on the caller's thread so it observes one consistent snapshot
//! of the target directory while probing.

use lightbox_history::{EditHistory, FilterRegistry};

use crate::creator::VersionNameCreator;
use crate::error::VersionError;
use crate::naming::{DefaultVersionNamingScheme, VersionNamingScheme};
use crate::op::{VersionFileInfo, VersionFileOperation};
use crate::settings::VersionSettings;

/// Which name the save request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileNameRequest {
    /// Keep the current version's name when the history permits overwriting.
    CurrentVersionName,
    /// Always fork a new version.
    NewVersionName,
}

/// Session-scoped façade over the decision policy.
pub struct VersionManager {
    settings: VersionSettings,
    scheme: Box<dyn VersionNamingScheme>,
    registry: FilterRegistry,
}

impl VersionManager {
    /// Manager with the default naming scheme and filter registry.
    #[must_use]
    pub fn new(settings: VersionSettings) -> Self {
        Self::with_scheme_and_registry(
            settings,
            Box::new(DefaultVersionNamingScheme),
            FilterRegistry::default(),
        )
    }

    /// Manager with an injected scheme and registry.
    #[must_use]
    pub fn with_scheme_and_registry(
        settings: VersionSettings,
        scheme: Box<dyn VersionNamingScheme>,
        registry: FilterRegistry,
    ) -> Self {
        Self {
            settings,
            scheme,
            registry,
        }
    }

    /// The active settings.
    #[must_use]
    pub fn settings(&self) -> &VersionSettings {
        &self.settings
    }

    /// The active naming scheme.
    #[must_use]
    pub fn naming_scheme(&self) -> &dyn VersionNamingScheme {
        self.scheme.as_ref()
    }

    /// Plan a regular save.
    ///
    /// # Errors
    ///
    /// [`VersionError::Io`] when the target directory cannot be listed,
    /// [`VersionError::NoFreeName`] when probing exhausts its bound.
    pub fn operation(
        &self,
        request: FileNameRequest,
        loaded_file: &VersionFileInfo,
        resolved_initial_history: &EditHistory,
        current_history: &EditHistory,
    ) -> Result<VersionFileOperation, VersionError> {
        let mut name = self.creator(loaded_file, resolved_initial_history, current_history);

        match request {
            FileNameRequest::CurrentVersionName => name.check_need_new_version(),
            FileNameRequest::NewVersionName => name.fork(),
        }
        name.set_save_directory();
        name.set_save_format();
        name.set_save_file_name()?;
        name.init_operation();
        name.check_intermediates()?;

        Ok(name.into_operation())
    }

    /// Plan a save of a new version in an explicit format.
    ///
    /// # Errors
    ///
    /// See [`VersionManager::operation`].
    pub fn operation_new_version_in_format(
        &self,
        loaded_file: &VersionFileInfo,
        format: &str,
        resolved_initial_history: &EditHistory,
        current_history: &EditHistory,
    ) -> Result<VersionFileOperation, VersionError> {
        let mut name = self.creator(loaded_file, resolved_initial_history, current_history);

        name.fork();
        name.set_save_directory();
        name.set_save_format_to(format);
        name.set_save_file_name()?;
        name.init_operation();
        name.check_intermediates()?;

        Ok(name.into_operation())
    }

    /// Plan a save to an explicit target location ("Save As New Version…").
    /// Forks unconditionally; the target name is taken verbatim.
    ///
    /// # Errors
    ///
    /// See [`VersionManager::operation`]. The target name itself is not
    /// probed, but intermediates still are.
    pub fn operation_new_version_as(
        &self,
        loaded_file: &VersionFileInfo,
        save_location: &VersionFileInfo,
        resolved_initial_history: &EditHistory,
        current_history: &EditHistory,
    ) -> Result<VersionFileOperation, VersionError> {
        let mut name = self.creator(loaded_file, resolved_initial_history, current_history);

        name.fork();
        name.set_save_directory_to(&save_location.path);
        name.set_save_format_to(&save_location.format);
        name.set_save_file_name_to(&save_location.file_name);
        name.init_operation();
        name.check_intermediates()?;

        Ok(name.into_operation())
    }

    fn creator<'a>(
        &'a self,
        loaded_file: &VersionFileInfo,
        resolved_initial_history: &'a EditHistory,
        current_history: &'a EditHistory,
    ) -> VersionNameCreator<'a> {
        VersionNameCreator::new(
            &self.settings,
            self.scheme.as_ref(),
            &self.registry,
            loaded_file,
            resolved_initial_history,
            current_history,
        )
    }
}
