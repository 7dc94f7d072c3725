#![forbid(unsafe_code)]
//! lightbox-version: the save decision and naming policy.
//!
//! Given the loaded file, its resolved initial history, the history after
//! this session's edits, and the user's settings, decide whether a save
//! overwrites in place, forks a new version, or additionally persists
//! intermediate snapshots — and compute collision-free names for all of it.
//! The result is a plan ([`VersionFileOperation`]); the I/O layer executes
//! it.
//!
//! # Modules
//!
//! - [`manager`] — [`VersionManager`], the request entry points.
//! - [`creator`] — the per-request decision state machine (crate-private).
//! - [`naming`] — the naming grammar and its default implementation.
//! - [`op`] — the plan types handed to the I/O layer.
//! - [`settings`] — configuration.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums; directory I/O failures propagate,
//!   malformed histories are logged and clamped.
//! - **Logging**: `tracing` macros (`debug!` on decision branches,
//!   `warn!` on defensive clamps).

pub mod error;
pub mod manager;
pub mod naming;
pub mod op;
pub mod settings;

mod creator;

pub use error::VersionError;
pub use manager::{FileNameRequest, VersionManager};
pub use naming::{DefaultVersionNamingScheme, VersionNamingScheme};
pub use op::{Tasks, VersionFileInfo, VersionFileOperation};
pub use settings::{Snapshots, VersionSettings};
