#![forbid(unsafe_code)]
//! lightbox-history: the non-destructive edit-history engine.
//!
//! Tracks how an image file evolved through successive edits as a DAG of
//! pixel-content states, and answers the queries presentation and
//! versioning code ask of it: categorization, main-line and relatedness
//! paths, depth-first display order.
//!
//! # Modules
//!
//! - [`graph`] — generic DAG container with property storage and traversal.
//! - [`history`] — the domain specialization ([`HistoryGraph`]).
//! - [`item`] / [`action`] / [`timeline`] — data consumed from the image
//!   database and the filter pipeline.
//! - [`projection`] — display contract for presentation layers.
//!
//! # Conventions
//!
//! - **Errors**: per-module `thiserror` enums; query misses are values
//!   (empty path, `-1` distance), never errors.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod action;
pub mod error;
pub mod graph;
pub mod history;
pub mod item;
pub mod projection;
pub mod timeline;

pub use action::{FilterAction, FilterCategory, FilterRegistry};
pub use error::GraphError;
pub use graph::{Direction, Graph, Vertex};
pub use history::{EdgeProperties, HistoryGraph, VertexProperties};
pub use item::{ItemInfo, Roles};
pub use projection::{HistoryProjection, project};
pub use timeline::{EditHistory, HistoryEntry};
