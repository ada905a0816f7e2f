//! # sm-migrate Core
//!
//! Data model shared by the migration pipeline.
//!
//! This crate provides:
//! - An opaque submodel document that passes source JSON through verbatim
//! - Typed accessors for the few fields the pipeline inspects (`id`, `dataSourceItems`)
//! - Per-item outcomes and the run summary they are tallied into

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod outcome;

pub use document::{label_of, DocumentError, SubmodelDocument, UNKNOWN_LABEL};
pub use outcome::{MigrationSummary, Outcome, OutcomeKind};
