//! Request planning: field-selection resolution (C1) and request merging
//! (C2) for the EVM indexing framework.
//!
//! Field selection resolution itself lives on [`ei_types::FieldSelection`]
//! (`FieldSelection::resolve`) since it operates purely on the canonical
//! data model; this crate re-exports it alongside the merger so callers
//! have a single entry point for "planning".

pub mod merger;

pub use ei_types::{FieldSelection, FieldSelectionInput};
pub use merger::merge_requests;
