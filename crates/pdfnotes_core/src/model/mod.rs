//! Domain model for extracted annotations under review.
//!
//! # Responsibility
//! - Define the annotation record exchanged with extraction/export backends.
//! - Own the ordered, replace-or-clear-only collection under review.
//!
//! # Invariants
//! - Collection order is source document order; never re-sorted or deduplicated.
//! - The collection has exactly one writer handle (`NoteStore`).

pub mod collection;
pub mod document;
pub mod export_format;
pub mod note;
