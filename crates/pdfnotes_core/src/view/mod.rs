//! Read-only projections of the note collection for display.

pub mod review_view;
