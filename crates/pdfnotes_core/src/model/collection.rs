//! Ordered annotation collection and its owner/reader handles.
//!
//! # Responsibility
//! - Hold the notes currently under review in source document order.
//! - Split access into one writer handle and any number of reader handles.
//!
//! # Invariants
//! - Mutation is wholesale only: `replace` or `clear`.
//! - Every mutation bumps `generation`.
//! - Handles are single-threaded (`Rc`); mutation happens between event-loop
//!   turns, never while a reader borrow is alive.

use crate::model::note::Note;
use std::cell::{Ref, RefCell};
use std::rc::Rc;

/// Ordered, replace-or-clear-only sequence of notes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteCollection {
    notes: Vec<Note>,
    generation: u64,
}

impl NoteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically swaps in a new sequence, keeping its order.
    pub fn replace(&mut self, notes: Vec<Note>) {
        self.notes = notes;
        self.generation += 1;
    }

    /// Empties the collection.
    pub fn clear(&mut self) {
        self.notes.clear();
        self.generation += 1;
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Note> {
        self.notes.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Note> {
        self.notes.iter()
    }

    pub fn as_slice(&self) -> &[Note] {
        &self.notes
    }

    /// Mutation counter; positions are only stable within one generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Owning writer handle, created once at application start.
///
/// Only the ingestion path receives this handle; views and the export
/// path get a [`NoteReader`].
#[derive(Debug, Default)]
pub struct NoteStore {
    inner: Rc<RefCell<NoteCollection>>,
}

impl NoteStore {
    /// Creates the process-wide collection in its initial (empty) state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a read-only handle sharing this store.
    pub fn reader(&self) -> NoteReader {
        NoteReader {
            inner: Rc::clone(&self.inner),
        }
    }

    pub fn replace(&self, notes: Vec<Note>) {
        self.inner.borrow_mut().replace(notes);
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

/// Read-only handle over the shared collection.
#[derive(Debug, Clone)]
pub struct NoteReader {
    inner: Rc<RefCell<NoteCollection>>,
}

impl NoteReader {
    /// Borrows the collection. Do not hold the borrow across an `.await`.
    pub fn read(&self) -> Ref<'_, NoteCollection> {
        self.inner.borrow()
    }

    /// Copies the current notes out, e.g. to build a request body.
    pub fn snapshot(&self) -> Vec<Note> {
        self.inner.borrow().as_slice().to_vec()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.inner.borrow().generation()
    }
}
