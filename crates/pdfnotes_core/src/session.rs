//! Application-level wiring of the review workflow.
//!
//! # Responsibility
//! - Create the note collection once and hand out its handles explicitly:
//!   the writer to ingestion, readers to review and export.
//!
//! # Invariants
//! - One session owns exactly one collection; there is no ambient global.

use crate::backend::{BackendResult, HttpBackend, NotesBackend};
use crate::config::ClientConfig;
use crate::download::{DirectorySink, DownloadSink};
use crate::model::collection::{NoteReader, NoteStore};
use crate::service::export_service::ExportOrchestrator;
use crate::service::ingestion_service::IngestionController;
use crate::view::review_view::ReviewView;
use std::time::Duration;

/// Ingestion, review and export components sharing one collection.
pub struct ReviewSession<B: NotesBackend + Clone, S: DownloadSink> {
    ingestion: IngestionController<B>,
    review: ReviewView,
    export: ExportOrchestrator<B, S>,
}

impl ReviewSession<HttpBackend, DirectorySink> {
    /// HTTP backend plus a download directory, both from `config`.
    pub fn from_config(config: &ClientConfig) -> BackendResult<Self> {
        let backend = HttpBackend::new(config)?;
        let sink = DirectorySink::new(config.download_dir.clone());
        Ok(Self::new(backend, sink, config.cleanup_delay))
    }
}

impl<B: NotesBackend + Clone, S: DownloadSink> ReviewSession<B, S> {
    pub fn new(backend: B, sink: S, cleanup_delay: Duration) -> Self {
        let store = NoteStore::new();
        let reader = store.reader();
        Self {
            review: ReviewView::new(reader.clone()),
            export: ExportOrchestrator::new(backend.clone(), sink, reader, cleanup_delay),
            ingestion: IngestionController::new(backend, store),
        }
    }

    pub fn ingestion(&self) -> &IngestionController<B> {
        &self.ingestion
    }

    pub fn review(&self) -> &ReviewView {
        &self.review
    }

    pub fn review_mut(&mut self) -> &mut ReviewView {
        &mut self.review
    }

    pub fn export(&self) -> &ExportOrchestrator<B, S> {
        &self.export
    }

    pub fn notes(&self) -> NoteReader {
        self.ingestion.notes()
    }
}
