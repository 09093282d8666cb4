//! Core of the annotated-PDF review workflow.
//!
//! Ingests a document through an extraction backend, exposes the extracted
//! highlights and notes for review, and re-exports them through a rendering
//! backend as txt/docx/pdf downloads.

pub mod backend;
pub mod config;
pub mod download;
pub mod logging;
pub mod model;
pub mod service;
pub mod session;
pub mod view;

pub use backend::{BackendError, BackendResult, ExportResponse, HttpBackend, NotesBackend};
pub use config::{ClientConfig, ConfigError};
pub use download::{DirectorySink, DownloadSink, TransientBlob, TransientStore};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::collection::{NoteCollection, NoteReader, NoteStore};
pub use model::document::{FileSummary, PresentedFile, EXPECTED_MEDIA_TYPE};
pub use model::export_format::{ExportFormat, UnsupportedFormat, EXPORT_FILE_STEM};
pub use model::note::{Note, NoteValidationError};
pub use service::export_service::{
    classify_response, ExportError, ExportOrchestrator, ExportOutcome, ExportState,
};
pub use service::ingestion_service::{
    IngestionController, IngestionError, IngestionOutcome, IngestionPhase, InputSource,
};
pub use session::ReviewSession;
pub use view::review_view::{ReviewItem, ReviewView};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
