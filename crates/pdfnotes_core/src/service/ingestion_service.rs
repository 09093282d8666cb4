//! Document ingestion controller.
//!
//! # Responsibility
//! - Drive a presented file through validation and extraction.
//! - Populate the note collection on success, surface a message on failure.
//! - Track drag feedback and the clear/reset action.
//!
//! # Invariants
//! - At most one extraction is in flight; presenting a file while
//!   `Validating`/`Submitting` is ignored and issues no request.
//! - Validation and extraction failures never mutate the note collection.
//! - A failed extraction discards the held file; there is no automatic retry.
//! - Reset is refused while `Validating`/`Submitting`.

use crate::backend::{BackendError, NotesBackend};
use crate::model::collection::{NoteReader, NoteStore};
use crate::model::document::{FileSummary, PresentedFile, EXPECTED_MEDIA_TYPE};
use log::{info, warn};
use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Lifecycle phase of the ingestion controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionPhase {
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

impl IngestionPhase {
    fn is_busy(self) -> bool {
        matches!(self, Self::Validating | Self::Submitting)
    }
}

/// How a file reached the controller. Both paths behave identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Selection,
    Drop,
}

impl InputSource {
    fn as_str(self) -> &'static str {
        match self {
            Self::Selection => "selection",
            Self::Drop => "drop",
        }
    }
}

/// User-visible ingestion failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestionError {
    /// Declared media type is not the expected document type.
    InvalidFileType { media_type: String },
    /// Extraction request failed in transport, status or payload.
    ExtractionFailed(BackendError),
}

impl IngestionError {
    /// Short message suitable for direct display.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidFileType { .. } => "Please upload a valid PDF file.",
            Self::ExtractionFailed(_) => "Failed to parse PDF. Please try again.",
        }
    }
}

impl Display for IngestionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFileType { media_type } => write!(
                f,
                "invalid file type `{media_type}`; expected `{EXPECTED_MEDIA_TYPE}`"
            ),
            Self::ExtractionFailed(err) => write!(f, "extraction failed: {err}"),
        }
    }
}

impl Error for IngestionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidFileType { .. } => None,
            Self::ExtractionFailed(err) => Some(err),
        }
    }
}

/// Result of presenting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestionOutcome {
    /// Extraction succeeded and the collection now holds `notes` entries.
    Accepted { notes: usize },
    /// Validation or extraction failed; the message is retained for display.
    Rejected(IngestionError),
    /// Input surface was disabled; nothing happened.
    Ignored,
}

#[derive(Debug)]
struct IngestionState {
    phase: IngestionPhase,
    file: Option<FileSummary>,
    error: Option<IngestionError>,
    dragging: bool,
}

impl IngestionState {
    fn initial() -> Self {
        Self {
            phase: IngestionPhase::Idle,
            file: None,
            error: None,
            dragging: false,
        }
    }
}

/// Ingestion state machine; the only writer of the note collection.
pub struct IngestionController<B: NotesBackend> {
    backend: B,
    store: NoteStore,
    state: RefCell<IngestionState>,
}

impl<B: NotesBackend> IngestionController<B> {
    /// Takes ownership of the collection's writer handle.
    pub fn new(backend: B, store: NoteStore) -> Self {
        Self {
            backend,
            store,
            state: RefCell::new(IngestionState::initial()),
        }
    }

    /// Read-only handle for views and export.
    pub fn notes(&self) -> NoteReader {
        self.store.reader()
    }

    pub fn phase(&self) -> IngestionPhase {
        self.state.borrow().phase
    }

    /// Accepted file retained for display (name + size).
    pub fn accepted_file(&self) -> Option<FileSummary> {
        self.state.borrow().file.clone()
    }

    pub fn error(&self) -> Option<IngestionError> {
        self.state.borrow().error.clone()
    }

    pub fn error_message(&self) -> Option<&'static str> {
        self.state
            .borrow()
            .error
            .as_ref()
            .map(IngestionError::user_message)
    }

    /// Whether the file input / drop zone accepts files.
    pub fn is_input_enabled(&self) -> bool {
        !self.state.borrow().phase.is_busy()
    }

    pub fn is_dragging(&self) -> bool {
        self.state.borrow().dragging
    }

    /// Whether the clear affordance is offered.
    pub fn can_clear(&self) -> bool {
        let state = self.state.borrow();
        !state.phase.is_busy() && (state.file.is_some() || state.error.is_some())
    }

    /// Drag feedback only; no data effect.
    pub fn drag_over(&self) {
        let mut state = self.state.borrow_mut();
        if !state.phase.is_busy() {
            state.dragging = true;
        }
    }

    pub fn drag_leave(&self) {
        self.state.borrow_mut().dragging = false;
    }

    /// Explicit file selection.
    pub async fn select_file(&self, file: PresentedFile) -> IngestionOutcome {
        self.present(file, InputSource::Selection).await
    }

    /// Drag-and-drop release.
    pub async fn drop_file(&self, file: PresentedFile) -> IngestionOutcome {
        self.present(file, InputSource::Drop).await
    }

    /// Validates `file`, submits it for extraction and applies the result.
    pub async fn present(&self, file: PresentedFile, source: InputSource) -> IngestionOutcome {
        let resume_phase = {
            let mut state = self.state.borrow_mut();
            state.dragging = false;
            if state.phase.is_busy() {
                info!(
                    "event=ingest_present module=ingest status=ignored source={} phase={:?}",
                    source.as_str(),
                    state.phase
                );
                return IngestionOutcome::Ignored;
            }
            let resume_phase = state.phase;
            state.phase = IngestionPhase::Validating;
            resume_phase
        };

        if !file.is_expected_type() {
            let error = IngestionError::InvalidFileType {
                media_type: file.media_type.clone(),
            };
            warn!(
                "event=ingest_validate module=ingest status=error source={} error_code=invalid_file_type",
                source.as_str()
            );
            let mut state = self.state.borrow_mut();
            state.phase = resume_phase;
            state.error = Some(error.clone());
            return IngestionOutcome::Rejected(error);
        }

        {
            let mut state = self.state.borrow_mut();
            state.phase = IngestionPhase::Submitting;
            state.file = Some(file.summary());
            state.error = None;
        }

        let started_at = Instant::now();
        info!(
            "event=ingest_submit module=ingest status=start source={} bytes={}",
            source.as_str(),
            file.bytes.len()
        );
        let result = self.backend.extract(&file).await;

        let mut state = self.state.borrow_mut();
        match result {
            Ok(notes) => {
                let count = notes.len();
                self.store.replace(notes);
                state.phase = IngestionPhase::Succeeded;
                info!(
                    "event=ingest_submit module=ingest status=ok notes={} duration_ms={}",
                    count,
                    started_at.elapsed().as_millis()
                );
                IngestionOutcome::Accepted { notes: count }
            }
            Err(err) => {
                warn!(
                    "event=ingest_submit module=ingest status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                let error = IngestionError::ExtractionFailed(err);
                state.phase = IngestionPhase::Failed;
                state.file = None;
                state.error = Some(error.clone());
                IngestionOutcome::Rejected(error)
            }
        }
    }

    /// Drops the held file and error and empties the collection.
    ///
    /// Returns `false` (and changes nothing) while a submission is pending.
    pub fn clear(&self) -> bool {
        let mut state = self.state.borrow_mut();
        if state.phase.is_busy() {
            info!("event=ingest_clear module=ingest status=ignored");
            return false;
        }
        *state = IngestionState::initial();
        self.store.clear();
        info!("event=ingest_clear module=ingest status=ok");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{IngestionError, IngestionPhase};
    use crate::backend::BackendError;

    #[test]
    fn user_messages_match_surface_copy() {
        let invalid = IngestionError::InvalidFileType {
            media_type: "image/png".to_string(),
        };
        assert_eq!(invalid.user_message(), "Please upload a valid PDF file.");
        let failed = IngestionError::ExtractionFailed(BackendError::Transport("boom".to_string()));
        assert_eq!(failed.user_message(), "Failed to parse PDF. Please try again.");
    }

    #[test]
    fn only_validating_and_submitting_are_busy() {
        assert!(IngestionPhase::Validating.is_busy());
        assert!(IngestionPhase::Submitting.is_busy());
        assert!(!IngestionPhase::Idle.is_busy());
        assert!(!IngestionPhase::Succeeded.is_busy());
        assert!(!IngestionPhase::Failed.is_busy());
    }
}
