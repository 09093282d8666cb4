//! Multi-format export orchestration.
//!
//! # Responsibility
//! - Submit the current notes to the export backend for one format.
//! - Classify the response: binary artifact vs. error report disguised
//!   behind a success status.
//! - Hand artifacts to the download sink and release transient blobs.
//!
//! # Invariants
//! - Single flight across all formats: while any export is pending, every
//!   `export` call is ignored and issues no request.
//! - Structured-data responses never trigger a download.
//! - The in-flight gate and the transient blob are released on every exit
//!   path (success, reported failure, transport failure, delivery failure).
//! - The gate opens as soon as the sink has taken the artifact; only the
//!   blob release waits out the cleanup delay.
//! - Export is withheld while the collection is empty.

use crate::backend::{BackendError, ExportResponse, NotesBackend};
use crate::download::{DownloadSink, TransientBlob, TransientStore};
use crate::model::collection::NoteReader;
use crate::model::export_format::{ExportFormat, UnsupportedFormat};
use crate::model::note::Note;
use log::{debug, info, warn};
use mime_guess::mime::{self, Mime};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};

const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";
const GENERIC_FAILURE_MESSAGE: &str = "Failed to export file.";

/// Export gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Idle,
    InFlight(ExportFormat),
}

/// User-visible export failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    /// Requested format name is not one of txt|docx|pdf.
    UnsupportedFormat(String),
    /// Network/status failure, or an unusable (empty) artifact body.
    TransportFailed(BackendError),
    /// Backend returned a structured error report with a success status.
    ReportedFailure(String),
    /// The platform save step failed.
    DeliveryFailed(String),
}

impl ExportError {
    /// Short message suitable for direct display.
    pub fn user_message(&self) -> String {
        match self {
            Self::ReportedFailure(message) => message.clone(),
            Self::UnsupportedFormat(value) => format!("Unsupported export format `{value}`."),
            Self::TransportFailed(_) | Self::DeliveryFailed(_) => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::TransportFailed(_) => "transport_failed",
            Self::ReportedFailure(_) => "reported_failure",
            Self::DeliveryFailed(_) => "delivery_failed",
        }
    }
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedFormat(value) => write!(f, "unsupported export format `{value}`"),
            Self::TransportFailed(err) => write!(f, "export request failed: {err}"),
            Self::ReportedFailure(message) => write!(f, "export backend reported: {message}"),
            Self::DeliveryFailed(message) => write!(f, "saving export failed: {message}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::TransportFailed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UnsupportedFormat> for ExportError {
    fn from(value: UnsupportedFormat) -> Self {
        Self::UnsupportedFormat(value.0)
    }
}

/// Result of one `export` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Artifact handed to the sink.
    Downloaded {
        format: ExportFormat,
        file_name: String,
        location: PathBuf,
    },
    Failed(ExportError),
    /// Another export was in flight.
    Ignored,
    /// Nothing to export.
    Unavailable,
}

/// Clears the gate when dropped.
struct InFlightGate<'a> {
    state: &'a Cell<ExportState>,
}

impl<'a> InFlightGate<'a> {
    fn enter(state: &'a Cell<ExportState>, format: ExportFormat) -> Self {
        state.set(ExportState::InFlight(format));
        Self { state }
    }
}

impl Drop for InFlightGate<'_> {
    fn drop(&mut self) {
        self.state.set(ExportState::Idle);
    }
}

/// Artifact handed to the sink, still pinned until cleanup.
struct Delivery {
    file_name: String,
    location: PathBuf,
    blob: TransientBlob,
}

/// Export orchestrator over a read-only view of the collection.
pub struct ExportOrchestrator<B: NotesBackend, S: DownloadSink> {
    backend: B,
    sink: S,
    notes: NoteReader,
    blobs: TransientStore,
    cleanup_delay: Duration,
    state: Cell<ExportState>,
    last_error: RefCell<Option<ExportError>>,
}

impl<B: NotesBackend, S: DownloadSink> ExportOrchestrator<B, S> {
    pub fn new(backend: B, sink: S, notes: NoteReader, cleanup_delay: Duration) -> Self {
        Self {
            backend,
            sink,
            notes,
            blobs: TransientStore::new(),
            cleanup_delay,
            state: Cell::new(ExportState::Idle),
            last_error: RefCell::new(None),
        }
    }

    /// Whether the export surface is offered at all.
    pub fn is_available(&self) -> bool {
        !self.notes.is_empty()
    }

    pub fn state(&self) -> ExportState {
        self.state.get()
    }

    pub fn in_flight(&self) -> Option<ExportFormat> {
        match self.state.get() {
            ExportState::Idle => None,
            ExportState::InFlight(format) => Some(format),
        }
    }

    /// Whether `format`'s affordance shows a pending indicator.
    pub fn is_loading(&self, format: ExportFormat) -> bool {
        self.in_flight() == Some(format)
    }

    /// All format affordances are disabled while any export is pending.
    pub fn affordances_enabled(&self) -> bool {
        self.is_available() && self.in_flight().is_none()
    }

    /// `Export N notes to:`
    pub fn summary_label(&self) -> String {
        format!("Export {} notes to:", self.notes.len())
    }

    pub fn last_error(&self) -> Option<ExportError> {
        self.last_error.borrow().clone()
    }

    /// Transient blob registry, exposed for leak checks.
    pub fn transient_store(&self) -> &TransientStore {
        &self.blobs
    }

    /// Parses a format name and exports it.
    pub async fn export_named(&self, format: &str) -> ExportOutcome {
        match ExportFormat::from_str(format) {
            Ok(format) => self.export(format).await,
            Err(err) => {
                let error = ExportError::from(err);
                warn!(
                    "event=export module=export status=error error_code={}",
                    error.code()
                );
                self.last_error.replace(Some(error.clone()));
                ExportOutcome::Failed(error)
            }
        }
    }

    /// Exports the current notes as `format` and triggers a download.
    pub async fn export(&self, format: ExportFormat) -> ExportOutcome {
        if self.notes.is_empty() {
            debug!("event=export module=export status=ignored reason=empty format={format}");
            return ExportOutcome::Unavailable;
        }
        if let ExportState::InFlight(active) = self.state.get() {
            info!(
                "event=export module=export status=ignored reason=in_flight format={} active={}",
                format, active
            );
            return ExportOutcome::Ignored;
        }

        let gate = InFlightGate::enter(&self.state, format);
        self.last_error.replace(None);
        let started_at = Instant::now();
        let notes = self.notes.snapshot();
        info!(
            "event=export module=export status=start format={} notes={}",
            format,
            notes.len()
        );

        let result = self.run(format, &notes).await;
        drop(gate);

        match result {
            Ok(Delivery {
                file_name,
                location,
                blob,
            }) => {
                info!(
                    "event=export module=export status=ok format={} duration_ms={}",
                    format,
                    started_at.elapsed().as_millis()
                );
                // Release only after the save hand-off has settled.
                if !self.cleanup_delay.is_zero() {
                    tokio::time::sleep(self.cleanup_delay).await;
                }
                drop(blob);
                ExportOutcome::Downloaded {
                    format,
                    file_name,
                    location,
                }
            }
            Err(error) => {
                warn!(
                    "event=export module=export status=error format={} duration_ms={} error_code={} error={}",
                    format,
                    started_at.elapsed().as_millis(),
                    error.code(),
                    error
                );
                self.last_error.replace(Some(error.clone()));
                ExportOutcome::Failed(error)
            }
        }
    }

    async fn run(
        &self,
        format: ExportFormat,
        notes: &[Note],
    ) -> Result<Delivery, ExportError> {
        let response = self
            .backend
            .export(format, notes)
            .await
            .map_err(ExportError::TransportFailed)?;
        let bytes = classify_response(response)?;

        let blob = self.blobs.acquire(bytes);
        let file_name = format.file_name();
        let location = self
            .sink
            .save(&blob, &file_name)
            .map_err(|err| ExportError::DeliveryFailed(err.to_string()))?;
        Ok(Delivery {
            file_name,
            location,
            blob,
        })
    }
}

/// Splits an export response into artifact bytes or a reported failure.
///
/// Structured-data media types (`application/json`, `*/*+json`) carry an
/// error report even under a success status. Anything else is the artifact.
/// A structured body that does not parse is a transport failure.
pub fn classify_response(response: ExportResponse) -> Result<Vec<u8>, ExportError> {
    if is_structured_media_type(response.content_type.as_deref()) {
        let report = serde_json::from_slice::<Value>(&response.body).map_err(|err| {
            ExportError::TransportFailed(BackendError::Malformed(format!(
                "unreadable error report: {err}"
            )))
        })?;
        return Err(ExportError::ReportedFailure(extract_error_message(&report)));
    }
    if response.body.is_empty() {
        return Err(ExportError::TransportFailed(BackendError::Malformed(
            "empty export body".to_string(),
        )));
    }
    Ok(response.body)
}

/// Whether a declared `Content-Type` denotes structured data.
pub fn is_structured_media_type(content_type: Option<&str>) -> bool {
    let Some(parsed) = content_type.and_then(|value| value.trim().parse::<Mime>().ok()) else {
        return false;
    };
    (parsed.type_() == mime::APPLICATION && parsed.subtype() == mime::JSON)
        || parsed.suffix() == Some(mime::JSON)
}

/// Pulls a human-readable message out of a parsed error report.
///
/// Looks at `detail` (string, or list of `{msg}`), then `message`, then
/// `error`; falls back to `Unknown error`.
pub fn extract_error_message(value: &Value) -> String {
    let detail = value.get("detail");
    let from_detail = match detail {
        Some(Value::String(message)) => Some(message.clone()),
        Some(Value::Array(items)) => items
            .iter()
            .find_map(|item| item.get("msg").and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    };

    from_detail
        .or_else(|| {
            ["message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str))
                .map(str::to_string)
        })
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string())
}

#[cfg(test)]
mod tests {
    use super::{classify_response, extract_error_message, is_structured_media_type, ExportError};
    use crate::backend::{BackendError, ExportResponse};
    use serde_json::json;

    fn response(content_type: Option<&str>, body: &[u8]) -> ExportResponse {
        ExportResponse {
            content_type: content_type.map(str::to_string),
            body: body.to_vec(),
        }
    }

    #[test]
    fn json_media_types_are_structured() {
        assert!(is_structured_media_type(Some("application/json")));
        assert!(is_structured_media_type(Some("application/json; charset=utf-8")));
        assert!(is_structured_media_type(Some("application/problem+json")));
        assert!(!is_structured_media_type(Some("application/pdf")));
        assert!(!is_structured_media_type(Some("text/plain; charset=utf-8")));
        assert!(!is_structured_media_type(Some("not a mime")));
        assert!(!is_structured_media_type(None));
    }

    #[test]
    fn structured_response_becomes_reported_failure() {
        let err = classify_response(response(
            Some("application/json"),
            br#"{"detail":"rendering failed"}"#,
        ))
        .expect_err("json must not be treated as artifact");
        assert_eq!(err, ExportError::ReportedFailure("rendering failed".to_string()));
        assert_eq!(err.user_message(), "rendering failed");
    }

    #[test]
    fn binary_response_passes_through() {
        let bytes = classify_response(response(Some("application/pdf"), b"%PDF"))
            .expect("pdf is an artifact");
        assert_eq!(bytes, b"%PDF");
    }

    #[test]
    fn empty_artifact_is_transport_failure() {
        let err = classify_response(response(Some("text/plain"), b"")).expect_err("empty body");
        assert!(matches!(
            err,
            ExportError::TransportFailed(BackendError::Malformed(_))
        ));
        assert_eq!(err.user_message(), "Failed to export file.");
    }

    #[test]
    fn unparseable_error_report_is_transport_failure() {
        let err = classify_response(response(Some("application/json"), b"<html>oops</html>"))
            .expect_err("json-typed body is never an artifact");
        assert!(matches!(
            err,
            ExportError::TransportFailed(BackendError::Malformed(_))
        ));
        assert_eq!(err.user_message(), "Failed to export file.");
    }

    #[test]
    fn message_extraction_falls_back_in_order() {
        assert_eq!(
            extract_error_message(&json!({"detail": [{"loc": ["body"], "msg": "field required"}]})),
            "field required"
        );
        assert_eq!(extract_error_message(&json!({"message": "busy"})), "busy");
        assert_eq!(extract_error_message(&json!({"error": "nope"})), "nope");
        assert_eq!(extract_error_message(&json!({"detail": ""})), "Unknown error");
        assert_eq!(extract_error_message(&json!(["not", "an", "object"])), "Unknown error");
    }
}
