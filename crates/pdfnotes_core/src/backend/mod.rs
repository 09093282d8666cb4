//! Extraction/export backend contracts.
//!
//! # Responsibility
//! - Define the request/response seam to the two external backend operations.
//! - Keep transport details out of ingestion and export orchestration.
//!
//! # Invariants
//! - `export` returns the raw response; callers classify it.
//! - Non-2xx statuses surface as `BackendError::Status`.
//! - Futures are not `Send`; the client runs on a single-threaded event loop.

use crate::model::document::PresentedFile;
use crate::model::export_format::ExportFormat;
use crate::model::note::Note;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

mod http;

pub use http::HttpBackend;

pub type BackendResult<T> = Result<T, BackendError>;

/// Raw export response: declared media type plus body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Failures talking to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Connection, timeout or body read failure.
    Transport(String),
    /// Non-2xx response.
    Status { status: u16, body: String },
    /// 2xx response whose body is not the expected shape.
    Malformed(String),
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "transport failure: {message}"),
            Self::Status { status, body } => {
                write!(f, "backend responded with status {status}: {body}")
            }
            Self::Malformed(message) => write!(f, "malformed backend response: {message}"),
        }
    }
}

impl Error for BackendError {}

#[async_trait(?Send)]
impl<T: NotesBackend + ?Sized> NotesBackend for Rc<T> {
    async fn extract(&self, file: &PresentedFile) -> BackendResult<Vec<Note>> {
        (**self).extract(file).await
    }

    async fn export(&self, format: ExportFormat, notes: &[Note]) -> BackendResult<ExportResponse> {
        (**self).export(format, notes).await
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

/// The two backend operations the review workflow consumes.
#[async_trait(?Send)]
pub trait NotesBackend {
    /// Uploads a document and returns its annotations in document order.
    async fn extract(&self, file: &PresentedFile) -> BackendResult<Vec<Note>>;

    /// Requests a rendered artifact for `notes` in `format`.
    async fn export(&self, format: ExportFormat, notes: &[Note]) -> BackendResult<ExportResponse>;
}
