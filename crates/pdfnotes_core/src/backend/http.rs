//! HTTP implementation of [`NotesBackend`](super::NotesBackend).

use super::{BackendError, BackendResult, ExportResponse, NotesBackend};
use crate::config::ClientConfig;
use crate::logging::sanitize_message;
use crate::model::document::PresentedFile;
use crate::model::export_format::ExportFormat;
use crate::model::note::Note;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use std::time::Instant;

const PARSE_PATH: &str = "/api/parse";
const EXPORT_PATH: &str = "/api/export";
const UPLOAD_FIELD: &str = "file";
const MAX_ERROR_BODY_CHARS: usize = 200;

/// `reqwest`-backed client for the extraction and export endpoints.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Builds a client honoring the configured base URL and timeout.
    pub fn new(config: &ClientConfig) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, config.api_base_url.as_str()))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn parse_url(&self) -> String {
        format!("{}{PARSE_PATH}", self.base_url)
    }

    fn export_url(&self, format: ExportFormat) -> String {
        format!("{}{EXPORT_PATH}/{}", self.base_url, format.as_str())
    }
}

#[async_trait(?Send)]
impl NotesBackend for HttpBackend {
    async fn extract(&self, file: &PresentedFile) -> BackendResult<Vec<Note>> {
        let started_at = Instant::now();
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.media_type)?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .client
            .post(self.parse_url())
            .multipart(form)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let body = response.bytes().await?;

        let notes: Vec<Note> = serde_json::from_slice(&body)
            .map_err(|err| BackendError::Malformed(err.to_string()))?;
        debug!(
            "event=backend_extract module=backend status=ok notes={} duration_ms={}",
            notes.len(),
            started_at.elapsed().as_millis()
        );
        Ok(notes)
    }

    async fn export(&self, format: ExportFormat, notes: &[Note]) -> BackendResult<ExportResponse> {
        let started_at = Instant::now();
        let response = self
            .client
            .post(self.export_url(format))
            .json(notes)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        debug!(
            "event=backend_export module=backend status=ok format={} bytes={} duration_ms={}",
            format,
            body.len(),
            started_at.elapsed().as_millis()
        );
        Ok(ExportResponse { content_type, body })
    }
}

async fn ensure_success(response: Response) -> BackendResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(
        "event=backend_status module=backend status=error http_status={}",
        status.as_u16()
    );
    Err(BackendError::Status {
        status: status.as_u16(),
        body: sanitize_message(&body, MAX_ERROR_BODY_CHARS),
    })
}

#[cfg(test)]
mod tests {
    use super::HttpBackend;
    use crate::model::export_format::ExportFormat;
    use reqwest::Client;

    #[test]
    fn endpoint_urls_strip_trailing_slash() {
        let backend = HttpBackend::with_client(Client::new(), "http://localhost:8000/");
        assert_eq!(backend.parse_url(), "http://localhost:8000/api/parse");
        assert_eq!(
            backend.export_url(ExportFormat::Docx),
            "http://localhost:8000/api/export/docx"
        );
    }
}
