//! Documents presented for extraction.
//!
//! # Responsibility
//! - Carry a presented file's name, declared media type and payload.
//! - Derive the declared type from a file extension like a browser does.
//!
//! # Invariants
//! - `media_type` is the declared type; content is never sniffed.

use std::path::Path;

/// The only document type the extraction backend accepts.
pub const EXPECTED_MEDIA_TYPE: &str = "application/pdf";

/// A file handed to ingestion via selection or drag-and-drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedFile {
    pub name: String,
    /// Declared media type; empty when unknown.
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl PresentedFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Reads a local file, declaring its type from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|value| value.to_string_lossy().into_owned())
            .unwrap_or_default();
        let media_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or_default()
            .to_string();
        Ok(Self::new(name, media_type, bytes))
    }

    /// Whether the declared type is the expected document type.
    pub fn is_expected_type(&self) -> bool {
        self.media_type
            .split(';')
            .next()
            .map(|essence| essence.trim().eq_ignore_ascii_case(EXPECTED_MEDIA_TYPE))
            .unwrap_or(false)
    }

    pub fn summary(&self) -> FileSummary {
        FileSummary {
            name: self.name.clone(),
            size_bytes: self.bytes.len() as u64,
        }
    }
}

/// Display data retained for an accepted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub name: String,
    pub size_bytes: u64,
}

impl FileSummary {
    /// Size in megabytes with two decimals, e.g. `1.50 MB`.
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.size_bytes as f64 / 1024.0 / 1024.0)
    }
}
