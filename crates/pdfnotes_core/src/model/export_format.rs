//! Export target formats.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Fixed stem shared by every downloaded export file.
pub const EXPORT_FILE_STEM: &str = "notes_export";

/// Output formats the export backend can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExportFormat {
    Txt,
    Docx,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [Self::Txt, Self::Docx, Self::Pdf];

    /// Path segment used by the export endpoint (`/api/export/{format}`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }

    /// File extension for the downloaded artifact, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }

    /// Short button label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Txt => "TXT",
            Self::Docx => "Word",
            Self::Pdf => "PDF",
        }
    }

    /// `notes_export.<ext>`
    pub fn file_name(self) -> String {
        format!("{EXPORT_FILE_STEM}.{}", self.extension())
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected format name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedFormat(pub String);

impl Display for UnsupportedFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported export format `{}`; expected txt|docx|pdf",
            self.0
        )
    }
}

impl Error for UnsupportedFormat {}

impl FromStr for ExportFormat {
    type Err = UnsupportedFormat;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "txt" => Ok(Self::Txt),
            "docx" => Ok(Self::Docx),
            "pdf" => Ok(Self::Pdf),
            _ => Err(UnsupportedFormat(value.to_string())),
        }
    }
}
