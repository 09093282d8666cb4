//! Annotation record model.
//!
//! # Responsibility
//! - Define one extracted annotation unit (quote and/or personal note).
//! - Map the backend wire shape (`page`, `original_text`, `note`) to Rust fields.
//!
//! # Invariants
//! - `page` is 1-based.
//! - Empty wire strings are normalized to absent text; whitespace is kept.
//! - Records carrying neither text are accepted from the wire as-is;
//!   `validate` reports them for callers that build notes locally.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One extracted annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NoteWire", into = "NoteWire")]
pub struct Note {
    /// 1-based source page.
    pub page: u32,
    /// Highlighted source passage. `None` for standalone notes.
    pub original_text: Option<String>,
    /// Personal annotation text. `None` for bare highlights.
    pub note_text: Option<String>,
}

/// Validation errors for one annotation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Page numbers start at 1.
    ZeroPage,
    /// Neither quote nor note text is present.
    EmptyAnnotation { page: u32 },
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroPage => write!(f, "page must be >= 1"),
            Self::EmptyAnnotation { page } => {
                write!(f, "annotation on page {page} has neither quote nor note")
            }
        }
    }
}

impl Error for NoteValidationError {}

impl Note {
    /// Creates a bare highlight; attach a note with [`Note::with_note`].
    pub fn highlight(page: u32, original_text: impl Into<String>) -> Self {
        Self {
            page,
            original_text: normalize_text(Some(original_text.into())),
            note_text: None,
        }
    }

    /// Creates a standalone note with no underlying highlight.
    pub fn standalone(page: u32, note_text: impl Into<String>) -> Self {
        Self {
            page,
            original_text: None,
            note_text: normalize_text(Some(note_text.into())),
        }
    }

    /// Attaches a personal note, replacing any previous one.
    pub fn with_note(mut self, note_text: impl Into<String>) -> Self {
        self.note_text = normalize_text(Some(note_text.into()));
        self
    }

    /// Checks record invariants.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.page == 0 {
            return Err(NoteValidationError::ZeroPage);
        }
        if self.original_text.is_none() && self.note_text.is_none() {
            return Err(NoteValidationError::EmptyAnnotation { page: self.page });
        }
        Ok(())
    }

    pub fn has_quote(&self) -> bool {
        self.original_text.is_some()
    }

    pub fn has_note(&self) -> bool {
        self.note_text.is_some()
    }
}

/// Backend wire shape. Absent text travels as `""`, which is what the
/// extraction endpoint itself emits and what the export endpoint accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NoteWire {
    page: u32,
    #[serde(default)]
    original_text: Option<String>,
    #[serde(default)]
    note: Option<String>,
}

impl TryFrom<NoteWire> for Note {
    type Error = NoteValidationError;

    fn try_from(value: NoteWire) -> Result<Self, Self::Error> {
        let note = Self {
            page: value.page,
            original_text: normalize_text(value.original_text),
            note_text: normalize_text(value.note),
        };
        if note.page == 0 {
            return Err(NoteValidationError::ZeroPage);
        }
        Ok(note)
    }
}

impl From<Note> for NoteWire {
    fn from(value: Note) -> Self {
        Self {
            page: value.page,
            original_text: Some(value.original_text.unwrap_or_default()),
            note: Some(value.note_text.unwrap_or_default()),
        }
    }
}

fn normalize_text(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{Note, NoteValidationError};

    #[test]
    fn empty_wire_strings_become_absent() {
        let note: Note =
            serde_json::from_str(r#"{"page":2,"original_text":"","note":"Only a note"}"#)
                .expect("valid note");
        assert_eq!(note.original_text, None);
        assert_eq!(note.note_text.as_deref(), Some("Only a note"));
    }

    #[test]
    fn missing_fields_default_to_absent() {
        let note: Note = serde_json::from_str(r#"{"page":3,"note":"Follow up"}"#).expect("valid");
        assert_eq!(note, Note::standalone(3, "Follow up"));
    }

    #[test]
    fn deserialize_rejects_zero_page() {
        let err = serde_json::from_str::<Note>(r#"{"page":0,"original_text":"x"}"#)
            .expect_err("page 0 must be rejected");
        assert!(err.to_string().contains("page must be >= 1"), "{err}");
    }

    #[test]
    fn whitespace_note_is_kept_verbatim() {
        let note: Note =
            serde_json::from_str(r#"{"page":2,"original_text":"","note":"\n"}"#).expect("valid");
        assert_eq!(note.original_text, None);
        assert_eq!(note.note_text.as_deref(), Some("\n"));
        assert!(note.validate().is_ok());
    }

    #[test]
    fn textless_wire_record_is_accepted() {
        let note: Note = serde_json::from_str(r#"{"page":4,"original_text":"","note":""}"#)
            .expect("textless record deserializes");
        assert!(!note.has_quote() && !note.has_note());
    }

    #[test]
    fn validate_rejects_empty_annotation() {
        let note = Note {
            page: 4,
            original_text: None,
            note_text: None,
        };
        assert_eq!(
            note.validate(),
            Err(NoteValidationError::EmptyAnnotation { page: 4 })
        );
    }

    #[test]
    fn serializes_absent_text_as_empty_string() {
        let json = serde_json::to_value(Note::standalone(3, "Follow up")).expect("serialize");
        assert_eq!(json["page"], 3);
        assert_eq!(json["original_text"], "");
        assert_eq!(json["note"], "Follow up");
    }
}
