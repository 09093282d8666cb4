//! Review projection with per-item expand/collapse.
//!
//! # Responsibility
//! - Project the collection into display items in collection order.
//! - Track UI-local expansion flags keyed by item position.
//!
//! # Invariants
//! - Never mutates the collection; no network interaction.
//! - Expansion flags default to collapsed and are independent per item.
//! - Flags are dropped when the collection generation changes.

use crate::model::collection::NoteReader;
use std::collections::BTreeMap;

/// Notes longer than this (in characters) collapse by default.
pub const LONG_NOTE_THRESHOLD_CHARS: usize = 150;
/// Display lines kept for a collapsed long note.
pub const COLLAPSED_NOTE_LINES: usize = 3;
/// Characters per display line when clamping.
pub const DISPLAY_LINE_WIDTH: usize = 80;

const ELLIPSIS: char = '…';

/// One displayed annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewItem {
    /// Position in the collection; the item's identity.
    pub index: usize,
    pub page: u32,
    pub original_text: Option<String>,
    pub note_text: Option<String>,
    /// Note exceeds the long-note threshold and offers a toggle.
    pub collapsible: bool,
    pub expanded: bool,
}

impl ReviewItem {
    /// `Page N`
    pub fn page_label(&self) -> String {
        format!("Page {}", self.page)
    }

    /// Note body as displayed: clamped when long and collapsed.
    pub fn visible_note(&self) -> Option<String> {
        let note = self.note_text.as_deref()?;
        if self.collapsible && !self.expanded {
            return Some(clamp_lines(note, COLLAPSED_NOTE_LINES, DISPLAY_LINE_WIDTH));
        }
        Some(note.to_string())
    }

    /// `Show More` / `Show Less`, only for collapsible items.
    pub fn toggle_label(&self) -> Option<&'static str> {
        match (self.collapsible, self.expanded) {
            (false, _) => None,
            (true, false) => Some("Show More"),
            (true, true) => Some("Show Less"),
        }
    }
}

/// Display state over the current collection.
#[derive(Debug)]
pub struct ReviewView {
    notes: NoteReader,
    expanded: BTreeMap<usize, bool>,
    generation: u64,
}

impl ReviewView {
    pub fn new(notes: NoteReader) -> Self {
        let generation = notes.generation();
        Self {
            notes,
            expanded: BTreeMap::new(),
            generation,
        }
    }

    /// Whether there is anything to show.
    pub fn is_visible(&self) -> bool {
        !self.notes.is_empty()
    }

    /// `Extracted Notes (N)`
    pub fn heading(&self) -> String {
        format!("Extracted Notes ({})", self.notes.len())
    }

    pub fn items(&self) -> Vec<ReviewItem> {
        let collection = self.notes.read();
        let current = collection.generation() == self.generation;
        collection
            .iter()
            .enumerate()
            .map(|(index, note)| ReviewItem {
                index,
                page: note.page,
                original_text: note.original_text.clone(),
                note_text: note.note_text.clone(),
                collapsible: is_long_note(note.note_text.as_deref()),
                expanded: current && self.expanded.get(&index).copied().unwrap_or(false),
            })
            .collect()
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.generation_is_current() && self.expanded.get(&index).copied().unwrap_or(false)
    }

    /// Flips one item's flag. Returns the new value, or `None` when the
    /// item does not exist or has no toggle.
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        self.sync_generation();
        let collapsible = {
            let collection = self.notes.read();
            let note = collection.get(index)?;
            is_long_note(note.note_text.as_deref())
        };
        if !collapsible {
            return None;
        }
        let flag = self.expanded.entry(index).or_insert(false);
        *flag = !*flag;
        Some(*flag)
    }

    /// Sets every collapsible item to `expanded`.
    pub fn set_all_expanded(&mut self, expanded: bool) {
        self.sync_generation();
        let collection = self.notes.read();
        for (index, note) in collection.iter().enumerate() {
            if is_long_note(note.note_text.as_deref()) {
                self.expanded.insert(index, expanded);
            }
        }
    }

    fn generation_is_current(&self) -> bool {
        self.notes.generation() == self.generation
    }

    fn sync_generation(&mut self) {
        let generation = self.notes.generation();
        if generation != self.generation {
            self.expanded.clear();
            self.generation = generation;
        }
    }
}

fn is_long_note(note: Option<&str>) -> bool {
    note.is_some_and(|text| text.chars().count() > LONG_NOTE_THRESHOLD_CHARS)
}

/// Wraps `text` at `width` characters and keeps the first `max_lines`
/// display lines, appending an ellipsis when something was cut.
fn clamp_lines(text: &str, max_lines: usize, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    for raw in text.split('\n') {
        let chars: Vec<char> = raw.chars().collect();
        if chars.is_empty() {
            lines.push(String::new());
        } else {
            lines.extend(chars.chunks(width).map(|chunk| chunk.iter().collect()));
        }
        if lines.len() > max_lines {
            break;
        }
    }

    if lines.len() <= max_lines {
        return text.to_string();
    }
    let mut clamped = lines[..max_lines].join("\n");
    clamped.push(ELLIPSIS);
    clamped
}
