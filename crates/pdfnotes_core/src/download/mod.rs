//! Local download hand-off.
//!
//! # Responsibility
//! - Materialize export bytes as transient, URL-addressable blobs.
//! - Hand a blob plus file name to the platform's save mechanism.
//!
//! # Invariants
//! - A blob is registered from `acquire` until its handle is dropped; drop
//!   is the only release path, so every exit path releases.
//! - `DirectorySink` never overwrites an existing file.

use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use uuid::Uuid;

const BLOB_URL_PREFIX: &str = "blob:pdfnotes/";
const MAX_NAME_COLLISIONS: u32 = 1000;

type BlobTable = Rc<RefCell<HashMap<Uuid, Rc<[u8]>>>>;

/// Registry of live transient blobs.
#[derive(Debug, Clone, Default)]
pub struct TransientStore {
    blobs: BlobTable,
}

impl TransientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `bytes` and returns the owning handle.
    pub fn acquire(&self, bytes: Vec<u8>) -> TransientBlob {
        let id = Uuid::new_v4();
        let bytes: Rc<[u8]> = Rc::from(bytes);
        self.blobs.borrow_mut().insert(id, Rc::clone(&bytes));
        debug!(
            "event=blob_acquire module=download status=ok bytes={}",
            bytes.len()
        );
        TransientBlob {
            id,
            bytes,
            table: Rc::clone(&self.blobs),
        }
    }

    /// Looks up a live blob by its `blob:` URL.
    pub fn resolve(&self, url: &str) -> Option<Rc<[u8]>> {
        let id = url.strip_prefix(BLOB_URL_PREFIX)?;
        let id = Uuid::parse_str(id).ok()?;
        self.blobs.borrow().get(&id).cloned()
    }

    /// Number of blobs not yet released.
    pub fn live_count(&self) -> usize {
        self.blobs.borrow().len()
    }
}

/// Owning handle to one registered blob. Dropping it releases the blob.
#[derive(Debug)]
pub struct TransientBlob {
    id: Uuid,
    bytes: Rc<[u8]>,
    table: BlobTable,
}

impl TransientBlob {
    pub fn url(&self) -> String {
        format!("{BLOB_URL_PREFIX}{}", self.id)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Drop for TransientBlob {
    fn drop(&mut self) {
        if self.table.borrow_mut().remove(&self.id).is_some() {
            debug!("event=blob_release module=download status=ok");
        }
    }
}

/// Platform save mechanism receiving a blob and a suggested file name.
pub trait DownloadSink {
    /// Saves the blob and returns where it landed.
    fn save(&self, blob: &TransientBlob, file_name: &str) -> std::io::Result<PathBuf>;
}

/// Saves downloads into a directory, suffixing ` (n)` on name collisions.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn save(&self, blob: &TransientBlob, file_name: &str) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        for attempt in 0..MAX_NAME_COLLISIONS {
            let path = self.dir.join(candidate_name(file_name, attempt));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(blob.bytes())?;
                    file.flush()?;
                    return Ok(path);
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(err),
            }
        }
        Err(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free file name for `{file_name}`"),
        ))
    }
}

/// `name.ext`, `name (1).ext`, `name (2).ext`, ...
fn candidate_name(file_name: &str, attempt: u32) -> String {
    if attempt == 0 {
        return file_name.to_string();
    }
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({attempt}).{ext}"),
        _ => format!("{file_name} ({attempt})"),
    }
}

#[cfg(test)]
mod tests {
    use super::{candidate_name, DirectorySink, DownloadSink, TransientStore};

    #[test]
    fn dropping_handle_releases_blob() {
        let store = TransientStore::new();
        let blob = store.acquire(b"hello".to_vec());
        let url = blob.url();
        assert_eq!(store.live_count(), 1);
        assert_eq!(store.resolve(&url).as_deref(), Some(&b"hello"[..]));

        drop(blob);
        assert_eq!(store.live_count(), 0);
        assert!(store.resolve(&url).is_none());
    }

    #[test]
    fn candidate_names_number_collisions() {
        assert_eq!(candidate_name("notes_export.pdf", 0), "notes_export.pdf");
        assert_eq!(candidate_name("notes_export.pdf", 2), "notes_export (2).pdf");
        assert_eq!(candidate_name("README", 1), "README (1)");
    }

    #[test]
    fn directory_sink_never_overwrites() {
        let dir = tempfile::tempdir().expect("temp dir");
        let sink = DirectorySink::new(dir.path());
        let store = TransientStore::new();

        let first = sink
            .save(&store.acquire(b"one".to_vec()), "notes_export.txt")
            .expect("first save");
        let second = sink
            .save(&store.acquire(b"two".to_vec()), "notes_export.txt")
            .expect("second save");

        assert_eq!(first, dir.path().join("notes_export.txt"));
        assert_eq!(second, dir.path().join("notes_export (1).txt"));
        assert_eq!(std::fs::read(&first).expect("read first"), b"one");
        assert_eq!(std::fs::read(&second).expect("read second"), b"two");
    }
}
