use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::io::lock::{DocumentLock, LockError};
use crate::model::config::BoardConfig;
use crate::model::edit::TaskEdit;
use crate::parse::{SerializeError, apply_edit_with};

/// Error type for host document operations
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("no active document at {0}")]
    NoActiveDocument(PathBuf),
    #[error("could not access {path}: {source}")]
    OperationFailed { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error(transparent)]
    Edit(#[from] SerializeError),
}

/// Read/write access to the live text of one board document.
///
/// The board core never touches storage; every edit goes through a host.
pub trait DocumentHost {
    /// Current text, including unsaved changes. An empty document is `""`.
    fn current_text(&self) -> Result<String, HostError>;

    /// Replace the whole buffer
    fn replace_text(&mut self, text: String) -> Result<(), HostError>;

    /// Persist the buffer
    fn save(&mut self) -> Result<(), HostError>;

    /// Drop unsaved changes and reload the stored text
    fn revert(&mut self) -> Result<(), HostError>;

    /// Take exclusive access for one edit cycle. Hosts without a shared
    /// backing store return `None`.
    fn lock(&mut self) -> Result<Option<DocumentLock>, HostError> {
        Ok(None)
    }
}

/// A board document backed by a file on disk
#[derive(Debug)]
pub struct FileDocument {
    path: PathBuf,
    text: String,
    dirty: bool,
}

impl FileDocument {
    /// Open an existing document. A missing file is no active document.
    pub fn open(path: &Path) -> Result<FileDocument, HostError> {
        let text = read_document(path)?;
        Ok(FileDocument {
            path: path.to_path_buf(),
            text,
            dirty: false,
        })
    }

    /// Open a document, starting from an empty buffer if the file does not
    /// exist yet. The file is created on the first save.
    pub fn open_or_new(path: &Path) -> Result<FileDocument, HostError> {
        match FileDocument::open(path) {
            Err(HostError::NoActiveDocument(_)) => Ok(FileDocument {
                path: path.to_path_buf(),
                text: String::new(),
                dirty: false,
            }),
            other => other,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl DocumentHost for FileDocument {
    fn current_text(&self) -> Result<String, HostError> {
        Ok(self.text.clone())
    }

    fn replace_text(&mut self, text: String) -> Result<(), HostError> {
        if text != self.text {
            self.text = text;
            self.dirty = true;
        }
        Ok(())
    }

    fn save(&mut self) -> Result<(), HostError> {
        atomic_write(&self.path, self.text.as_bytes()).map_err(|e| HostError::OperationFailed {
            path: self.path.clone(),
            source: e,
        })?;
        self.dirty = false;
        tracing::info!(path = %self.path.display(), bytes = self.text.len(), "saved document");
        Ok(())
    }

    fn revert(&mut self) -> Result<(), HostError> {
        self.text = match read_document(&self.path) {
            Ok(text) => text,
            Err(HostError::NoActiveDocument(_)) => String::new(),
            Err(e) => return Err(e),
        };
        self.dirty = false;
        Ok(())
    }

    /// Locks the file and, if the buffer has no unsaved changes, reloads it
    /// so the edit applies to what is on disk now.
    fn lock(&mut self) -> Result<Option<DocumentLock>, HostError> {
        let lock = DocumentLock::acquire_default(&self.path)?;
        if !self.dirty {
            self.revert()?;
        }
        Ok(Some(lock))
    }
}

fn read_document(path: &Path) -> Result<String, HostError> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => HostError::NoActiveDocument(path.to_path_buf()),
        _ => HostError::OperationFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })
}

/// Write through a temp file in the same directory, then rename over `path`
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// One full edit cycle: lock, read, apply, replace, save.
///
/// Returns the new text. On any error the stored document is unchanged; an
/// edit that fails to apply leaves the buffer untouched too.
pub fn edit_document<H: DocumentHost>(
    host: &mut H,
    edit: &TaskEdit,
    base: &BoardConfig,
) -> Result<String, HostError> {
    let _lock = host.lock()?;
    let current = host.current_text()?;
    let updated = apply_edit_with(&current, edit, base)?;
    host.replace_text(updated.clone())?;
    host.save()?;
    Ok(updated)
}
