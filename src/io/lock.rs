use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Advisory lock held for one edit cycle on a board document.
///
/// Uses flock (Unix) on a sibling `.<name>.lock` file so that two `mdb`
/// processes never apply edits to the same stale text. The document itself
/// is not locked: saves replace it by rename.
#[derive(Debug)]
pub struct DocumentLock {
    _file: File,
    path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not lock {path}: another edit is in progress")]
    Timeout { path: PathBuf },
    #[error("lock error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DocumentLock {
    /// Lock `document`, blocking up to `timeout`.
    pub fn acquire(document: &Path, timeout: Duration) -> Result<Self, LockError> {
        let lock_path = lock_path_for(document);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| LockError::CreateError {
                path: lock_path.clone(),
                source: e,
            })?;

        let start = Instant::now();
        loop {
            match try_lock(&file) {
                Ok(()) => {
                    tracing::debug!(path = %lock_path.display(), "acquired document lock");
                    return Ok(DocumentLock {
                        _file: file,
                        path: lock_path,
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() >= timeout {
                        return Err(LockError::Timeout { path: lock_path });
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(e) => return Err(LockError::IoError(e)),
            }
        }
    }

    /// Acquire with the default timeout (5 seconds)
    pub fn acquire_default(document: &Path) -> Result<Self, LockError> {
        Self::acquire(document, Duration::from_secs(5))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// Released on drop. The lock file is left in place so every process
// flocks the same inode.

/// `dir/board.md` -> `dir/.board.md.lock`
pub fn lock_path_for(document: &Path) -> PathBuf {
    let name = document
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "board".to_string());
    let dir = match document.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    dir.join(format!(".{}.lock", name))
}

/// Try to acquire an exclusive flock on the file (non-blocking)
#[cfg(unix)]
fn try_lock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let fd = file.as_raw_fd();
    let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<(), std::io::Error> {
    Ok(())
}
