use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How long writers wait for another `dp` process before giving up
pub const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const LOCK_POLL: Duration = Duration::from_millis(10);

/// Exclusive advisory lock on the data directory, held while a file is
/// being replaced. The TUI and CLI both take it before writing.
pub struct FileLock {
    _file: File,
    path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("timed out waiting for {path}; is another dp process writing?")]
    Timeout { path: PathBuf },
}

impl FileLock {
    /// Lock `dir/.lock`, polling until `timeout` elapses.
    pub fn acquire(dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = dir.join(".lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Open {
                path: path.clone(),
                source,
            })?;

        let deadline = Instant::now() + timeout;
        while try_lock(&file).is_err() {
            if Instant::now() >= deadline {
                return Err(LockError::Timeout { path });
            }
            std::thread::sleep(LOCK_POLL);
        }
        Ok(FileLock { _file: file, path })
    }

    pub fn acquire_default(dir: &Path) -> Result<Self, LockError> {
        Self::acquire(dir, LOCK_TIMEOUT)
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // flock is released with the descriptor
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(unix)]
fn try_lock(file: &File) -> std::io::Result<()> {
    use std::os::unix::io::AsRawFd;
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lock_is_reusable_after_drop() {
        let tmp = TempDir::new().unwrap();
        let lock = FileLock::acquire_default(tmp.path()).unwrap();
        assert!(tmp.path().join(".lock").exists());
        drop(lock);
        assert!(FileLock::acquire_default(tmp.path()).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn second_writer_times_out() {
        let tmp = TempDir::new().unwrap();
        let _held = FileLock::acquire_default(tmp.path()).unwrap();
        let err = FileLock::acquire(tmp.path(), Duration::from_millis(50)).err();
        assert!(matches!(err, Some(LockError::Timeout { .. })));
    }
}
