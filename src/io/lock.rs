use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Advisory file lock for serializing access to the local board file.
///
/// `LocalApi::with_data` holds one guard across its whole cycle: load
/// `board.json`, apply the change, write it back through a temp file. Uses
/// platform-native flock (Unix) so a TUI session and CLI commands never
/// interleave that cycle; the second writer waits and then reads the first
/// writer's result.
pub struct FileLock {
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
    #[error("could not acquire lock on {path}: another tb process is using the board")]
    Timeout { path: PathBuf },
    #[error("lock error: {0}")]
    IoError(#[from] std::io::Error),
}

impl FileLock {
    /// Acquire an advisory lock on the board directory.
    /// Blocks up to `timeout` waiting for the lock.
    pub fn acquire(board_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let lock_path = board_dir.join(".lock");
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
                    return Ok(FileLock {
                        _file: file,
                        path: lock_path,
                    });
                }
                Err(_) if start.elapsed() < timeout => {
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(_) => {
                    return Err(LockError::Timeout { path: lock_path });
                }
            }
        }
    }

    /// Acquire with default timeout (5 seconds).
    ///
    /// The lock is released when the returned guard is dropped. The `.lock`
    /// file is left in place: unlinking it would let a waiter lock a stale
    /// inode while a newcomer locks a fresh one.
    pub fn acquire_default(board_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(board_dir, Duration::from_secs(5))
    }
}

impl FileLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
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
    // On non-Unix platforms, just succeed (advisory locking)
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_and_release_lock() {
        let tmp = TempDir::new().unwrap();
        let board_dir = tmp.path().join(".taskboard");
        fs::create_dir_all(&board_dir).unwrap();

        let lock = FileLock::acquire_default(&board_dir);
        assert!(lock.is_ok());
        assert!(board_dir.join(".lock").exists());

        drop(lock);
        let lock2 = FileLock::acquire_default(&board_dir);
        assert!(lock2.is_ok());
    }

    #[test]
    fn test_lock_contention() {
        let tmp = TempDir::new().unwrap();
        let board_dir = tmp.path().join(".taskboard");
        fs::create_dir_all(&board_dir).unwrap();

        let _lock1 = FileLock::acquire_default(&board_dir).unwrap();

        // Second lock should timeout quickly
        let lock2 = FileLock::acquire(&board_dir, Duration::from_millis(50));
        assert!(lock2.is_err());
    }

    #[test]
    fn test_waiter_gets_lock_after_holder_finishes() {
        let tmp = TempDir::new().unwrap();
        let board_dir = tmp.path().join(".taskboard");
        fs::create_dir_all(&board_dir).unwrap();
        let board_file = board_dir.join("board.json");
        fs::write(&board_file, "1").unwrap();

        let lock1 = FileLock::acquire_default(&board_dir).unwrap();
        let dir = board_dir.clone();
        let file = board_file.clone();
        let waiter = std::thread::spawn(move || {
            let _lock = FileLock::acquire(&dir, Duration::from_secs(5)).unwrap();
            fs::read_to_string(&file).unwrap()
        });

        // finish the write while the other side is blocked
        std::thread::sleep(Duration::from_millis(50));
        fs::write(&board_file, "2").unwrap();
        drop(lock1);

        assert_eq!(waiter.join().unwrap(), "2");
    }
}
