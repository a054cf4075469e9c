//! Cross-process lock file guarding the settings file.
//!
//! A companion process may read or write the same settings file. Both sides
//! agree on a sibling `<file>.lock`: whoever creates it exclusively owns the
//! settings file until the lock file is removed. Waiters poll, bounded by a
//! timeout.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind};
use std::thread;
use std::time::{Duration, Instant};

/// Held ownership of the settings file. Removes the lock file on drop.
#[derive(Debug)]
pub struct FileLockGuard {
    lock_path: Utf8PathBuf,
}

impl FileLockGuard {
    pub fn lock_path(&self) -> &Utf8Path {
        &self.lock_path
    }
}

impl Drop for FileLockGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.lock_path) {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!("Failed to release lock file {}: {}", self.lock_path, e);
            }
        }
    }
}

/// Path of the lock file that guards `target`.
pub fn lock_path_for(target: &Utf8Path) -> Utf8PathBuf {
    let mut name = target.file_name().unwrap_or("settings").to_string();
    name.push_str(".lock");
    target.with_file_name(name)
}

/// Acquire the lock for `target`, polling every `poll` until `timeout` elapses.
///
/// Returns `ErrorKind::TimedOut` when another owner holds the lock for longer
/// than `timeout`.
pub fn acquire(target: &Utf8Path, timeout: Duration, poll: Duration) -> io::Result<FileLockGuard> {
    let lock_path = lock_path_for(target);
    if let Some(parent) = lock_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let started = Instant::now();
    let mut warned = false;

    loop {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(_) => {
                if warned {
                    tracing::debug!(
                        "Acquired {} after waiting {:?}",
                        lock_path,
                        started.elapsed()
                    );
                }
                return Ok(FileLockGuard { lock_path });
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if started.elapsed() >= timeout {
                    return Err(io::Error::new(
                        ErrorKind::TimedOut,
                        format!("lock file {} held for more than {:?}", lock_path, timeout),
                    ));
                }
                if !warned {
                    tracing::warn!("Settings file is locked by another owner, waiting: {}", lock_path);
                    warned = true;
                }
                thread::sleep(poll);
            }
            Err(e) => return Err(e),
        }
    }
}
