//! Advisory lock serializing runs over one data directory.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use pulse_core::defaults;
use pulse_core::{Error, Result};

/// Exclusive hold on `<data_dir>/.pulse.lock`, released on drop.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Take the lock without waiting.
    ///
    /// Fails with [`Error::RunLocked`] when another run holds it.
    pub fn acquire(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join(defaults::LOCK_FILE);

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        if file.try_lock_exclusive().is_err() {
            return Err(Error::RunLocked(format!(
                "another run holds {}",
                path.display()
            )));
        }

        file.set_len(0)?;
        writeln!(file, "pid={}", std::process::id())?;
        file.flush()?;

        debug!(path = %path.display(), "Run lock acquired");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let first = RunLock::acquire(dir.path()).unwrap();
        assert!(first.path().ends_with(".pulse.lock"));

        let err = RunLock::acquire(dir.path()).unwrap_err();
        assert!(matches!(err, Error::RunLocked(_)));

        drop(first);
        assert!(RunLock::acquire(dir.path()).is_ok());
    }
}
