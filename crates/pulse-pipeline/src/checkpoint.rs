//! Durable progress record for an in-flight enrichment run.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use pulse_core::defaults;
use pulse_core::{Checkpoint, Error, Mention, Result};

/// Digest of the ordered composite keys a run enriches.
pub fn run_scope_id(to_enrich: &[Mention]) -> String {
    let mut hasher = Sha256::new();
    for mention in to_enrich {
        hasher.update(mention.key().to_string().as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

/// File-backed checkpoint storage with atomic replacement.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default checkpoint file name inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(defaults::CHECKPOINT_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the checkpoint, if one is present and readable.
    ///
    /// An unreadable checkpoint is discarded with a warning; the batches it
    /// described are simply sent again.
    pub fn load(&self) -> Option<Checkpoint> {
        if !self.path.exists() {
            return None;
        }
        let parsed = fs::read(&self.path)
            .map_err(|e| e.to_string())
            .and_then(|b| serde_json::from_slice::<Checkpoint>(&b).map_err(|e| e.to_string()));
        match parsed {
            Ok(checkpoint) => {
                debug!(
                    run_scope_id = %checkpoint.run_scope_id,
                    completed = checkpoint.completed_batches.len(),
                    "Checkpoint loaded"
                );
                Some(checkpoint)
            }
            Err(e) => {
                warn!(
                    subsystem = "pipeline",
                    component = "checkpoint",
                    path = %self.path.display(),
                    error = %e,
                    "Checkpoint unreadable, ignoring"
                );
                None
            }
        }
    }

    /// Durably replace the checkpoint.
    ///
    /// Writes a sibling temp file, syncs it and renames it over the target,
    /// so a reader sees either the old or the new checkpoint. Any failure is
    /// [`Error::CheckpointPersistence`].
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let persist = |e: std::io::Error| {
            Error::CheckpointPersistence(format!("{}: {}", self.path.display(), e))
        };

        let bytes = serde_json::to_vec(checkpoint)
            .map_err(|e| Error::CheckpointPersistence(e.to_string()))?;
        let tmp = self.tmp_path();

        let mut file = File::create(&tmp).map_err(persist)?;
        file.write_all(&bytes).map_err(persist)?;
        file.sync_all().map_err(persist)?;
        drop(file);
        fs::rename(&tmp, &self.path).map_err(persist)?;

        debug!(
            run_scope_id = %checkpoint.run_scope_id,
            completed = checkpoint.completed_batches.len(),
            "Checkpoint written"
        );
        Ok(())
    }

    /// Remove the checkpoint after a completed run.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Checkpoint cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::CheckpointPersistence(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
