//! Snapshot Manager
//!
//! Handles creation, loading, and management of projection snapshots.
//! Snapshots are point-in-time captures of the session map that allow fast
//! startup without replaying the full event log.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::types::{Session, SnapshotMeta};
use crate::utils::atomic_write_with;

use super::store::{EventStoreConfig, EventStoreError, EventStoreResult};

/// Snapshot Manager handles creating and loading snapshots
pub struct SnapshotManager {
    config: EventStoreConfig,
}

impl SnapshotManager {
    /// Create a new SnapshotManager with the given config
    pub fn new(config: EventStoreConfig) -> Self {
        Self { config }
    }

    /// Get path to latest snapshot
    pub fn latest_path(&self) -> PathBuf {
        self.config.latest_snapshot_path()
    }

    /// Get path to previous (backup) snapshot
    pub fn previous_path(&self) -> PathBuf {
        self.config.previous_snapshot_path()
    }

    /// Check if a snapshot exists
    pub fn snapshot_exists(&self) -> bool {
        self.config.latest_snapshot_path().exists()
    }

    /// Create a new snapshot, backing up the previous one
    ///
    /// The snapshot is written atomically (temp file + fsync + rename); the
    /// existing `latest.jsonl` is moved to `previous.jsonl` first so one
    /// known-good generation always survives a crash mid-write.
    pub fn create_snapshot(
        &self,
        last_event_id: u64,
        sessions: &[&Session],
    ) -> EventStoreResult<SnapshotMeta> {
        let latest_path = self.config.latest_snapshot_path();
        let previous_path = self.config.previous_snapshot_path();

        fs::create_dir_all(self.config.snapshots_dir())?;

        // Backup existing snapshot before replacing it
        if latest_path.exists() {
            if previous_path.exists() {
                fs::remove_file(&previous_path)?;
            }
            fs::rename(&latest_path, &previous_path)?;
        }

        let meta = SnapshotMeta::new(last_event_id, sessions.len());
        let meta_line = meta.to_json_line()?;

        atomic_write_with(&latest_path, |file| {
            writeln!(file, "{}", meta_line)?;
            for session in sessions {
                let json = serde_json::to_string(session)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
                writeln!(file, "{}", json)?;
            }
            Ok(())
        })?;

        println!(
            "Created snapshot: {} sessions (event_id: {})",
            sessions.len(),
            last_event_id
        );

        Ok(meta)
    }

    /// Load snapshot metadata only (fast, for checking state)
    pub fn load_meta(&self) -> EventStoreResult<Option<SnapshotMeta>> {
        let path = self.config.latest_snapshot_path();

        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path)?;
        let reader = BufReader::new(file);

        if let Some(first_line) = reader.lines().next() {
            let line = first_line?;
            let meta = SnapshotMeta::from_json_line(&line)?;
            Ok(Some(meta))
        } else {
            Err(EventStoreError::SnapshotCorrupted(
                "Empty snapshot file".to_string(),
            ))
        }
    }

    /// Load the full latest snapshot (metadata + sessions)
    pub fn load_full(&self) -> EventStoreResult<Option<(SnapshotMeta, Vec<Session>)>> {
        let path = self.config.latest_snapshot_path();

        if !path.exists() {
            return Ok(None);
        }

        Self::load_from(&path).map(Some)
    }

    /// Try to recover from the backup snapshot if the primary is corrupted
    pub fn recover_from_backup(&self) -> EventStoreResult<Option<(SnapshotMeta, Vec<Session>)>> {
        let previous_path = self.config.previous_snapshot_path();

        if !previous_path.exists() {
            return Ok(None);
        }

        println!("Attempting recovery from backup snapshot...");
        let (meta, sessions) = Self::load_from(&previous_path)?;
        println!("Recovered from backup: {} sessions", sessions.len());

        Ok(Some((meta, sessions)))
    }

    /// Delete all snapshots (for testing or reset)
    pub fn clear_snapshots(&self) -> EventStoreResult<()> {
        let latest = self.config.latest_snapshot_path();
        let previous = self.config.previous_snapshot_path();

        if latest.exists() {
            fs::remove_file(&latest)?;
        }
        if previous.exists() {
            fs::remove_file(&previous)?;
        }

        Ok(())
    }

    /// Parse a snapshot file: metadata on the first line, one session per
    /// remaining line
    fn load_from(path: &Path) -> EventStoreResult<(SnapshotMeta, Vec<Session>)> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let meta_line = lines
            .next()
            .ok_or_else(|| EventStoreError::SnapshotCorrupted("Empty snapshot".to_string()))??;
        let meta = SnapshotMeta::from_json_line(&meta_line)?;

        let mut sessions = Vec::with_capacity(meta.session_count);

        for (line_num, line_result) in lines.enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }

            let session: Session = serde_json::from_str(&line).map_err(|e| {
                EventStoreError::SnapshotCorrupted(format!("Line {}: {}", line_num + 2, e))
            })?;
            sessions.push(session);
        }

        if sessions.len() != meta.session_count {
            eprintln!(
                "Warning: Expected {} sessions, found {}",
                meta.session_count,
                sessions.len()
            );
        }

        Ok((meta, sessions))
    }
}
