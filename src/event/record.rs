//! NDJSON event recorder
//!
//! Writes envelopes to newline-delimited JSON files so external tooling can
//! replay or diff an agent's run after the fact. One file per recording,
//! one envelope per line.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use parking_lot::Mutex;

use crate::error::{CanopyError, Result};
use crate::event::envelope::EventEnvelope;

/// Default directory for recording files
pub(crate) const RECORD_DIR: &str = ".canopy/recordings";

/// NDJSON recording writer
#[derive(Debug)]
pub struct EventRecorder {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl EventRecorder {
    /// Create a recorder under the default directory
    ///
    /// # Security
    ///
    /// The recording_id is validated to prevent path traversal attacks.
    /// Only alphanumeric characters, hyphens, and underscores are allowed.
    pub fn create(recording_id: &str) -> Result<Self> {
        Self::create_in(Path::new(RECORD_DIR), recording_id)
    }

    /// Create a recorder in an explicit directory (config override, tests)
    pub fn create_in(dir: &Path, recording_id: &str) -> Result<Self> {
        validate_recording_id(recording_id)?;

        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.ndjson", recording_id));
        let file = File::create(&path)?;

        tracing::info!(path = %path.display(), "created recording file");

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path,
        })
    }

    /// Append a single envelope
    pub fn record(&self, envelope: &EventEnvelope) -> Result<()> {
        let json = serde_json::to_string(envelope)?;

        let mut writer = self.writer.lock();
        writeln!(writer, "{}", json)?;
        writer.flush()?;

        Ok(())
    }

    /// The recording file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and finish the recording
    pub fn finish(&self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }
}

fn validate_recording_id(id: &str) -> Result<()> {
    if id.is_empty()
        || id.contains("..")
        || id.contains('/')
        || id.contains('\\')
        || !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == 'T')
    {
        return Err(CanopyError::InvalidRecordingId {
            id: id.to_string(),
            reason: "must be alphanumeric with hyphens/underscores only".to_string(),
        });
    }
    Ok(())
}

/// Generate a unique recording id
///
/// Format: `YYYY-MM-DDTHH-MM-SS-XXXX` where XXXX is random hex
pub fn generate_recording_id() -> String {
    use chrono::Utc;

    let now = Utc::now();
    let timestamp = now.format("%Y-%m-%dT%H-%M-%S");
    let random: u32 = rand::random::<u32>() % 0x10000; // 4 hex digits

    format!("{}-{:04x}", timestamp, random)
}

/// Metadata about one recording file
#[derive(Debug, Clone)]
pub struct RecordingInfo {
    pub recording_id: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub created: Option<SystemTime>,
}

/// List recordings in the default directory
pub fn list_recordings() -> Result<Vec<RecordingInfo>> {
    list_recordings_in(Path::new(RECORD_DIR))
}

/// List recordings in an explicit directory
pub fn list_recordings_in(dir: &Path) -> Result<Vec<RecordingInfo>> {
    if !dir.exists() {
        return Ok(vec![]);
    }

    let mut recordings = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.extension().map(|e| e == "ndjson").unwrap_or(false) {
            let metadata = entry.metadata()?;
            let recording_id = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown")
                .to_string();

            recordings.push(RecordingInfo {
                recording_id,
                path,
                size_bytes: metadata.len(),
                created: metadata.created().ok(),
            });
        }
    }

    recordings.sort_by(|a, b| a.recording_id.cmp(&b.recording_id));
    Ok(recordings)
}
