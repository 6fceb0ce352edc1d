use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::config::RecordConfig;
use super::format::AudioFormat;

/// What a finished recording session captured.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSummary {
    /// Total bytes written to the sink, including a dangling odd byte.
    pub bytes_written: u64,
    /// Whether the capture ended on an odd byte boundary.
    pub odd_length: bool,
    pub format: AudioFormat,
    pub sample_rate: u16,
    /// Last elapsed-time estimate observed from the sample counter.
    pub duration_secs: f64,
}

/// Result returned when recording to a file path completes.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub summary: RecordingSummary,
    pub metadata: RecordingMetadata,
    /// SHA-256 hex digest of the finished file.
    pub checksum: String,
}

/// Metadata written as a JSON sidecar next to a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub created_at: String,
    pub duration_secs: f64,
    pub file_path: String,
    pub format: String,
    pub sample_rate: u16,
    pub channels: String,
    pub file_size: u64,
    pub checksum: String,
}

impl RecordingMetadata {
    pub fn new(
        summary: &RecordingSummary,
        config: &RecordConfig,
        path: &Path,
        checksum: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            duration_secs: summary.duration_secs,
            file_path: path.to_string_lossy().into_owned(),
            format: summary.format.to_string(),
            sample_rate: summary.sample_rate,
            channels: if config.adc_mode.is_stereo() {
                "stereo".to_string()
            } else {
                "mono".to_string()
            },
            file_size: summary.bytes_written,
            checksum: checksum.to_string(),
        }
    }
}
