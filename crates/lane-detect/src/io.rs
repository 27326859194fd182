//! JSON configuration and run report helpers.

use crate::{LaneDetectorParams, LaneResult};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum LaneIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl LaneDetectorParams {
    /// Load parameters from a JSON file; missing fields take their defaults.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, LaneIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write parameters to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), LaneIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// One processed frame in a run report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Where the frame came from (file name, stream index, ...).
    pub source: String,
    /// Wall time spent in the pipeline for this frame.
    pub processing_ms: f64,
    pub result: LaneResult,
}

/// Aggregate timing and detection counts for a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub frames: usize,
    pub average_seconds_per_frame: f64,
    pub average_fps: f64,
    pub left_detected_frames: usize,
    pub right_detected_frames: usize,
    pub departures: usize,
}

impl RunSummary {
    /// Summarize frame records; an empty run yields zeros.
    pub fn from_records(records: &[FrameRecord]) -> Self {
        let frames = records.len();
        if frames == 0 {
            return Self::default();
        }
        let total_s: f64 = records.iter().map(|r| r.processing_ms / 1000.0).sum();
        let average_seconds_per_frame = total_s / frames as f64;
        let average_fps = if average_seconds_per_frame > 0.0 {
            1.0 / average_seconds_per_frame
        } else {
            0.0
        };
        Self {
            frames,
            average_seconds_per_frame,
            average_fps,
            left_detected_frames: records.iter().filter(|r| r.result.left.is_some()).count(),
            right_detected_frames: records.iter().filter(|r| r.result.right.is_some()).count(),
            departures: records.iter().filter(|r| r.result.is_departing()).count(),
        }
    }
}

/// Report written after processing a frame sequence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LaneDetectReport {
    #[serde(default)]
    pub config_path: Option<String>,
    pub params: LaneDetectorParams,
    pub summary: RunSummary,
    pub frames: Vec<FrameRecord>,
}

impl LaneDetectReport {
    pub fn new(
        config_path: Option<String>,
        params: LaneDetectorParams,
        frames: Vec<FrameRecord>,
    ) -> Self {
        Self {
            config_path,
            params,
            summary: RunSummary::from_records(&frames),
            frames,
        }
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, LaneIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), LaneIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
