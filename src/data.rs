// src/data.rs - Per-frame session log with CSV and JSON summary export
use crate::controller::{AppMode, AppState, FrameOutput};
use crate::effects::SideEffect;
use anyhow::{Context, Result};
use chrono::Local;
use csv::Writer;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
struct FrameRecord {
    timestamp: f64,
    frame: usize,
    mode: &'static str,
    scan_progress: u8,
    hands: usize,
    gesture: &'static str,
    cursor_x: f64,
    cursor_y: f64,
    pinch_distance: Option<f64>,
    path_points: usize,
    strokes: usize,
    typed_text: String,
    hologram_text: String,
    alert: bool,
    smiling: bool,
    processing: bool,
    // Labels joined with '|'
    effects: String,
}

impl FrameRecord {
    fn new(frame: usize, timestamp: f64, state: &AppState, effects: &[SideEffect]) -> Self {
        Self {
            timestamp,
            frame,
            mode: state.mode.as_str(),
            scan_progress: state.scan_progress,
            hands: state.raw_landmarks.len(),
            gesture: state.gesture.gesture_type.as_str(),
            cursor_x: state.gesture.position.0,
            cursor_y: state.gesture.position.1,
            pinch_distance: state.gesture.pinch_distance,
            path_points: state.drawing_path.len(),
            strokes: state.drawing_path.strokes().len(),
            typed_text: state.typed_text.clone(),
            hologram_text: state.hologram_text.clone(),
            alert: state.expressions.alert,
            smiling: state.expressions.smiling,
            processing: state.is_processing,
            effects: effects
                .iter()
                .map(SideEffect::label)
                .collect::<Vec<_>>()
                .join("|"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionRecord {
    pub timestamp_ms: f64,
    pub from: AppMode,
    pub to: AppMode,
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub session: String,
    pub frames: usize,
    pub skipped_frames: usize,
    pub frames_per_mode: BTreeMap<&'static str, usize>,
    pub transitions: Vec<TransitionRecord>,
    pub announcements: Vec<String>,
    pub final_mode: Option<AppMode>,
    pub final_hologram_text: String,
}

pub struct SessionLog {
    output_dir: PathBuf,
    session_name: String,
    records: Vec<FrameRecord>,
    transitions: Vec<TransitionRecord>,
    announcements: Vec<String>,
    skipped_frames: usize,
    last_state: Option<AppState>,
}

impl SessionLog {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name
            .unwrap_or_else(|| format!("session_{}", Local::now().format("%Y%m%d_%H%M%S")));

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
            records: Vec::new(),
            transitions: Vec::new(),
            announcements: Vec::new(),
            skipped_frames: 0,
            last_state: None,
        }
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn frame_count(&self) -> usize {
        self.records.len()
    }

    pub fn add_frame(&mut self, timestamp: f64, output: &FrameOutput) {
        let record = FrameRecord::new(self.records.len(), timestamp, &output.state, &output.effects);
        self.records.push(record);

        if let Some((from, to)) = output.transition {
            self.transitions.push(TransitionRecord {
                timestamp_ms: timestamp,
                from,
                to,
            });
        }
        self.note_effects(&output.effects);
        self.last_state = Some((*output.state).clone());
    }

    /// Effects produced outside a frame (keys, a completed analysis).
    pub fn add_effects(&mut self, state: &AppState, effects: &[SideEffect]) {
        self.note_effects(effects);
        self.last_state = Some(state.clone());
    }

    pub fn add_skipped(&mut self) {
        self.skipped_frames += 1;
    }

    fn note_effects(&mut self, effects: &[SideEffect]) {
        for effect in effects {
            if let SideEffect::Announce { text } = effect {
                self.announcements.push(text.clone());
            }
        }
    }

    fn session_dir(&self) -> PathBuf {
        self.output_dir.join(&self.session_name)
    }

    pub fn export_csv(&self) -> Result<PathBuf> {
        let csv_path = self.session_dir().join("frames.csv");
        if let Some(parent) = csv_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let file = File::create(&csv_path)
            .with_context(|| format!("Failed to create {}", csv_path.display()))?;
        let mut writer = Writer::from_writer(file);
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(csv_path)
    }

    pub fn summary(&self) -> SessionSummary {
        let mut frames_per_mode = BTreeMap::new();
        for record in &self.records {
            *frames_per_mode.entry(record.mode).or_insert(0) += 1;
        }

        SessionSummary {
            session: self.session_name.clone(),
            frames: self.records.len(),
            skipped_frames: self.skipped_frames,
            frames_per_mode,
            transitions: self.transitions.clone(),
            announcements: self.announcements.clone(),
            final_mode: self.last_state.as_ref().map(|s| s.mode),
            final_hologram_text: self
                .last_state
                .as_ref()
                .map(|s| s.hologram_text.clone())
                .unwrap_or_default(),
        }
    }

    pub fn export_summary(&self) -> Result<PathBuf> {
        let summary_path = self.session_dir().join("summary.json");
        if let Some(parent) = summary_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.summary())?;
        std::fs::write(&summary_path, json)
            .with_context(|| format!("Failed to write {}", summary_path.display()))?;
        Ok(summary_path)
    }
}
