// src/replay.rs - Drives the controller from a recorded event stream
use crate::config::{AppSettings, ControllerConfig};
use crate::controller::{AppState, Controller};
use crate::data::SessionLog;
use crate::effects::{EffectSink, SideEffect, TracingSink};
use crate::landmarks::{InputEvent, KeyInput, LandmarkSource, RecordedSource};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub frames: usize,
    pub skipped_frames: usize,
    pub keys: usize,
    pub effects: usize,
}

pub struct Replay<S: EffectSink> {
    controller: Controller,
    sink: S,
    log: SessionLog,
    stats: ReplayStats,
    realtime: bool,
    last_timestamp: Option<f64>,
}

impl<S: EffectSink> Replay<S> {
    pub fn new(controller: Controller, sink: S, log: SessionLog) -> Self {
        Self {
            controller,
            sink,
            log,
            stats: ReplayStats::default(),
            realtime: false,
            last_timestamp: None,
        }
    }

    /// Sleep between events so they play back at their recorded pace.
    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn stats(&self) -> ReplayStats {
        self.stats
    }

    pub fn state(&self) -> Arc<AppState> {
        self.controller.snapshot()
    }

    /// Consume the whole source, then let any in-flight analysis finish.
    pub async fn drive<L: LandmarkSource>(&mut self, source: &mut L) -> Result<()> {
        while let Some(event) = source.next_event()? {
            let timestamp = event.timestamp_ms();
            self.pace(timestamp).await;
            self.handle_event(event, timestamp);
        }

        if let Some(deadline) = self.controller.analysis_deadline() {
            debug!("Input ended, waiting for analysis due at {} ms", deadline);
            self.pace(deadline).await;
            let effects = self.controller.poll(deadline);
            self.dispatch(&effects);
            self.log.add_effects(&self.controller.snapshot(), &effects);
        }

        Ok(())
    }

    fn handle_event(&mut self, event: InputEvent, timestamp: f64) {
        match event {
            InputEvent::Frame(frame) => match self.controller.process_frame(&frame, timestamp) {
                Ok(output) => {
                    self.stats.frames += 1;
                    self.dispatch(&output.effects);
                    self.log.add_frame(timestamp, &output);
                }
                Err(e) => {
                    warn!("Skipping frame at {} ms: {}", timestamp, e);
                    self.stats.skipped_frames += 1;
                    self.log.add_skipped();
                    // The clock still advances for a rejected frame.
                    let effects = self.controller.poll(timestamp);
                    self.dispatch(&effects);
                    self.log.add_effects(&self.controller.snapshot(), &effects);
                }
            },
            InputEvent::Key { key, .. } => match KeyInput::from_key_name(&key) {
                Some(input) => {
                    self.stats.keys += 1;
                    let effects = self.controller.handle_key(input, timestamp);
                    self.dispatch(&effects);
                    self.log.add_effects(&self.controller.snapshot(), &effects);
                }
                None => warn!("Ignoring unsupported key {:?}", key),
            },
        }
    }

    fn dispatch(&mut self, effects: &[SideEffect]) {
        for effect in effects {
            self.sink.dispatch(effect);
        }
        self.stats.effects += effects.len();
    }

    async fn pace(&mut self, timestamp: f64) {
        if let (true, Some(previous)) = (self.realtime, self.last_timestamp) {
            let gap_ms = timestamp - previous;
            if gap_ms > 0.0 {
                match Duration::try_from_secs_f64(gap_ms / 1000.0) {
                    Ok(gap) => tokio::time::sleep(gap).await,
                    Err(e) => warn!("Not pacing a {} ms gap: {}", gap_ms, e),
                }
            }
        }
        self.last_timestamp = Some(match self.last_timestamp {
            Some(previous) => previous.max(timestamp),
            None => timestamp,
        });
    }
}

/// Replay `settings.input` end to end and export the session if asked to.
pub async fn run(settings: &AppSettings) -> Result<ReplayStats> {
    let config: ControllerConfig = settings.controller_config()?;
    let mut source = RecordedSource::open(&settings.input)?;

    let output_dir = settings
        .export_directory
        .clone()
        .unwrap_or_else(AppSettings::default_export_directory);
    let log = SessionLog::new(output_dir, None);

    info!("Replaying {}", settings.input.display());
    let mut replay = Replay::new(Controller::try_new(config)?, TracingSink::default(), log)
        .realtime(settings.realtime);
    replay.drive(&mut source).await?;

    let stats = replay.stats();
    let state = replay.state();
    info!(
        "Replay finished: {} frames, {} skipped, {} keys, final mode {}, hologram {:?}",
        stats.frames,
        stats.skipped_frames,
        stats.keys,
        state.mode.as_str(),
        state.hologram_text
    );

    if settings.export_directory.is_some() {
        let exported: Vec<PathBuf> = vec![replay.log().export_csv()?, replay.log().export_summary()?];
        for path in &exported {
            info!("Exported {}", path.display());
        }
    }

    Ok(stats)
}
