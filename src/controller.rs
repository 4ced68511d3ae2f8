// src/controller.rs - Mode state machine driven by per-frame hand gestures
use crate::analysis::{AnalysisOutcome, AnalysisTicket, AnalysisTrigger, START_ANNOUNCEMENT};
use crate::config::ControllerConfig;
use crate::drawing::DrawingPath;
use crate::effects::SideEffect;
use crate::expression::ExpressionFlags;
use crate::gesture::{GestureType, HandGestureState};
use crate::landmarks::{FrameError, HandLandmarks, KeyInput, LandmarkFrame};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const MAX_SCAN_PROGRESS: u8 = 100;

const MINECRAFT_ANNOUNCEMENT: &str = "Entering Minecraft World Simulation.";
const SKELETON_ANNOUNCEMENT: &str = "Skeleton Mode Active. Music output enabled.";
const DISENGAGED_ANNOUNCEMENT: &str = "Modes disengaged. Standard interface active.";
const ACCESS_GRANTED_ANNOUNCEMENT: &str = "Access Granted.";
const CLEARED_ANNOUNCEMENT: &str = "Canvas Cleared.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppMode {
    /// Waiting for an open palm.
    Locked,
    /// Open palm held, gate filling up.
    Scanning,
    /// Unlocked drawing canvas.
    Active,
    /// Voxel world display.
    Minecraft,
    /// Hand-tracked instrument.
    Skeleton,
}

impl AppMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppMode::Locked => "LOCKED",
            AppMode::Scanning => "SCANNING",
            AppMode::Active => "ACTIVE",
            AppMode::Minecraft => "MINECRAFT",
            AppMode::Skeleton => "SKELETON",
        }
    }

    pub fn is_gate(&self) -> bool {
        matches!(self, AppMode::Locked | AppMode::Scanning)
    }
}

/// Everything rendering and audio collaborators get to see. Replaced as a
/// whole every frame, never edited in place once published.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub mode: AppMode,
    pub scan_progress: u8,
    pub gesture: HandGestureState,
    pub drawing_path: DrawingPath,
    pub typed_text: String,
    pub hologram_text: String,
    pub expressions: ExpressionFlags,
    pub is_processing: bool,
    pub raw_landmarks: Vec<HandLandmarks>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Locked,
            scan_progress: 0,
            gesture: HandGestureState::default(),
            drawing_path: DrawingPath::new(),
            typed_text: String::new(),
            hologram_text: String::new(),
            expressions: ExpressionFlags::default(),
            is_processing: false,
            raw_landmarks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionTimers {
    pub fist_hold_start: Option<f64>,
    pub last_victory: Option<f64>,
    /// Hand height at the last emitted tone.
    pub last_hand_y: f64,
}

impl Default for SessionTimers {
    fn default() -> Self {
        Self {
            fist_hold_start: None,
            last_victory: None,
            last_hand_y: 0.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FrameOutput {
    pub state: Arc<AppState>,
    pub effects: Vec<SideEffect>,
    pub transition: Option<(AppMode, AppMode)>,
}

pub struct Controller {
    config: ControllerConfig,
    state: Arc<AppState>,
    timers: SessionTimers,
    analysis: AnalysisTrigger,
    in_flight: Option<AnalysisTicket>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}

impl Controller {
    pub fn new(config: ControllerConfig) -> Self {
        let analysis = AnalysisTrigger::new(config.analysis_delay_ms);
        Self {
            config,
            state: Arc::new(AppState::default()),
            timers: SessionTimers::default(),
            analysis,
            in_flight: None,
        }
    }

    /// Like `new`, but rejects a config that `ControllerConfig::validate` refuses.
    pub fn try_new(config: ControllerConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    pub fn timers(&self) -> SessionTimers {
        self.timers
    }

    /// When the in-flight analysis will complete, if there is one.
    pub fn analysis_deadline(&self) -> Option<f64> {
        self.analysis.deadline()
    }

    /// Advance the virtual clock: completes the in-flight analysis once due.
    pub fn poll(&mut self, now_ms: f64) -> Vec<SideEffect> {
        match self.analysis.poll(now_ms) {
            Some(outcome) => self.apply_analysis(outcome),
            None => Vec::new(),
        }
    }

    /// Abandon the in-flight analysis and release the processing lock.
    pub fn cancel_analysis(&mut self) -> bool {
        let Some(ticket) = self.in_flight.take() else {
            return false;
        };
        if !self.analysis.cancel(ticket) {
            return false;
        }
        let mut next = (*self.state).clone();
        next.is_processing = false;
        self.state = Arc::new(next);
        true
    }

    fn apply_analysis(&mut self, outcome: AnalysisOutcome) -> Vec<SideEffect> {
        if self.in_flight == Some(outcome.ticket) {
            self.in_flight = None;
        }

        // Applied whatever the mode is by now.
        let mut next = (*self.state).clone();
        next.is_processing = false;
        next.hologram_text = outcome.label;
        self.state = Arc::new(next);

        vec![
            SideEffect::announce(outcome.announcement),
            SideEffect::PlayPhoenixSound,
        ]
    }

    /// Run one video frame through the machine.
    ///
    /// A malformed hand rejects the frame before anything changes. While an
    /// analysis is in flight only the display fields (landmarks, cursor,
    /// expressions) are refreshed.
    pub fn process_frame(&mut self, frame: &LandmarkFrame, now_ms: f64) -> Result<FrameOutput, FrameError> {
        let hands = frame.validated_hands()?;
        let mut effects = self.poll(now_ms);

        let prev = Arc::clone(&self.state);
        let mut next = (*prev).clone();
        next.expressions = ExpressionFlags::from_blendshapes(
            &frame.face_blendshapes,
            self.config.brow_threshold,
            self.config.smile_threshold,
        );

        let gestures: Vec<HandGestureState> = hands
            .iter()
            .map(|hand| HandGestureState::from_hand(hand, self.config.pinch_ratio))
            .collect();
        next.gesture = match gestures.as_slice() {
            [single] => *single,
            _ => HandGestureState {
                position: prev.gesture.position,
                ..HandGestureState::default()
            },
        };
        next.raw_landmarks = hands;

        if prev.is_processing {
            self.state = Arc::new(next);
            return Ok(FrameOutput {
                state: self.snapshot(),
                effects,
                transition: None,
            });
        }

        match gestures.as_slice() {
            [first, second] => self.two_hands(first, second, &prev, &mut next, &mut effects),
            [single] => self.one_hand(single, &prev, &mut next, now_ms, &mut effects),
            [] => {
                if prev.mode == AppMode::Scanning {
                    debug!("Hand lost, scan abandoned at {}", prev.scan_progress);
                    next.mode = AppMode::Locked;
                    next.scan_progress = 0;
                }
            }
            _ => debug!("Ignoring frame with {} hands", gestures.len()),
        }

        let transition = (next.mode != prev.mode).then_some((prev.mode, next.mode));
        if let Some((from, to)) = transition {
            info!("Mode {} -> {}", from.as_str(), to.as_str());
            self.leave_mode(from, &mut next);
        }

        self.state = Arc::new(next);
        Ok(FrameOutput {
            state: self.snapshot(),
            effects,
            transition,
        })
    }

    /// Keyboard entry, honored only on an idle canvas.
    pub fn handle_key(&mut self, key: KeyInput, now_ms: f64) -> Vec<SideEffect> {
        let mut effects = self.poll(now_ms);
        if self.state.mode != AppMode::Active || self.state.is_processing {
            debug!("Ignoring key {:?} in {}", key, self.state.mode.as_str());
            return effects;
        }

        let mut next = (*self.state).clone();
        match key {
            KeyInput::Char(c) => {
                next.typed_text.push(c);
                next.hologram_text = c.to_uppercase().collect();
                effects.push(SideEffect::PlayPhoenixSound);
            }
            KeyInput::Backspace => {
                next.typed_text.pop();
                next.hologram_text = next.typed_text.clone();
            }
        }
        self.state = Arc::new(next);
        effects
    }

    fn two_hands(
        &mut self,
        first: &HandGestureState,
        second: &HandGestureState,
        prev: &AppState,
        next: &mut AppState,
        effects: &mut Vec<SideEffect>,
    ) {
        let both_open = first.gesture_type == GestureType::OpenPalm
            && second.gesture_type == GestureType::OpenPalm;
        if both_open && prev.mode != AppMode::Minecraft {
            next.mode = AppMode::Minecraft;
            next.hologram_text.clear();
            effects.push(SideEffect::announce(MINECRAFT_ANNOUNCEMENT));
        }
    }

    fn one_hand(
        &mut self,
        hand: &HandGestureState,
        prev: &AppState,
        next: &mut AppState,
        now_ms: f64,
        effects: &mut Vec<SideEffect>,
    ) {
        let gesture = hand.gesture_type;
        debug!(
            "{} at ({:.3}, {:.3}) in {}",
            gesture.as_str(),
            hand.position.0,
            hand.position.1,
            prev.mode.as_str()
        );

        // Thumbs up in LOCKED/SCANNING does not announce skeleton mode or clear the
        // hologram, so a held thumb can't repeat the announcement every frame. The
        // gate below handles the frame as a non-palm.
        if gesture == GestureType::ThumbsUp && prev.mode != AppMode::Skeleton && !prev.mode.is_gate() {
            next.mode = AppMode::Skeleton;
            next.hologram_text.clear();
            effects.push(SideEffect::announce(SKELETON_ANNOUNCEMENT));
        }

        if gesture == GestureType::ClosedFist
            && matches!(prev.mode, AppMode::Minecraft | AppMode::Skeleton)
        {
            next.mode = AppMode::Active;
            effects.push(SideEffect::announce(DISENGAGED_ANNOUNCEMENT));
        }

        match prev.mode {
            AppMode::Skeleton => self.play_instrument(hand.position.1, effects),
            AppMode::Locked | AppMode::Scanning => self.run_gate(gesture, prev, next, now_ms, effects),
            AppMode::Active => self.run_canvas(hand, prev, next, now_ms, effects),
            AppMode::Minecraft => {}
        }
    }

    fn play_instrument(&mut self, hand_y: f64, effects: &mut Vec<SideEffect>) {
        if (self.timers.last_hand_y - hand_y).abs() > self.config.tone_move_threshold {
            effects.push(SideEffect::tone(1.0 - hand_y));
            self.timers.last_hand_y = hand_y;
        }
    }

    fn run_gate(
        &mut self,
        gesture: GestureType,
        prev: &AppState,
        next: &mut AppState,
        now_ms: f64,
        effects: &mut Vec<SideEffect>,
    ) {
        if gesture != GestureType::OpenPalm {
            next.mode = AppMode::Locked;
            next.scan_progress = prev.scan_progress.saturating_sub(self.config.scan_decay);
            return;
        }

        next.mode = AppMode::Scanning;
        next.scan_progress = prev
            .scan_progress
            .saturating_add(self.config.scan_step)
            .min(MAX_SCAN_PROGRESS);

        // Unlocking takes a frame already spent in SCANNING.
        if next.scan_progress >= MAX_SCAN_PROGRESS && prev.mode == AppMode::Scanning {
            next.mode = AppMode::Active;
            effects.push(SideEffect::PlaySelectSound);
            effects.push(SideEffect::announce(ACCESS_GRANTED_ANNOUNCEMENT));
        } else if next.scan_progress < MAX_SCAN_PROGRESS
            && (now_ms.floor() as u64).checked_rem(self.config.scan_sound_modulo) == Some(0)
        {
            effects.push(SideEffect::PlayScanSound);
        }
    }

    fn run_canvas(
        &mut self,
        hand: &HandGestureState,
        prev: &AppState,
        next: &mut AppState,
        now_ms: f64,
        effects: &mut Vec<SideEffect>,
    ) {
        let gesture = hand.gesture_type;
        let victory_ready = self
            .timers
            .last_victory
            .map_or(true, |last| now_ms - last > self.config.victory_cooldown_ms);

        if gesture == GestureType::Victory && victory_ready {
            self.start_analysis(prev, next, now_ms, effects);
            self.timers.last_victory = Some(now_ms);
        } else if gesture == GestureType::ClosedFist {
            match self.timers.fist_hold_start {
                None => self.timers.fist_hold_start = Some(now_ms),
                Some(start) if now_ms - start > self.config.fist_hold_ms => {
                    info!("Fist held, clearing canvas");
                    next.drawing_path.clear();
                    next.typed_text.clear();
                    next.hologram_text.clear();
                    effects.push(SideEffect::announce(CLEARED_ANNOUNCEMENT));
                    // Pushed into the future so the same held fist can't fire again at once.
                    self.timers.fist_hold_start = Some(now_ms + self.config.fist_refractory_ms);
                }
                Some(_) => {}
            }
        } else {
            self.timers.fist_hold_start = None;
        }

        if gesture == GestureType::Pinch {
            let (x, y) = hand.position;
            if next.drawing_path.record(x, y, self.config.min_stroke_move) {
                debug!("Stroke point ({:.3}, {:.3})", x, y);
            }
        } else if next.drawing_path.pen_up() {
            debug!("Stroke closed, {} points in path", next.drawing_path.len());
        }
    }

    fn start_analysis(
        &mut self,
        prev: &AppState,
        next: &mut AppState,
        now_ms: f64,
        effects: &mut Vec<SideEffect>,
    ) {
        match self
            .analysis
            .schedule(prev.drawing_path.points(), &prev.typed_text, now_ms)
        {
            Ok(ticket) => {
                self.in_flight = Some(ticket);
                next.is_processing = true;
                effects.push(SideEffect::announce(START_ANNOUNCEMENT));
                effects.push(SideEffect::PlayScanSound);
            }
            Err(e) => warn!("Analysis not started: {}", e),
        }
    }

    fn leave_mode(&mut self, from: AppMode, next: &mut AppState) {
        match from {
            AppMode::Active => {
                next.drawing_path.clear();
                self.timers.fist_hold_start = None;
                self.timers.last_victory = None;
            }
            AppMode::Skeleton => self.timers.last_hand_y = SessionTimers::default().last_hand_y,
            _ => {}
        }
    }
}
