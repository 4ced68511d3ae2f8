// src/landmarks.rs - Perception payload types and recorded landmark sources
use anyhow::{Context, Result};
use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

// MediaPipe hand landmark indices
pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_PIP: usize = 6;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_TIP: usize = 12;
pub const RING_PIP: usize = 14;
pub const RING_TIP: usize = 16;
pub const PINKY_PIP: usize = 18;
pub const PINKY_TIP: usize = 20;

pub const HAND_LANDMARK_COUNT: usize = 21;

#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("hand {hand} has {count} landmarks, expected 21")]
    TooFewLandmarks { hand: usize, count: usize },
    #[error("hand {hand} landmark {index} has a non-finite coordinate")]
    NonFinite { hand: usize, index: usize },
}

/// One keypoint as delivered by the perception service, normalized to [0,1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blendshape {
    pub category_name: String,
    pub score: f64,
}

/// Everything the perception service reports for one video frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    pub timestamp_ms: f64,
    #[serde(default)]
    pub hands: Vec<Vec<Landmark>>,
    #[serde(default, rename = "faceBlendshapes")]
    pub face_blendshapes: Vec<Blendshape>,
}

impl LandmarkFrame {
    /// Validate every reported hand. A short or non-finite hand rejects the
    /// whole frame; the caller decides whether to skip it.
    pub fn validated_hands(&self) -> Result<Vec<HandLandmarks>, FrameError> {
        self.hands
            .iter()
            .enumerate()
            .map(|(i, points)| HandLandmarks::from_landmarks(i, points))
            .collect()
    }
}

/// A validated 21-point hand.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    points: Vec<Vector3<f64>>,
}

impl HandLandmarks {
    pub fn from_landmarks(hand: usize, landmarks: &[Landmark]) -> Result<Self, FrameError> {
        if landmarks.len() < HAND_LANDMARK_COUNT {
            return Err(FrameError::TooFewLandmarks {
                hand,
                count: landmarks.len(),
            });
        }

        let mut points = Vec::with_capacity(HAND_LANDMARK_COUNT);
        for (index, lm) in landmarks.iter().take(HAND_LANDMARK_COUNT).enumerate() {
            if !(lm.x.is_finite() && lm.y.is_finite() && lm.z.is_finite()) {
                return Err(FrameError::NonFinite { hand, index });
            }
            points.push(Vector3::new(lm.x, lm.y, lm.z));
        }

        Ok(Self { points })
    }

    /// Image-plane position, depth dropped.
    pub fn planar(&self, index: usize) -> Vector2<f64> {
        self.points[index].xy()
    }

    /// Planar distance between two landmarks.
    pub fn distance(&self, a: usize, b: usize) -> f64 {
        (self.planar(a) - self.planar(b)).norm()
    }

    /// Wrist to middle-finger MCP, the scale every hand-relative threshold uses.
    pub fn span(&self) -> f64 {
        self.distance(WRIST, MIDDLE_MCP)
    }
}

/// Keyboard name as recorded by the browser-side collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Backspace,
}

impl KeyInput {
    pub fn from_key_name(name: &str) -> Option<Self> {
        if name == "Backspace" {
            return Some(KeyInput::Backspace);
        }
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_control() => Some(KeyInput::Char(c)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    Frame(LandmarkFrame),
    Key { timestamp_ms: f64, key: String },
}

impl InputEvent {
    pub fn timestamp_ms(&self) -> f64 {
        match self {
            InputEvent::Frame(frame) => frame.timestamp_ms,
            InputEvent::Key { timestamp_ms, .. } => *timestamp_ms,
        }
    }
}

/// Anything that can hand the controller a stream of perception events.
pub trait LandmarkSource {
    fn next_event(&mut self) -> Result<Option<InputEvent>>;
}

/// Replays a JSON-lines recording, one `InputEvent` per line.
pub struct RecordedSource<R> {
    reader: R,
    line_number: usize,
    buf: String,
}

impl RecordedSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open recording {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> RecordedSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> LandmarkSource for RecordedSource<R> {
    fn next_event(&mut self) -> Result<Option<InputEvent>> {
        loop {
            self.buf.clear();
            let read = self
                .reader
                .read_line(&mut self.buf)
                .context("Failed to read recording")?;
            if read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }

            let event = serde_json::from_str(line)
                .with_context(|| format!("Invalid event on line {}", self.line_number))?;
            return Ok(Some(event));
        }
    }
}

/// Synthetic hands for tests. Image y grows downward, so "extended" fingers
/// have tips with smaller y than their PIP joints.
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum Pose {
        OpenPalm,
        Fist,
        ThumbsUp,
        Victory,
    }

    const PIPS: [(usize, f64, f64); 4] = [
        (INDEX_PIP, 0.45, 0.55),
        (MIDDLE_PIP, 0.50, 0.53),
        (RING_PIP, 0.55, 0.55),
        (PINKY_PIP, 0.60, 0.58),
    ];
    const EXTENDED_TIPS: [(usize, f64, f64); 4] = [
        (INDEX_TIP, 0.45, 0.40),
        (MIDDLE_TIP, 0.50, 0.38),
        (RING_TIP, 0.55, 0.40),
        (PINKY_TIP, 0.60, 0.45),
    ];
    const FOLDED_TIPS: [(usize, f64, f64); 4] = [
        (INDEX_TIP, 0.45, 0.62),
        (MIDDLE_TIP, 0.50, 0.62),
        (RING_TIP, 0.55, 0.62),
        (PINKY_TIP, 0.60, 0.64),
    ];

    fn base() -> Vec<Landmark> {
        let mut points = vec![Landmark::new(0.5, 0.7); HAND_LANDMARK_COUNT];
        points[WRIST] = Landmark::new(0.5, 0.8);
        points[MIDDLE_MCP] = Landmark::new(0.5, 0.6);
        points[THUMB_TIP] = Landmark::new(0.3, 0.65);
        for (i, x, y) in PIPS {
            points[i] = Landmark::new(x, y);
        }
        points
    }

    fn set_tips(points: &mut [Landmark], extended: [bool; 4]) {
        for (finger, is_extended) in extended.iter().enumerate() {
            let (i, x, y) = if *is_extended {
                EXTENDED_TIPS[finger]
            } else {
                FOLDED_TIPS[finger]
            };
            points[i] = Landmark::new(x, y);
        }
    }

    /// A hand in `pose`, translated by (dx, dy).
    pub fn hand(pose: Pose, dx: f64, dy: f64) -> Vec<Landmark> {
        let mut points = base();
        match pose {
            Pose::OpenPalm => set_tips(&mut points, [true; 4]),
            Pose::Fist => set_tips(&mut points, [false; 4]),
            Pose::ThumbsUp => {
                set_tips(&mut points, [false; 4]);
                points[THUMB_TIP] = Landmark::new(0.4, 0.4);
            }
            Pose::Victory => set_tips(&mut points, [true, true, false, false]),
        }
        for p in points.iter_mut() {
            p.x += dx;
            p.y += dy;
        }
        points
    }

    /// A pinching hand whose index tip sits at (x, y) in camera coordinates.
    pub fn pinch_at(x: f64, y: f64) -> Vec<Landmark> {
        let mut points = hand(Pose::OpenPalm, 0.0, 0.0);
        points[INDEX_TIP] = Landmark::new(x, y);
        points[THUMB_TIP] = Landmark::new(x + 0.01, y + 0.01);
        points
    }

    pub fn frame(timestamp_ms: f64, hands: Vec<Vec<Landmark>>) -> LandmarkFrame {
        LandmarkFrame {
            timestamp_ms,
            hands,
            face_blendshapes: Vec::new(),
        }
    }

    pub fn validated(points: &[Landmark]) -> HandLandmarks {
        HandLandmarks::from_landmarks(0, points).unwrap()
    }
}
