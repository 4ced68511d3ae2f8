// src/gesture.rs - Single-hand gesture classification
use crate::landmarks::{
    HandLandmarks, INDEX_PIP, INDEX_TIP, MIDDLE_PIP, MIDDLE_TIP, PINKY_PIP, PINKY_TIP, RING_PIP,
    RING_TIP, THUMB_TIP,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GestureType {
    None,
    OpenPalm,
    ClosedFist,
    Pinch,
    /// Part of the vocabulary but never produced by `classify_gesture`.
    Pointing,
    Victory,
    ThumbsUp,
}

impl GestureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GestureType::None => "NONE",
            GestureType::OpenPalm => "OPEN_PALM",
            GestureType::ClosedFist => "CLOSED_FIST",
            GestureType::Pinch => "PINCH",
            GestureType::Pointing => "POINTING",
            GestureType::Victory => "VICTORY",
            GestureType::ThumbsUp => "THUMBS_UP",
        }
    }
}

/// Gesture plus the cursor it drives, recomputed every frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HandGestureState {
    pub gesture_type: GestureType,
    /// Index fingertip, x mirrored to match the selfie view.
    pub position: (f64, f64),
    pub pinch_distance: Option<f64>,
}

impl Default for HandGestureState {
    fn default() -> Self {
        Self {
            gesture_type: GestureType::None,
            position: (0.5, 0.5),
            pinch_distance: None,
        }
    }
}

impl HandGestureState {
    pub fn from_hand(hand: &HandLandmarks, pinch_ratio: f64) -> Self {
        let tip = hand.planar(INDEX_TIP);
        let span = hand.span();
        let pinch_distance = if span > 0.0 {
            Some(hand.distance(THUMB_TIP, INDEX_TIP) / span)
        } else {
            None
        };

        Self {
            gesture_type: classify_gesture(hand, pinch_ratio),
            position: (1.0 - tip.x, tip.y),
            pinch_distance,
        }
    }
}

fn tip_above_pip(hand: &HandLandmarks, tip: usize, pip: usize) -> bool {
    hand.planar(tip).y < hand.planar(pip).y
}

fn tip_below_pip(hand: &HandLandmarks, tip: usize, pip: usize) -> bool {
    hand.planar(tip).y > hand.planar(pip).y
}

/// Classify one hand. Rules are checked in priority order and the first
/// match wins: thumbs up, victory, pinch, closed fist, then open palm.
///
/// `pinch_ratio` is the thumb-index gap, as a fraction of hand span, below
/// which the hand counts as pinching.
pub fn classify_gesture(hand: &HandLandmarks, pinch_ratio: f64) -> GestureType {
    let thumb_y = hand.planar(THUMB_TIP).y;

    let thumb_up = thumb_y < hand.planar(INDEX_PIP).y && thumb_y < hand.planar(MIDDLE_PIP).y;
    let fingers_folded = tip_below_pip(hand, INDEX_TIP, INDEX_PIP)
        && tip_below_pip(hand, MIDDLE_TIP, MIDDLE_PIP)
        && tip_below_pip(hand, RING_TIP, RING_PIP)
        && tip_below_pip(hand, PINKY_TIP, PINKY_PIP);
    if thumb_up && fingers_folded {
        return GestureType::ThumbsUp;
    }

    let index_extended = tip_above_pip(hand, INDEX_TIP, INDEX_PIP);
    let middle_extended = tip_above_pip(hand, MIDDLE_TIP, MIDDLE_PIP);
    let ring_folded = tip_below_pip(hand, RING_TIP, RING_PIP);
    let pinky_folded = tip_below_pip(hand, PINKY_TIP, PINKY_PIP);
    if index_extended && middle_extended && ring_folded && pinky_folded {
        return GestureType::Victory;
    }

    if hand.distance(THUMB_TIP, INDEX_TIP) < hand.span() * pinch_ratio {
        return GestureType::Pinch;
    }

    if !index_extended && !middle_extended && ring_folded && pinky_folded {
        return GestureType::ClosedFist;
    }

    GestureType::OpenPalm
}
