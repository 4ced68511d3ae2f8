// src/expression.rs - Facial expression flags from blendshape scores
use crate::landmarks::Blendshape;
use serde::Serialize;

const BROW_CATEGORIES: [&str; 3] = ["browInnerUp", "browOuterUpLeft", "browOuterUpRight"];
const SMILE_CATEGORIES: [&str; 2] = ["mouthSmileLeft", "mouthSmileRight"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExpressionFlags {
    /// Raised brows.
    pub alert: bool,
    pub smiling: bool,
}

fn score(blendshapes: &[Blendshape], name: &str) -> f64 {
    blendshapes
        .iter()
        .find(|b| b.category_name == name)
        .map(|b| b.score)
        .unwrap_or(0.0)
}

fn any_above(blendshapes: &[Blendshape], names: &[&str], threshold: f64) -> bool {
    names.iter().any(|name| score(blendshapes, name) > threshold)
}

impl ExpressionFlags {
    /// Missing categories count as a zero score; an empty list means no face.
    pub fn from_blendshapes(blendshapes: &[Blendshape], brow_threshold: f64, smile_threshold: f64) -> Self {
        Self {
            alert: any_above(blendshapes, &BROW_CATEGORIES, brow_threshold),
            smiling: any_above(blendshapes, &SMILE_CATEGORIES, smile_threshold),
        }
    }
}
