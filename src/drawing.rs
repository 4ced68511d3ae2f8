// src/drawing.rs - Pinch-driven stroke recording
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawingPoint {
    pub x: f64,
    pub y: f64,
    /// Pen-up marker closing the stroke before it.
    pub is_gap: bool,
}

impl DrawingPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, is_gap: false }
    }

    pub fn gap() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            is_gap: true,
        }
    }

    fn distance_to(&self, x: f64, y: f64) -> f64 {
        (self.x - x).hypot(self.y - y)
    }
}

/// Append-only sequence of drawing points with explicit pen-up gaps.
///
/// Never starts with a gap and never holds two gaps in a row, so every
/// stroke between gaps is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DrawingPath {
    points: Vec<DrawingPoint>,
}

impl DrawingPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pen-down sample. Dropped when it lies within `min_move` of the last
    /// recorded point of the current stroke. Returns whether it was recorded.
    pub fn record(&mut self, x: f64, y: f64, min_move: f64) -> bool {
        if let Some(last) = self.points.last() {
            if !last.is_gap && last.distance_to(x, y) <= min_move {
                return false;
            }
        }
        self.points.push(DrawingPoint::new(x, y));
        true
    }

    /// Close the current stroke. No-op on an empty path or one already closed.
    pub fn pen_up(&mut self) -> bool {
        match self.points.last() {
            Some(last) if !last.is_gap => {
                self.points.push(DrawingPoint::gap());
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[DrawingPoint] {
        &self.points
    }

    /// Whether the last point belongs to an open stroke.
    pub fn is_pen_down(&self) -> bool {
        self.points.last().map(|p| !p.is_gap).unwrap_or(false)
    }

    /// Maximal runs of non-gap points, in drawing order.
    pub fn strokes(&self) -> Vec<&[DrawingPoint]> {
        split_strokes(&self.points)
    }
}

impl From<Vec<DrawingPoint>> for DrawingPath {
    fn from(points: Vec<DrawingPoint>) -> Self {
        let mut path = DrawingPath::new();
        for p in points {
            if p.is_gap {
                path.pen_up();
            } else {
                path.points.push(p);
            }
        }
        path
    }
}

pub fn split_strokes(points: &[DrawingPoint]) -> Vec<&[DrawingPoint]> {
    points
        .split(|p| p.is_gap)
        .filter(|stroke| !stroke.is_empty())
        .collect()
}
