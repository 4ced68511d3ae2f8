// src/shapes.rs - Heuristic letter recognition over drawn strokes
use crate::drawing::{split_strokes, DrawingPoint};

// Strokes shorter than this are never classified.
const MIN_STROKE_POINTS: usize = 10;
// Strokes longer than this that match no rule are reported as unrecognized.
const UNRECOGNIZED_MIN_POINTS: usize = 20;
const MIN_EXTENT: f64 = 0.03;
const CLOSED_LOOP_DIST: f64 = 0.15;
const OPEN_RING_DIST: f64 = 0.1;
const SQUARE_TOLERANCE: f64 = 0.2;
const PEAK_LEVEL_TOLERANCE: f64 = 0.2;

pub const UNRECOGNIZED_PLACEHOLDER: char = '?';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Letter(char),
    /// Long enough to be a deliberate shape, but no rule matched.
    Unrecognized,
    /// Too short or too small to judge; skipped when assembling a word.
    Unclassified,
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Bounds {
    fn of(points: &[DrawingPoint]) -> Self {
        points.iter().fold(
            Bounds {
                min_x: f64::INFINITY,
                min_y: f64::INFINITY,
                max_x: f64::NEG_INFINITY,
                max_y: f64::NEG_INFINITY,
            },
            |b, p| Bounds {
                min_x: b.min_x.min(p.x),
                min_y: b.min_y.min(p.y),
                max_x: b.max_x.max(p.x),
                max_y: b.max_y.max(p.y),
            },
        )
    }

    fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Classify one stroke (gap-free run of points) by its silhouette.
pub fn classify_stroke(points: &[DrawingPoint]) -> Classification {
    if points.len() < MIN_STROKE_POINTS {
        return Classification::Unclassified;
    }

    let bounds = Bounds::of(points);
    let w = bounds.width();
    let h = bounds.height();
    if w < MIN_EXTENT && h < MIN_EXTENT {
        return Classification::Unclassified;
    }

    let start = points[0];
    let end = points[points.len() - 1];
    let start_end = (start.x - end.x).hypot(start.y - end.y);
    let squarish = (w - h).abs() < SQUARE_TOLERANCE;

    if start_end < CLOSED_LOOP_DIST && squarish {
        return Classification::Letter('O');
    }
    if h > w * 2.0 {
        return Classification::Letter('I');
    }
    if h > w && start.y < end.y && start.x < end.x {
        return Classification::Letter('L');
    }

    let right_half = bounds.min_x + w * 0.5;
    if start_end > OPEN_RING_DIST && squarish && start.x > right_half && end.x > right_half {
        return Classification::Letter('C');
    }

    let mid = points[points.len() / 2];
    if mid.y < start.y && mid.y < end.y && (start.y - end.y).abs() < PEAK_LEVEL_TOLERANCE {
        return Classification::Letter('A');
    }

    if points.len() > UNRECOGNIZED_MIN_POINTS {
        Classification::Unrecognized
    } else {
        Classification::Unclassified
    }
}

fn stroke_min_x(stroke: &[DrawingPoint]) -> f64 {
    stroke.iter().map(|p| p.x).fold(f64::INFINITY, f64::min)
}

/// Read a whole drawing as a word: strokes are ordered left to right by
/// their leftmost point, regardless of the order they were drawn in.
pub fn recognize_word(path: &[DrawingPoint]) -> String {
    let mut strokes = split_strokes(path);
    strokes.sort_by(|a, b| stroke_min_x(a).total_cmp(&stroke_min_x(b)));

    strokes
        .into_iter()
        .filter_map(|stroke| match classify_stroke(stroke) {
            Classification::Letter(c) => Some(c),
            Classification::Unrecognized => Some(UNRECOGNIZED_PLACEHOLDER),
            Classification::Unclassified => None,
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::strokes::*;
    use super::*;
    use crate::drawing::DrawingPath;

    fn joined(strokes: Vec<Vec<DrawingPoint>>) -> Vec<DrawingPoint> {
        let mut out = Vec::new();
        for s in strokes {
            out.extend(s);
            out.push(DrawingPoint::gap());
        }
        out
    }

    #[test]
    fn test_letters() {
        assert_eq!(classify_stroke(&loop_at(0.5, 0.5, 0.1, 16)), Classification::Letter('O'));
        assert_eq!(classify_stroke(&vertical(0.4, 0.2, 0.6)), Classification::Letter('I'));
        assert_eq!(classify_stroke(&ell(0.2, 0.2)), Classification::Letter('L'));
        assert_eq!(classify_stroke(&see(0.5, 0.5, 0.15)), Classification::Letter('C'));
        assert_eq!(classify_stroke(&peak_at(0.1, 0.3, 0.5, 0.2)), Classification::Letter('A'));
    }

    #[test]
    fn test_short_strokes_are_unclassified() {
        let short = vertical(0.4, 0.2, 0.6).into_iter().take(9).collect::<Vec<_>>();
        assert_eq!(classify_stroke(&short), Classification::Unclassified);
    }

    #[test]
    fn test_tiny_strokes_are_unclassified() {
        assert_eq!(classify_stroke(&loop_at(0.5, 0.5, 0.01, 30)), Classification::Unclassified);
    }

    #[test]
    fn test_long_unmatched_stroke_is_unrecognized() {
        // Horizontal zig-zag descending to the right: no rule fits.
        let points: Vec<DrawingPoint> = (0..25)
            .map(|i| DrawingPoint::new(0.1 + i as f64 * 0.02, 0.3 + if i % 2 == 0 { 0.0 } else { 0.05 } + i as f64 * 0.001))
            .collect();
        assert_eq!(classify_stroke(&points), Classification::Unrecognized);

        let fewer = &points[..15];
        assert_eq!(classify_stroke(fewer), Classification::Unclassified);
    }

    #[test]
    fn test_word_is_ordered_left_to_right() {
        // The O is drawn first but sits to the right of the A.
        let path = joined(vec![loop_at(0.7, 0.5, 0.1, 16), peak_at(0.1, 0.3, 0.5, 0.2)]);
        assert_eq!(recognize_word(&path), "AO");
    }

    #[test]
    fn test_word_placeholders_and_skips() {
        let zigzag: Vec<DrawingPoint> = (0..25)
            .map(|i| DrawingPoint::new(0.4 + i as f64 * 0.02, 0.3 + if i % 2 == 0 { 0.0 } else { 0.05 } + i as f64 * 0.001))
            .collect();
        let dot = loop_at(0.9, 0.9, 0.005, 12);
        let path = joined(vec![vertical(0.1, 0.2, 0.6), zigzag, dot]);
        assert_eq!(recognize_word(&path), "I?");
    }

    #[test]
    fn test_open_stroke_counts() {
        let mut path = DrawingPath::new();
        for p in vertical(0.2, 0.1, 0.5) {
            path.record(p.x, p.y, 0.005);
        }
        assert_eq!(recognize_word(path.points()), "I");
    }

    #[test]
    fn test_empty_path_is_empty_word() {
        assert_eq!(recognize_word(&[]), "");
    }
}
