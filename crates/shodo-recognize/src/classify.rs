//! Shape Classification
//!
//! Maps extracted features plus stroke count to ranked label candidates
//! through a fixed priority decision table: stroke-count-specific pattern
//! rules first, then count-specific fallbacks over raw line counts and
//! density, then complexity labels, then a generic per-count fallback.
//! Generation order is the tie-break; the list is truncated to `top_n`
//! without re-sorting.

use crate::raster::Features;
use crate::Candidate;

/// Density below which a single stroke reads as a dot.
const DOT_DENSITY: f64 = 0.01;

/// Density above which complexity labels are appended.
const COMPLEX_DENSITY: f64 = 0.1;

/// Rank candidate labels for the given features and stroke count,
/// truncated to `top_n` in generation order.
#[must_use]
pub fn rank(features: &Features, stroke_count: usize, top_n: usize) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    let h = features.horizontal_lines;
    let v = features.vertical_lines;

    // Priority pattern rules, most specific first.
    if stroke_count == 2 && features.has_cross {
        candidates.push(Candidate::new("十", 0.95));
        candidates.push(Candidate::new("＋", 0.8));
    }
    if stroke_count == 3 && features.has_three_horizontal {
        candidates.push(Candidate::new("三", 0.95));
        candidates.push(Candidate::new("ミ", 0.7));
    }
    if stroke_count == 2 && features.has_two_horizontal {
        candidates.push(Candidate::new("二", 0.9));
        candidates.push(Candidate::new("ニ", 0.7));
    }
    if stroke_count == 1 && features.has_single_horizontal {
        candidates.push(Candidate::new("一", 0.9));
        candidates.push(Candidate::new("ー", 0.7));
    }
    if stroke_count == 1 && features.has_single_vertical {
        candidates.push(Candidate::new("丨", 0.9));
        candidates.push(Candidate::new("｜", 0.7));
    }

    // Count-specific fallbacks over raw line counts and density.
    if candidates.is_empty() {
        match stroke_count {
            1 => {
                if h >= 1 {
                    candidates.push(Candidate::new("一", 0.7));
                    candidates.push(Candidate::new("ー", 0.5));
                } else if v >= 1 {
                    candidates.push(Candidate::new("丨", 0.7));
                    candidates.push(Candidate::new("｜", 0.5));
                } else if features.density < DOT_DENSITY {
                    candidates.push(Candidate::new("丶", 0.8));
                    candidates.push(Candidate::new("。", 0.6));
                } else {
                    candidates.push(Candidate::new("し", 0.6));
                    candidates.push(Candidate::new("く", 0.4));
                }
            }
            2 => {
                if h >= 2 {
                    candidates.push(Candidate::new("二", 0.7));
                    candidates.push(Candidate::new("ニ", 0.5));
                } else if h >= 1 && v >= 1 {
                    candidates.push(Candidate::new("十", 0.7));
                    candidates.push(Candidate::new("＋", 0.5));
                } else {
                    candidates.push(Candidate::new("人", 0.6));
                    candidates.push(Candidate::new("入", 0.4));
                }
            }
            3 => {
                if h >= 3 {
                    candidates.push(Candidate::new("三", 0.7));
                    candidates.push(Candidate::new("ミ", 0.5));
                } else if h >= 1 && v >= 1 {
                    candidates.push(Candidate::new("大", 0.6));
                    candidates.push(Candidate::new("太", 0.4));
                } else {
                    candidates.push(Candidate::new("小", 0.5));
                    candidates.push(Candidate::new("川", 0.3));
                }
            }
            // Zero strokes fall through to the generic suggestion.
            0 => {}
            _ => {
                if h >= 2 && v >= 2 {
                    candidates.push(Candidate::new("中", 0.6));
                    candidates.push(Candidate::new("田", 0.5));
                }
                candidates.push(Candidate::new("国", 0.5));
                candidates.push(Candidate::new("学", 0.4));
                candidates.push(Candidate::new("生", 0.3));
            }
        }
    }

    // Dense drawings read as full written characters regardless of the
    // rules above.
    if features.density > COMPLEX_DENSITY {
        candidates.push(Candidate::new("書", 0.3));
        candidates.push(Candidate::new("字", 0.2));
    }

    // Last resort: one generic suggestion keyed by stroke count alone.
    if candidates.is_empty() {
        let generic = match stroke_count {
            1 => Candidate::new("一", 0.5),
            2 => Candidate::new("二", 0.5),
            3 => Candidate::new("三", 0.5),
            _ => Candidate::new("中", 0.4),
        };
        candidates.push(generic);
    }

    candidates.truncate(top_n);
    candidates
}
