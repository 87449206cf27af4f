//! Shodo Recognize - Stroke Shape Classification
//!
//! Deterministic geometric classification of drawn strokes:
//! - Raster: occupancy grid rasterization and feature extraction
//! - Classify: a fixed priority decision table mapping features plus
//!   stroke count to ranked label candidates
//!
//! Classification is a total pure function of its input — identical
//! inputs always yield the identical ordered candidate list, and no
//! well-formed input fails. There is no trained model here; everything
//! is fixed-threshold geometry.
//!
//! ## Usage
//!
//! ```
//! use shodo_recognize::{recognize, Point, Stroke};
//!
//! let stroke = Stroke {
//!     points: vec![Point { x: 20.0, y: 150.0 }, Point { x: 280.0, y: 150.0 }],
//! };
//! let candidates = recognize(&[stroke], 300, 300, 10);
//! assert_eq!(candidates[0].text, "一");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};

pub mod classify;
pub mod raster;

pub use raster::{Features, Raster};

/// Default result cap when the caller passes a non-positive `top_n`.
pub const DEFAULT_TOP_N: usize = 10;

/// Default raster width in pixels.
pub const DEFAULT_RASTER_WIDTH: usize = 300;

/// Default raster height in pixels.
pub const DEFAULT_RASTER_HEIGHT: usize = 300;

/// A single point of a stroke path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate in canvas pixels
    pub x: f64,
    /// Vertical coordinate in canvas pixels
    pub y: f64,
}

/// A stroke reduced to its path; display hints are irrelevant here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Ordered points defining the drawing path
    pub points: Vec<Point>,
}

/// A ranked classification candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Label text
    pub text: String,
    /// Confidence score in [0, 1]
    pub score: f64,
}

impl Candidate {
    /// Build a candidate from a label and score.
    #[must_use]
    pub fn new(text: impl Into<String>, score: f64) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }
}

/// Classify a set of strokes drawn on a `width` x `height` canvas,
/// returning at most `top_n` ranked candidates (`top_n <= 0` means
/// [`DEFAULT_TOP_N`]). An empty stroke set yields an empty list.
#[must_use]
pub fn recognize(strokes: &[Stroke], width: usize, height: usize, top_n: i64) -> Vec<Candidate> {
    let top_n = if top_n <= 0 {
        DEFAULT_TOP_N
    } else {
        top_n as usize
    };

    if strokes.is_empty() {
        return Vec::new();
    }

    let raster = Raster::from_strokes(strokes, width, height);
    classify::rank(&raster.features(), strokes.len(), top_n)
}
