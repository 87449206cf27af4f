//! Stroke Rasterization and Feature Extraction
//!
//! Strokes are stamped onto a flat occupancy grid (3x3 block per point,
//! with intermediate blocks walked along every segment so fast pointer
//! motion never breaks line continuity), then scanned for geometric
//! features: density, bounding box, merged horizontal/vertical line
//! groups, diagonal runs, and a cross pattern.
//!
//! All thresholds are fixed constants of the algorithm. The diagonal
//! counter deliberately over-counts overlapping runs through the same
//! visual line; it feeds heuristic scoring only.

use crate::Stroke;

/// Activation cutoff: a cell above this value counts as drawn.
const ACTIVE_CUTOFF: f32 = 0.1;

/// Occupancy grid rasterized from a set of strokes.
#[derive(Debug, Clone)]
pub struct Raster {
    width: usize,
    height: usize,
    cells: Vec<f32>,
}

/// Geometric features derived from a [`Raster`].
///
/// Line counts are merged groups (one per contiguous band of qualifying
/// rows or columns); pattern flags combine counts and span checks.
#[derive(Debug, Clone, PartialEq)]
pub struct Features {
    /// Fraction of cells that are drawn
    pub density: f64,
    /// Bounding-box width over height
    pub aspect_ratio: f64,
    /// Bounding-box center offset from canvas center, normalized
    pub center_offset_x: f64,
    /// Bounding-box center offset from canvas center, normalized
    pub center_offset_y: f64,
    /// Merged horizontal line groups
    pub horizontal_lines: usize,
    /// Merged vertical line groups
    pub vertical_lines: usize,
    /// Qualifying diagonal runs across all four directions
    pub diagonal_lines: usize,
    /// A horizontal and a vertical run each span over a third of its axis
    pub has_cross: bool,
    /// At least three horizontal line groups
    pub has_three_horizontal: bool,
    /// At least two horizontal line groups
    pub has_two_horizontal: bool,
    /// Horizontal lines present with no vertical lines
    pub has_single_horizontal: bool,
    /// Vertical lines present with no horizontal lines
    pub has_single_vertical: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            density: 0.0,
            aspect_ratio: 1.0,
            center_offset_x: 0.0,
            center_offset_y: 0.0,
            horizontal_lines: 0,
            vertical_lines: 0,
            diagonal_lines: 0,
            has_cross: false,
            has_three_horizontal: false,
            has_two_horizontal: false,
            has_single_horizontal: false,
            has_single_vertical: false,
        }
    }
}

impl Raster {
    /// Rasterize strokes onto a width x height grid. Points outside the
    /// bounds are silently clipped.
    #[must_use]
    pub fn from_strokes(strokes: &[Stroke], width: usize, height: usize) -> Self {
        let mut raster = Self {
            width,
            height,
            cells: vec![0.0; width * height],
        };

        for stroke in strokes {
            if stroke.points.is_empty() {
                continue;
            }

            for point in &stroke.points {
                raster.stamp(point.x as i64, point.y as i64);
            }

            // Walk each segment in unit steps proportional to its length
            // so distant consecutive points still draw a continuous line.
            for pair in stroke.points.windows(2) {
                let (p1, p2) = (pair[0], pair[1]);
                let dx = p2.x - p1.x;
                let dy = p2.y - p1.y;
                let steps = (dx * dx + dy * dy).sqrt() as usize + 1;
                for j in 0..=steps {
                    let t = j as f64 / steps as f64;
                    raster.stamp((p1.x + t * dx) as i64, (p1.y + t * dy) as i64);
                }
            }
        }

        raster
    }

    /// Mark a 3x3 block around (x, y) at full intensity, clipped to bounds.
    fn stamp(&mut self, x: i64, y: i64) {
        for dy in -1..=1_i64 {
            for dx in -1..=1_i64 {
                let nx = x + dx;
                let ny = y + dy;
                if nx >= 0 && (nx as usize) < self.width && ny >= 0 && (ny as usize) < self.height {
                    self.cells[ny as usize * self.width + nx as usize] = 1.0;
                }
            }
        }
    }

    /// Grid width in cells.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    fn active(&self, x: usize, y: usize) -> bool {
        self.cells[y * self.width + x] > ACTIVE_CUTOFF
    }

    /// Longest contiguous active run in one row.
    fn row_longest_run(&self, y: usize) -> usize {
        let mut longest = 0;
        let mut run = 0;
        for x in 0..self.width {
            if self.active(x, y) {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 0;
            }
        }
        longest
    }

    /// Longest contiguous active run in one column.
    fn col_longest_run(&self, x: usize) -> usize {
        let mut longest = 0;
        let mut run = 0;
        for y in 0..self.height {
            if self.active(x, y) {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 0;
            }
        }
        longest
    }

    /// Count contiguous groups of qualifying lanes. A lane qualifies when
    /// its longest run meets `min_len`; vertically adjacent qualifying
    /// lanes merge into a single line group.
    fn count_line_groups(lane_runs: &[usize], min_len: usize) -> usize {
        let mut groups = 0;
        let mut in_group = false;
        for &longest in lane_runs {
            if longest >= min_len {
                if !in_group {
                    groups += 1;
                    in_group = true;
                }
            } else {
                in_group = false;
            }
        }
        groups
    }

    /// Qualifying diagonal runs across all four diagonal directions,
    /// scanned from every cell as a potential start. Overlapping runs
    /// through the same visual line are counted more than once; this is
    /// a cheap approximate count, kept as such on purpose.
    fn count_diagonal_runs(&self) -> usize {
        let min_len = (((self.width * self.width + self.height * self.height) as f64).sqrt()
            as usize)
            / 8;
        let mut count = 0;

        for (dx, dy) in [(1_i64, 1_i64), (1, -1), (-1, 1), (-1, -1)] {
            for start_y in 0..self.height {
                for start_x in 0..self.width {
                    let mut run = 0;
                    let mut x = start_x as i64;
                    let mut y = start_y as i64;
                    while x >= 0
                        && (x as usize) < self.width
                        && y >= 0
                        && (y as usize) < self.height
                    {
                        if self.active(x as usize, y as usize) {
                            run += 1;
                        } else {
                            if run >= min_len {
                                count += 1;
                            }
                            run = 0;
                        }
                        x += dx;
                        y += dy;
                    }
                    if run >= min_len {
                        count += 1;
                    }
                }
            }
        }

        count
    }

    /// Derive geometric features by scanning the grid.
    #[must_use]
    pub fn features(&self) -> Features {
        let mut active = 0usize;
        let mut min_x = self.width;
        let mut max_x = 0usize;
        let mut min_y = self.height;
        let mut max_y = 0usize;

        for y in 0..self.height {
            for x in 0..self.width {
                if self.active(x, y) {
                    active += 1;
                    min_x = min_x.min(x);
                    max_x = max_x.max(x);
                    min_y = min_y.min(y);
                    max_y = max_y.max(y);
                }
            }
        }

        let mut features = Features {
            density: active as f64 / (self.width * self.height) as f64,
            ..Features::default()
        };

        if active > 0 {
            let center_x = self.width as f64 / 2.0;
            let center_y = self.height as f64 / 2.0;
            features.aspect_ratio =
                (max_x - min_x + 1) as f64 / (max_y - min_y + 1) as f64;
            features.center_offset_x =
                ((min_x + max_x) as f64 / 2.0 - center_x).abs() / center_x;
            features.center_offset_y =
                ((min_y + max_y) as f64 / 2.0 - center_y).abs() / center_y;
        }

        let row_runs: Vec<usize> = (0..self.height).map(|y| self.row_longest_run(y)).collect();
        let col_runs: Vec<usize> = (0..self.width).map(|x| self.col_longest_run(x)).collect();

        features.horizontal_lines = Self::count_line_groups(&row_runs, self.width / 10);
        features.vertical_lines = Self::count_line_groups(&col_runs, self.height / 10);
        features.diagonal_lines = self.count_diagonal_runs();

        let best_row_run = row_runs.iter().copied().max().unwrap_or(0);
        let best_col_run = col_runs.iter().copied().max().unwrap_or(0);
        features.has_cross = best_row_run > self.width / 3 && best_col_run > self.height / 3;

        features.has_three_horizontal = features.horizontal_lines >= 3;
        features.has_two_horizontal = features.horizontal_lines >= 2;
        features.has_single_horizontal =
            features.horizontal_lines >= 1 && features.vertical_lines == 0;
        features.has_single_vertical =
            features.vertical_lines >= 1 && features.horizontal_lines == 0;

        features
    }
}
