// SPDX-License-Identifier: GPL-3.0-only

//! Physical-to-display coordinate mapping
//!
//! The sensor-to-display transform is non-linear (oblique projection on top
//! of the power-law depth response), but across one cell of the calibration
//! grid a bilinear approximation is plenty. The grid is captured by the
//! calibration flow: R×C sensor-space samples paired with the display
//! positions of the dots the user touched.
//!
//! Sensor image x runs opposite to display x with the sensor mounted facing
//! the projection, so column sample x decreases as the display column index
//! grows; the grid constructor enforces that orientation.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::constants::calibration;
use crate::errors::CalibrationError;
use crate::interaction::{DisplayPoint, Interaction};

/// One captured calibration sample in sensor space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationSample {
    pub x: f64,
    pub y: f64,
    /// Depth at the sample, millimetres; recorded for diagnostics
    pub z: f64,
}

/// R×C grid of (sensor, display) correspondences.
///
/// Rows are assumed horizontal in sensor space, so each sample's y is
/// replaced by its row mean; a row with suspiciously spread y values gets a
/// warning at construction.
#[derive(Debug, Clone)]
pub struct CalibrationGrid {
    rows: usize,
    cols: usize,
    physical: Vec<CalibrationSample>,
    display: Vec<DisplayPoint>,
    /// Mean sensor y per row
    avg_y: Vec<f64>,
    /// Samples with y replaced by the row mean
    avg_physical: Vec<CalibrationSample>,
}

impl CalibrationGrid {
    pub fn new(
        rows: usize,
        cols: usize,
        physical: Vec<CalibrationSample>,
        display: Vec<DisplayPoint>,
    ) -> Result<Self, CalibrationError> {
        if rows < 2 || cols < 2 {
            return Err(CalibrationError::Invalid(format!(
                "grid must be at least 2x2, got {}x{}",
                rows, cols
            )));
        }
        if physical.len() != rows * cols || display.len() != rows * cols {
            return Err(CalibrationError::Invalid(format!(
                "expected {} samples, got {} physical / {} display",
                rows * cols,
                physical.len(),
                display.len()
            )));
        }

        // Display coordinates must grow rightward across rows and downward
        // along columns
        for r in 0..rows {
            for c in 1..cols {
                if display[r * cols + c].x <= display[r * cols + c - 1].x {
                    return Err(CalibrationError::Invalid(format!(
                        "display x not increasing at row {}, col {}",
                        r, c
                    )));
                }
            }
        }
        for c in 0..cols {
            for r in 1..rows {
                if display[r * cols + c].y <= display[(r - 1) * cols + c].y {
                    return Err(CalibrationError::Invalid(format!(
                        "display y not increasing at row {}, col {}",
                        r, c
                    )));
                }
            }
        }

        // Sensor x is mirrored: it must shrink as the display column grows
        for r in 0..rows {
            for c in 1..cols {
                if physical[r * cols + c].x >= physical[r * cols + c - 1].x {
                    return Err(CalibrationError::Invalid(format!(
                        "sensor x not decreasing at row {}, col {}; \
                         is the sensor mounted mirror-reversed?",
                        r, c
                    )));
                }
            }
        }

        let mut avg_y = Vec::with_capacity(rows);
        for r in 0..rows {
            let row = &physical[r * cols..(r + 1) * cols];
            let mean = row.iter().map(|s| s.y).sum::<f64>() / cols as f64;
            let variance =
                row.iter().map(|s| (s.y - mean) * (s.y - mean)).sum::<f64>() / cols as f64;
            if variance > calibration::ROW_Y_VARIANCE_WARN {
                warn!(
                    row = r,
                    variance, "Calibration row y spread is large; dots may not be level"
                );
            }
            avg_y.push(mean);
        }
        for r in 1..rows {
            if avg_y[r] <= avg_y[r - 1] {
                return Err(CalibrationError::Invalid(format!(
                    "row mean y not increasing between rows {} and {}",
                    r - 1,
                    r
                )));
            }
        }

        let avg_physical: Vec<CalibrationSample> = physical
            .iter()
            .enumerate()
            .map(|(i, s)| CalibrationSample {
                x: s.x,
                y: avg_y[i / cols],
                z: s.z,
            })
            .collect();

        Ok(Self {
            rows,
            cols,
            physical,
            display,
            avg_y,
            avg_physical,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn physical(&self, index: usize) -> CalibrationSample {
        self.physical[index]
    }

    pub fn display(&self, index: usize) -> DisplayPoint {
        self.display[index]
    }

    /// Load a grid from the persisted text format: one `px py pz vx vy`
    /// line per point, row-major, no header
    pub fn load(path: &Path, rows: usize, cols: usize) -> Result<Self, CalibrationError> {
        let file = File::open(path).map_err(|e| CalibrationError::Malformed {
            line: 0,
            reason: e.to_string(),
        })?;

        let mut physical = Vec::with_capacity(rows * cols);
        let mut display = Vec::with_capacity(rows * cols);
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| CalibrationError::Malformed {
                line: i + 1,
                reason: e.to_string(),
            })?;
            let malformed = |reason: &str| CalibrationError::Malformed {
                line: i + 1,
                reason: reason.to_string(),
            };

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 5 {
                return Err(malformed(&format!("expected 5 fields, got {}", fields.len())));
            }
            let px: i64 = fields[0].parse().map_err(|_| malformed("bad sensor x"))?;
            let py: i64 = fields[1].parse().map_err(|_| malformed("bad sensor y"))?;
            let pz: f64 = fields[2].parse().map_err(|_| malformed("bad depth"))?;
            let vx: u32 = fields[3].parse().map_err(|_| malformed("bad display x"))?;
            let vy: u32 = fields[4].parse().map_err(|_| malformed("bad display y"))?;

            physical.push(CalibrationSample {
                x: px as f64,
                y: py as f64,
                z: pz,
            });
            display.push(DisplayPoint { x: vx, y: vy });
        }

        if physical.len() != rows * cols {
            return Err(CalibrationError::Malformed {
                line: physical.len() + 1,
                reason: format!("expected {} points, got {}", rows * cols, physical.len()),
            });
        }

        debug!(rows, cols, path = %path.display(), "Loaded calibration grid");
        Self::new(rows, cols, physical, display)
    }

    /// Persist the grid in the format read by [`load`]
    ///
    /// [`load`]: CalibrationGrid::load
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        for (sample, point) in self.physical.iter().zip(&self.display) {
            writeln!(
                out,
                "{} {} {} {} {}",
                sample.x.round() as i64,
                sample.y.round() as i64,
                sample.z,
                point.x,
                point.y
            )?;
        }
        out.flush()
    }
}

/// Piecewise bilinear mapper across the calibration cells
#[derive(Debug, Clone)]
pub struct VirtualMapper {
    grid: CalibrationGrid,
    screen_width: u32,
    screen_height: u32,
}

impl VirtualMapper {
    pub fn new(grid: CalibrationGrid, screen_width: u32, screen_height: u32) -> Self {
        Self {
            grid,
            screen_width,
            screen_height,
        }
    }

    pub fn grid(&self) -> &CalibrationGrid {
        &self.grid
    }

    /// Fill the interaction's display coordinate from its sensor coordinate
    pub fn set_display_coord(&self, interaction: &mut Interaction) {
        interaction.display = Some(self.map(
            interaction.physical.x as f64,
            interaction.physical.y as f64,
        ));
    }

    /// Map a sensor-space point to display pixels. Output is clamped to the
    /// screen whatever the input.
    pub fn map(&self, px: f64, py: f64) -> DisplayPoint {
        let cols = self.grid.cols;
        let rows = self.grid.rows;

        // Bracketing row pair: the point lies between rows r-1 and r
        let r = (1..rows)
            .find(|&r| self.grid.avg_y[r] >= py)
            .unwrap_or(rows - 1);

        // The x of calibration column c, interpolated between the bracketing
        // rows at height py
        let col_x = |c: usize| -> f64 {
            let top = self.grid.avg_physical[(r - 1) * cols + c];
            let bottom = self.grid.avg_physical[r * cols + c];
            interpolate_x(top, bottom, py)
        };

        // Bracketing column pair: sensor x shrinks as c grows, so scan from
        // the right for the first column still at or beyond the point
        let c = (1..=cols.saturating_sub(2))
            .rev()
            .find(|&c| col_x(c) >= px)
            .unwrap_or(0);

        let x_left = col_x(c);
        let x_right = col_x(c + 1);
        let y_top = self.grid.avg_y[r - 1];
        let y_bottom = self.grid.avg_y[r];

        // Position inside the cell; degenerate cells collapse to the anchor
        // corner
        let pct_x = if x_left == x_right {
            0.0
        } else {
            (px - x_left) / (x_right - x_left)
        };
        let pct_y = if y_bottom == y_top {
            0.0
        } else {
            (py - y_top) / (y_bottom - y_top)
        };

        // Cell anchor and extent in display space
        let anchor = self.grid.display[(r - 1) * cols + c];
        let cell_w = self.grid.display[(r - 1) * cols + c + 1].x as f64 - anchor.x as f64;
        let cell_h = self.grid.display[r * cols + c].y as f64 - anchor.y as f64;

        let sw = self.screen_width as f64;
        let sh = self.screen_height as f64;
        let pct_right = (anchor.x as f64 / sw + pct_x * (cell_w / sw)).clamp(0.0, 1.0);
        let pct_down = (anchor.y as f64 / sh + pct_y * (cell_h / sh)).clamp(0.0, 1.0);

        DisplayPoint {
            x: (pct_right * sw).round() as u32,
            y: (pct_down * sh).round() as u32,
        }
    }
}

/// x on the line through two samples, evaluated at height y
fn interpolate_x(p0: CalibrationSample, p1: CalibrationSample, y: f64) -> f64 {
    if p1.y == p0.y {
        return p0.x;
    }
    p0.x + (p1.x - p0.x) * (y - p0.y) / (p1.y - p0.y)
}
