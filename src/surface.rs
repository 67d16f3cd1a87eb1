// SPDX-License-Identifier: GPL-3.0-only

//! Power-law surface model
//!
//! The sensor looks across the projection surface at an oblique angle, so
//! depth along the centre column grows super-linearly with image row. A
//! power curve `d = A·y^B` fits that relationship well over the operating
//! range for flat surfaces. The model also carries, per row, the horizontal
//! bounds inside which the surface is confidently visible.

use tracing::debug;

use crate::constants::{DEPTH_MAX_MM, DEPTH_MIN_MM, surface};
use crate::detector::classify;
use crate::errors::SurfaceError;
use crate::frame::DepthFrame;

/// Sentinel pair meaning "no surface on this row": `left_x` past the right
/// edge, `right_x` before the left edge.
pub const NO_SURFACE_LEFT: i32 = i32::MAX;
pub const NO_SURFACE_RIGHT: i32 = -1;

/// Analytic fit of the projection surface plus per-row visibility bounds.
/// Built once per reference frame and immutable until the reference is
/// replaced.
#[derive(Debug, Clone)]
pub struct SurfaceModel {
    a: f64,
    b: f64,
    /// Modelled depth per row, `A·y^B`
    expected: Vec<f32>,
    /// Inclusive horizontal bounds of confidently-on-surface pixels per row
    left_x: Vec<i32>,
    right_x: Vec<i32>,
}

impl SurfaceModel {
    /// Fit the surface from a reference frame captured with nothing on it
    pub fn fit(reference: &DepthFrame) -> Result<Self, SurfaceError> {
        let (a, b) = fit_power_curve(reference)?;

        let height = reference.height();
        let expected: Vec<f32> = (0..height)
            .map(|y| (a * (y as f64).powf(b)) as f32)
            .collect();

        let mut model = Self {
            a,
            b,
            expected,
            left_x: vec![NO_SURFACE_LEFT; height],
            right_x: vec![NO_SURFACE_RIGHT; height],
        };
        model.build_bounds(reference);

        debug!(a, b, "Fitted surface model");
        Ok(model)
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn b(&self) -> f64 {
        self.b
    }

    /// Modelled surface depth at a row. Rows outside the frame read as 0.
    pub fn expected_depth(&self, y: i32) -> f32 {
        if y < 0 || y as usize >= self.expected.len() {
            return 0.0;
        }
        self.expected[y as usize]
    }

    pub fn height(&self) -> usize {
        self.expected.len()
    }

    /// Inclusive left bound of the surface on a row, or the sentinel
    pub fn left_x(&self, y: i32) -> i32 {
        if y < 0 || y as usize >= self.left_x.len() {
            return NO_SURFACE_LEFT;
        }
        self.left_x[y as usize]
    }

    /// Inclusive right bound of the surface on a row, or the sentinel
    pub fn right_x(&self, y: i32) -> i32 {
        if y < 0 || y as usize >= self.right_x.len() {
            return NO_SURFACE_RIGHT;
        }
        self.right_x[y as usize]
    }

    /// Whether any surface was found on the row
    pub fn row_has_surface(&self, y: i32) -> bool {
        self.right_x(y) >= self.left_x(y)
    }

    /// Whether x lies strictly inside the row's surface bounds
    pub fn strictly_inside_bounds(&self, x: i32, y: i32) -> bool {
        let left = self.left_x(y);
        let right = self.right_x(y);
        left < x && x < right
    }

    /// Whether x lies inside the row's surface bounds, edges included
    pub fn inside_bounds(&self, x: i32, y: i32) -> bool {
        let left = self.left_x(y);
        let right = self.right_x(y);
        left <= x && x <= right
    }

    /// Derive `left_x` / `right_x` per row. A pixel counts only when its
    /// whole 3x3 neighborhood is on-surface; eroding by one pixel keeps the
    /// physical surface edge (where foreground objects appear) out of the
    /// bounds.
    fn build_bounds(&mut self, reference: &DepthFrame) {
        let width = reference.width() as i32;
        let height = reference.height() as i32;

        // Classify once, erode on the mask
        let mut on_surface = vec![false; (width * height) as usize];
        for y in 0..height {
            for x in 0..width {
                on_surface[(y * width + x) as usize] = classify::is_pixel_on_surface(
                    reference,
                    self,
                    x,
                    y,
                    surface::BOUNDS_DELTA,
                );
            }
        }

        let eroded = |x: i32, y: i32| -> bool {
            for ny in (y - 1)..=(y + 1) {
                for nx in (x - 1)..=(x + 1) {
                    if nx < 0 || ny < 0 || nx >= width || ny >= height {
                        return false;
                    }
                    if !on_surface[(ny * width + nx) as usize] {
                        return false;
                    }
                }
            }
            true
        };

        for y in 0..height {
            let mut left = NO_SURFACE_LEFT;
            let mut right = NO_SURFACE_RIGHT;
            for x in 0..width {
                if eroded(x, y) {
                    if left == NO_SURFACE_LEFT {
                        left = x;
                    }
                    right = x;
                }
            }
            self.left_x[y as usize] = left;
            self.right_x[y as usize] = right;
        }
    }
}

/// Fit `d = A·y^B` along the centre column of the reference frame
fn fit_power_curve(reference: &DepthFrame) -> Result<(f64, f64), SurfaceError> {
    let xc = (reference.width() / 2) as i32;
    let height = reference.height() as i32;

    // Lowest row with a usable reading, then a margin above it
    let mut y_bottom = None;
    for y in (0..height).rev() {
        let d = reference.pixel_depth(xc, y, 0);
        if d > DEPTH_MIN_MM && d < DEPTH_MAX_MM {
            y_bottom = Some(y);
            break;
        }
    }
    let y_bottom = match y_bottom {
        Some(y) => y - surface::FIT_BOTTOM_MARGIN,
        None => return Err(SurfaceError::InsufficientData { usable: 0 }),
    };

    // Sample upward; the logarithm rules out non-positive depths and rows
    let mut ys = Vec::with_capacity(surface::FIT_SAMPLE_COUNT);
    let mut ds = Vec::with_capacity(surface::FIT_SAMPLE_COUNT);
    for i in 0..surface::FIT_SAMPLE_COUNT as i32 {
        let y = y_bottom - i;
        if y <= 0 {
            break;
        }
        let d = reference.pixel_depth(xc, y, 0);
        if d > 0.0 && d.is_finite() {
            ys.push(y as f64);
            ds.push(d as f64);
        }
    }
    if ys.len() < surface::FIT_MIN_SAMPLES {
        return Err(SurfaceError::InsufficientData { usable: ys.len() });
    }

    Ok(power_regression(&ys, &ds))
}

/// Least-squares power regression in log-log space.
/// Callers must supply strictly positive samples.
fn power_regression(xs: &[f64], ys: &[f64]) -> (f64, f64) {
    let n = xs.len() as f64;
    let mut sum_lx = 0.0;
    let mut sum_ly = 0.0;
    let mut sum_lxly = 0.0;
    let mut sum_lx2 = 0.0;
    for (&x, &y) in xs.iter().zip(ys) {
        let lx = x.ln();
        let ly = y.ln();
        sum_lx += lx;
        sum_ly += ly;
        sum_lxly += lx * ly;
        sum_lx2 += lx * lx;
    }

    let b = (n * sum_lxly - sum_lx * sum_ly) / (n * sum_lx2 - sum_lx * sum_lx);
    let a = ((sum_ly - b * sum_lx) / n).exp();
    (a, b)
}
