// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time core.  A FractalRasterizer owns the iteration
//! parameters (family, iteration limit, escape radius, coloring
//! mode) and sweeps a ComplexPlaneGrid, producing one escape value
//! per pixel.  Every pixel's orbit is independent of every other
//! pixel's, so the threaded variant simply hands each worker a
//! disjoint band of result rows; the two variants produce
//! bit-identical output.

use num::{clamp, Complex};
use std::f64::consts::LN_2;

use errors::FractalError;
use grid::{ComplexPlaneGrid, Pixel};

/// Which of the two iteration quantities is fixed across the grid.
/// The Mandelbrot family starts every orbit at zero and takes `c`
/// from the grid sample; the Julia family starts the orbit at the
/// grid sample and carries its fixed constant `c` with it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Family {
    /// `z0 = 0`, `c` varies per pixel.
    Mandelbrot,
    /// `z0` varies per pixel, `c` is the given constant.
    Julia(Complex<f64>),
}

/// The final escape raster: one real-valued escape value per grid
/// cell, row-major, row 0 first.  This is the sole artifact of a
/// computation; once built it is never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct FractalResult {
    width: usize,
    height: usize,
    values: Vec<f64>,
}

impl FractalResult {
    /// The pixel width of the raster.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The pixel height of the raster.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The raw escape values, row-major, `width * height` of them.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// The escape value at a single pixel.
    pub fn value(&self, pixel: &Pixel) -> f64 {
        self.values[pixel.1 * self.width + pixel.0]
    }

    /// The largest escape value in the raster.  Useful as the white
    /// point when scaling a smoothed raster to grayscale.
    pub fn max_value(&self) -> f64 {
        self.values.iter().fold(0.0, |a, &v| if v > a { v } else { a })
    }

    /// Scale the raster to 8-bit grayscale: `0.0` maps to black, the
    /// given white point to white, and anything beyond it saturates.
    /// A non-positive white point yields an all-black buffer.
    pub fn to_grayscale(&self, white: f64) -> Vec<u8> {
        if white <= 0.0 {
            return vec![0; self.values.len()];
        }
        self.values
            .iter()
            .map(|v| clamp(v / white * 255.0, 0.0, 255.0) as u8)
            .collect()
    }

    /// Consume the raster, yielding the bare value buffer.
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

/// Computes escape-time rasters.  Construct one with the iteration
/// parameters, then point it at as many grids as you like; the
/// computation is a pure function of the rasterizer and the grid.
///
/// In raw mode every escape value is the integral iteration index at
/// which the orbit's magnitude first exceeded the escape radius, and
/// pixels that never escape hold the iteration limit itself.  In
/// smooth mode escaped pixels hold the normalized iteration count,
/// a continuous value that eliminates the banding of the raw index,
/// and interior pixels hold zero so they render darkest.  Note the
/// smooth convention makes zero ambiguous with a degenerate
/// immediate escape; that ambiguity is inherited and deliberately
/// left alone.
pub struct FractalRasterizer {
    family: Family,
    max_iter: usize,
    escape_radius: f64,
    smooth: bool,
}

impl FractalRasterizer {
    /// Constructor.  Requires the set family, the per-orbit
    /// iteration limit, the escape radius, and whether to smooth.
    /// The limit must be positive and the radius a positive finite
    /// number; `2.0` is the classic Mandelbrot radius, and smooth
    /// renders look better with a much larger one (say `100.0`).
    pub fn new(
        family: Family,
        max_iter: usize,
        escape_radius: f64,
        smooth: bool,
    ) -> Result<Self, FractalError> {
        if max_iter == 0 {
            return Err(FractalError::InvalidParameter(
                "the iteration limit must be positive".to_string(),
            ));
        }

        if !escape_radius.is_finite() || escape_radius <= 0.0 {
            return Err(FractalError::InvalidParameter(format!(
                "the escape radius must be a positive finite number, got {}",
                escape_radius
            )));
        }

        Ok(FractalRasterizer {
            family,
            max_iter,
            escape_radius,
            smooth,
        })
    }

    /// Sweep the grid on the calling thread and return the raster.
    pub fn compute(&self, grid: &ComplexPlaneGrid) -> FractalResult {
        let mut values = vec![0.0f64; grid.len()];
        self.fill_rows(grid, 0, &mut values);
        FractalResult {
            width: grid.width(),
            height: grid.height(),
            values,
        }
    }

    /// Sweep the grid with a band of rows per worker thread.  Each
    /// worker owns its slice of the result buffer exclusively, so no
    /// synchronization is needed and the output is bit-identical to
    /// [`compute`](#method.compute).
    pub fn compute_parallel(&self, grid: &ComplexPlaneGrid, threads: usize) -> FractalResult {
        let threads = if threads == 0 { 1 } else { threads };
        let mut values = vec![0.0f64; grid.len()];
        let band_rows = (grid.height() / threads) + 1;
        crossbeam::scope(|spawner| {
            for (band, chunk) in values.chunks_mut(band_rows * grid.width()).enumerate() {
                spawner.spawn(move |_| {
                    self.fill_rows(grid, band * band_rows, chunk);
                });
            }
        })
        .unwrap();
        FractalResult {
            width: grid.width(),
            height: grid.height(),
            values,
        }
    }

    /// Fill a contiguous row-major band of the result buffer,
    /// starting at the given grid row.
    fn fill_rows(&self, grid: &ComplexPlaneGrid, first_row: usize, band: &mut [f64]) {
        for (offset, slot) in band.iter_mut().enumerate() {
            let pixel = Pixel(offset % grid.width(), first_row + offset / grid.width());
            *slot = self.escape_value(grid.pixel_to_point(&pixel));
        }
    }

    /// Iterate a single orbit and return its escape value.  The
    /// escape test compares squared magnitudes, and is written so
    /// that an orbit whose magnitude overflows to NaN or infinity
    /// counts as escaped rather than iterating on garbage.
    fn escape_value(&self, sample: Complex<f64>) -> f64 {
        let (mut z, c) = match self.family {
            Family::Mandelbrot => (Complex::new(0.0, 0.0), sample),
            Family::Julia(c) => (sample, c),
        };
        let threshold = self.escape_radius * self.escape_radius;
        for i in 0..self.max_iter {
            z = z * z + c;
            let norm_sqr = z.norm_sqr();
            if !(norm_sqr <= threshold) {
                return if self.smooth {
                    self.smoothed(i, norm_sqr)
                } else {
                    i as f64
                };
            }
        }
        // Never escaped: presumed interior.
        if self.smooth {
            0.0
        } else {
            self.max_iter as f64
        }
    }

    /// The normalized iteration count at the escaping step:
    /// `i + 1 - ln(ln|z| / ln(radius)) / ln 2`.  Falls back to the
    /// raw index if the magnitude has already overflowed.
    fn smoothed(&self, index: usize, norm_sqr: f64) -> f64 {
        let magnitude = norm_sqr.sqrt();
        if !magnitude.is_finite() {
            return index as f64;
        }
        (index as f64) + 1.0 - (magnitude.ln() / self.escape_radius.ln()).ln() / LN_2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::iproduct;

    fn square_grid(pixels: usize, corner: f64) -> ComplexPlaneGrid {
        ComplexPlaneGrid::new(
            pixels,
            pixels,
            Complex::new(-corner, -corner),
            Complex::new(corner, corner),
        )
        .unwrap()
    }

    #[test]
    fn rasterizer_rejects_zero_iterations() {
        let r = FractalRasterizer::new(Family::Mandelbrot, 0, 2.0, false);
        match r {
            Err(FractalError::InvalidParameter(_)) => {}
            _ => panic!("expected an InvalidParameter error"),
        }
    }

    #[test]
    fn rasterizer_rejects_bad_radii() {
        for radius in &[0.0, -2.0, ::std::f64::NAN, ::std::f64::INFINITY] {
            assert!(FractalRasterizer::new(Family::Mandelbrot, 50, *radius, false).is_err());
        }
    }

    #[test]
    fn result_has_the_grid_shape() {
        let grid =
            ComplexPlaneGrid::new(7, 5, Complex::new(-2.0, -1.0), Complex::new(1.0, 1.0)).unwrap();
        let r = FractalRasterizer::new(Family::Mandelbrot, 20, 2.0, false).unwrap();
        let result = r.compute(&grid);
        assert_eq!(result.width(), 7);
        assert_eq!(result.height(), 5);
        assert_eq!(result.values().len(), 35);
    }

    #[test]
    fn raw_values_stay_in_range() {
        let grid = square_grid(17, 2.0);
        let r = FractalRasterizer::new(Family::Mandelbrot, 30, 2.0, false).unwrap();
        let result = r.compute(&grid);
        for (column, row) in iproduct!(0..17, 0..17) {
            let v = result.value(&Pixel(column, row));
            assert!(v >= 0.0 && v <= 30.0);
            assert_eq!(v, v.trunc());
        }
    }

    #[test]
    fn the_origin_never_escapes() {
        // The center pixel of this grid samples c = 0, whose orbit is
        // 0 forever.
        let grid = square_grid(3, 1.0);
        let raw = FractalRasterizer::new(Family::Mandelbrot, 50, 2.0, false).unwrap();
        assert_eq!(raw.compute(&grid).value(&Pixel(1, 1)), 50.0);
        let smooth = FractalRasterizer::new(Family::Mandelbrot, 50, 2.0, true).unwrap();
        assert_eq!(smooth.compute(&grid).value(&Pixel(1, 1)), 0.0);
    }

    #[test]
    fn c_equal_three_escapes_at_index_zero() {
        // Column 2, row 1 samples c = 3 + 0i; the first iteration
        // lands at 3, past the radius.
        let grid =
            ComplexPlaneGrid::new(3, 3, Complex::new(1.0, -1.0), Complex::new(3.0, 1.0)).unwrap();
        let r = FractalRasterizer::new(Family::Mandelbrot, 50, 2.0, false).unwrap();
        assert_eq!(r.compute(&grid).value(&Pixel(2, 1)), 0.0);
    }

    #[test]
    fn mandelbrot_is_conjugate_symmetric() {
        let grid =
            ComplexPlaneGrid::new(9, 9, Complex::new(-2.0, -1.5), Complex::new(1.0, 1.5)).unwrap();
        let result = FractalRasterizer::new(Family::Mandelbrot, 40, 2.0, false)
            .unwrap()
            .compute(&grid);
        for (column, row) in iproduct!(0..9, 0..9) {
            assert_eq!(
                result.value(&Pixel(column, row)),
                result.value(&Pixel(column, 8 - row))
            );
        }
    }

    #[test]
    fn identical_inputs_give_identical_rasters() {
        let grid = square_grid(11, 2.0);
        let r = FractalRasterizer::new(Family::Mandelbrot, 60, 2.0, true).unwrap();
        assert_eq!(r.compute(&grid), r.compute(&grid));
    }

    #[test]
    fn parallel_matches_sequential() {
        let grid =
            ComplexPlaneGrid::new(33, 21, Complex::new(-2.0, -1.2), Complex::new(1.0, 1.2)).unwrap();
        let r = FractalRasterizer::new(Family::Mandelbrot, 80, 2.0, false).unwrap();
        let sequential = r.compute(&grid);
        for threads in &[1, 2, 3, 7, 64] {
            assert_eq!(r.compute_parallel(&grid, *threads), sequential);
        }
    }

    #[test]
    fn parallel_matches_sequential_for_julia() {
        let grid = square_grid(19, 1.5);
        let r = FractalRasterizer::new(Family::Julia(Complex::new(-0.4, 0.6)), 60, 2.0, true)
            .unwrap();
        assert_eq!(r.compute_parallel(&grid, 4), r.compute(&grid));
    }

    #[test]
    fn julia_iterates_from_the_sample() {
        // With c = 0 the Julia iteration is z -> z*z, so any sample
        // with |z| > 1 escapes and any sample with |z| < 1 never
        // does.  The corner samples 2+2i, the center 0.
        let grid = square_grid(3, 2.0);
        let r = FractalRasterizer::new(Family::Julia(Complex::new(0.0, 0.0)), 25, 2.0, false)
            .unwrap();
        let result = r.compute(&grid);
        assert_eq!(result.value(&Pixel(0, 0)), 0.0);
        assert_eq!(result.value(&Pixel(1, 1)), 25.0);
    }

    #[test]
    fn smooth_values_stay_within_one_step_of_the_raw_index() {
        let grid =
            ComplexPlaneGrid::new(21, 21, Complex::new(-2.0, -1.25), Complex::new(0.5, 1.25))
                .unwrap();
        let raw = FractalRasterizer::new(Family::Mandelbrot, 40, 100.0, false)
            .unwrap()
            .compute(&grid);
        let smooth = FractalRasterizer::new(Family::Mandelbrot, 40, 100.0, true)
            .unwrap()
            .compute(&grid);
        for (column, row) in iproduct!(0..21, 0..21) {
            let i = raw.value(&Pixel(column, row));
            if i < 40.0 {
                let nu = smooth.value(&Pixel(column, row));
                assert!(
                    nu > i - 1e-3 && nu < i + 1.0,
                    "escape at {} smoothed to {}",
                    i,
                    nu
                );
            }
        }
    }

    #[test]
    fn the_classic_view_of_the_mandelbrot() {
        let grid = ComplexPlaneGrid::new(100, 100, Complex::new(-2.0, -1.5), Complex::new(1.0, 1.5))
            .unwrap();
        let r = FractalRasterizer::new(Family::Mandelbrot, 100, 2.0, false).unwrap();
        let result = r.compute(&grid);
        // The center pixel samples c near -0.5, deep in the main
        // cardioid.
        assert_eq!(result.value(&Pixel(50, 50)), 100.0);
        // The corners sample far outside the set and escape within a
        // couple of iterations.
        assert!(result.value(&Pixel(0, 0)) <= 2.0);
        assert!(result.value(&Pixel(99, 99)) <= 2.0);
    }

    #[test]
    fn samples_past_the_radius_escape_at_index_zero() {
        // Column 4, row 2 samples c = 2.5 + 0i, so the very first
        // iterate already has magnitude past the radius.
        let grid = square_grid(5, 2.5);
        let r = FractalRasterizer::new(Family::Mandelbrot, 100, 2.0, false).unwrap();
        assert_eq!(r.compute(&grid).value(&Pixel(4, 2)), 0.0);
    }

    #[test]
    fn the_escape_test_is_strict() {
        // c = 2 lands its first iterate exactly on the radius, which
        // is not an escape; the second iterate, at 6, is.
        let grid = square_grid(5, 2.0);
        let r = FractalRasterizer::new(Family::Mandelbrot, 100, 2.0, false).unwrap();
        assert_eq!(r.compute(&grid).value(&Pixel(4, 2)), 1.0);
    }

    #[test]
    fn grayscale_scales_to_the_white_point() {
        let result = FractalResult {
            width: 4,
            height: 1,
            values: vec![0.0, 25.0, 50.0, 75.0],
        };
        assert_eq!(result.to_grayscale(50.0), vec![0, 127, 255, 255]);
        assert_eq!(result.to_grayscale(0.0), vec![0, 0, 0, 0]);
        assert_eq!(result.max_value(), 75.0);
    }
}
