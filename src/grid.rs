//! Contains the ComplexPlaneGrid struct, which describes a
//! relationship between a rectangle of pixels with an origin at 0,0
//! and a rectangle on the complex plane with an arbitrary pair of
//! corners defining the leftlower and rightupper corners.  Unlike a
//! plain ratio mapping, the grid samples both endpoints: column 0
//! lands exactly on the left edge and column `width - 1` exactly on
//! the right edge, and likewise for rows.

use num::Complex;

use errors::FractalError;

/// Describes the column and row of a point in the pixel rectangle.
/// Column first, row second, both counted from the left-lower corner
/// of the rectangle at 0,0.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// An immutable rectangular sampling of the complex plane.  Row 0
/// carries the imaginary lower bound; whether that renders at the top
/// or the bottom of an image is the image writer's concern, not the
/// grid's.
#[derive(Debug)]
pub struct ComplexPlaneGrid {
    width: usize,
    height: usize,
    /// The left-lower corner of the complex rectangle.
    leftlower: Complex<f64>,
    /// The right-upper corner of the complex rectangle.
    rightupper: Complex<f64>,
    // The distance between two adjacent samples on each axis.  Zero
    // when the axis has a single pixel, in which case that pixel
    // samples the lower bound.
    steps: (f64, f64),
}

impl ComplexPlaneGrid {
    /// Constructor.  Takes the pixel width and height of the grid and
    /// the two corners of the complex rectangle it samples.  Both
    /// dimensions must be positive and the leftlower corner must be
    /// strictly left of and below the rightupper corner.
    pub fn new(
        width: usize,
        height: usize,
        leftlower: Complex<f64>,
        rightupper: Complex<f64>,
    ) -> Result<ComplexPlaneGrid, FractalError> {
        if width == 0 || height == 0 {
            return Err(FractalError::InvalidGrid(format!(
                "grid dimensions must be positive, got {}x{}",
                width, height
            )));
        }

        if rightupper.re <= leftlower.re {
            return Err(FractalError::InvalidGrid(
                "the left lower corner is not to the left of the right upper corner".to_string(),
            ));
        }

        if rightupper.im <= leftlower.im {
            return Err(FractalError::InvalidGrid(
                "the left lower corner is not lower than the right upper corner".to_string(),
            ));
        }

        let steps = (
            span_step(leftlower.re, rightupper.re, width),
            span_step(leftlower.im, rightupper.im, height),
        );

        Ok(ComplexPlaneGrid {
            width,
            height,
            leftlower,
            rightupper,
            steps,
        })
    }

    /// The pixel width of the grid.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The pixel height of the grid.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The total number of samples in the grid.  Used to calculate
    /// memory needs.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// A grid can never actually be empty; the constructor refuses
    /// zero-pixel axes.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Given a pixel in the rectangle, return the complex number it
    /// samples.  The real part follows the column, the imaginary part
    /// the row.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        Complex::new(
            self.leftlower.re + (pixel.0 as f64) * self.steps.0,
            self.leftlower.im + (pixel.1 as f64) * self.steps.1,
        )
    }
}

// Endpoint-inclusive sampling: the step divides the span by the
// number of gaps between samples, not the number of samples.
fn span_step(low: f64, high: f64, pixels: usize) -> f64 {
    if pixels > 1 {
        (high - low) / ((pixels - 1) as f64)
    } else {
        0.0
    }
}
