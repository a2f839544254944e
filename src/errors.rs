//! The failure conditions of a rasterization.  There are only two:
//! a grid whose corners or dimensions don't describe a rectangle, and
//! a rasterizer parameter outside its legal range.  Both are caught
//! at construction time; the computation itself cannot fail.

/// Everything that can go wrong while setting up a rasterization.
#[derive(Debug, Fail, PartialEq)]
pub enum FractalError {
    /// The grid's dimensions or complex-plane corners are malformed:
    /// a zero-pixel axis, or a lower corner that isn't strictly below
    /// and to the left of the upper corner.
    #[fail(display = "invalid grid: {}", _0)]
    InvalidGrid(String),

    /// A rasterizer parameter is out of range: a zero iteration
    /// count, or an escape radius that isn't a positive finite
    /// number.
    #[fail(display = "invalid parameter: {}", _0)]
    InvalidParameter(String),
}
