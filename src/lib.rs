#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Escape-time fractal rasterizer
//!
//! The Mandelbrot set is the set of complex numbers `c` for which the
//! orbit `z = z*z + c`, starting at zero, stays bounded forever.  A
//! Julia set holds `c` fixed instead and asks the same question of
//! every starting point `z`.  Either way the picture is made the same
//! way: map every pixel of an image onto a rectangle of the complex
//! plane, iterate the formula at each sample, and record how many
//! iterations pass before the orbit's magnitude crosses an escape
//! threshold.  Points that never escape are presumed to belong to the
//! set's interior and are painted darkest.
//!
//! This crate computes that per-pixel escape raster.  It produces a
//! plain row-major array of escape values, either the raw iteration
//! index or a continuously smoothed count that avoids the banding of
//! the raw one.  Turning that array into an image is the business of
//! whoever holds the array; a grayscale helper and a small CLI that
//! writes PNG files are included.

#[macro_use]
extern crate failure;

extern crate crossbeam;
extern crate image;
extern crate itertools;
extern crate num;
extern crate num_cpus;

pub mod errors;
pub mod grid;
pub mod rasterize;

pub use errors::FractalError;
pub use grid::{ComplexPlaneGrid, Pixel};
pub use rasterize::{Family, FractalRasterizer, FractalResult};
