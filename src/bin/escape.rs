extern crate clap;
extern crate escapetime;
extern crate image;
extern crate num;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use escapetime::{ComplexPlaneGrid, Family, FractalRasterizer};
use image::png::PNGEncoder;
use image::pnm::PNMEncoder;
use image::pnm::{PNMSubtype, SampleEncoding};
use image::ColorType;
use num::Complex;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

fn validate_positive_float(s: &str, err: &str) -> Result<(), String> {
    match f64::from_str(s) {
        Ok(f) if f.is_finite() && f > 0.0 => Ok(()),
        _ => Err(err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const LEFTLOWER: &str = "leftlower";
const RIGHTUPPER: &str = "rightupper";
const FAMILY: &str = "family";
const CONSTANT: &str = "constant";
const ITERATIONS: &str = "iterations";
const RADIUS: &str = "radius";
const SMOOTH: &str = "smooth";
const THREADS: &str = "threads";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("escape")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Escape-time fractal renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file (.png, or .pnm for a raw graymap)"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("1000x750")
                .validator(|s| validate_pair::<usize>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(LEFTLOWER)
                .required(false)
                .long(LEFTLOWER)
                .short("l")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-2.5,-1.25")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse left lower corner"))
                .help("Left lower corner of the sampled complex plane"),
        )
        .arg(
            Arg::with_name(RIGHTUPPER)
                .required(false)
                .long(RIGHTUPPER)
                .short("r")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("1.0,1.25")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse right upper corner"))
                .help("Right upper corner of the sampled complex plane"),
        )
        .arg(
            Arg::with_name(FAMILY)
                .required(false)
                .long(FAMILY)
                .short("f")
                .takes_value(true)
                .default_value("mandelbrot")
                .possible_values(&["mandelbrot", "julia"])
                .help("Which set family to iterate"),
        )
        .arg(
            Arg::with_name(CONSTANT)
                .required(false)
                .long(CONSTANT)
                .short("c")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-0.4,0.6")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse the Julia constant"))
                .help("The fixed constant c of a Julia set (ignored for the Mandelbrot)"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("100")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 1000000",
                    )
                })
                .help("Number of iterations per orbit"),
        )
        .arg(
            Arg::with_name(RADIUS)
                .required(false)
                .long(RADIUS)
                .short("e")
                .takes_value(true)
                .default_value("2.0")
                .validator(|s| {
                    validate_positive_float(&s, "The escape radius must be a positive number")
                })
                .help("Escape radius; 2 for the classic set, larger (say 100) when smoothing"),
        )
        .arg(
            Arg::with_name(SMOOTH)
                .required(false)
                .long(SMOOTH)
                .help("Record smoothed escape counts instead of raw iteration indices"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value("1")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads to use in the sweep"),
        )
        .get_matches()
}

fn write_image(outfile: &str, pixels: &[u8], bounds: (usize, usize)) -> Result<(), std::io::Error> {
    let path = Path::new(outfile);
    let output = File::create(&path)?;
    if path.extension().and_then(|e| e.to_str()) == Some("pnm") {
        let mut encoder =
            PNMEncoder::new(output).with_subtype(PNMSubtype::Graymap(SampleEncoding::Binary));
        encoder.encode(pixels, bounds.0 as u32, bounds.1 as u32, ColorType::Gray(8))?;
    } else {
        let encoder = PNGEncoder::new(output);
        encoder.encode(pixels, bounds.0 as u32, bounds.1 as u32, ColorType::Gray(8))?;
    }
    Ok(())
}

/// The raster's row 0 carries the lowest imaginary value, but image
/// rows run top to bottom, so flip the rows before encoding.
fn flip_rows(pixels: &[u8], width: usize) -> Vec<u8> {
    let mut flipped = Vec::with_capacity(pixels.len());
    for row in pixels.chunks(width).rev() {
        flipped.extend_from_slice(row);
    }
    flipped
}

fn main() {
    let matches = args();
    let image_size: (usize, usize) =
        parse_pair(matches.value_of(SIZE).unwrap(), 'x').expect("Error parsing image dimensions");
    let leftlower = parse_complex(matches.value_of(LEFTLOWER).unwrap())
        .expect("Error parsing left lower point");
    let rightupper = parse_complex(matches.value_of(RIGHTUPPER).unwrap())
        .expect("Error parsing right upper point");
    let constant = parse_complex(matches.value_of(CONSTANT).unwrap())
        .expect("Error parsing the Julia constant");
    let iterations = usize::from_str(matches.value_of(ITERATIONS).unwrap())
        .expect("Could not parse iteration count");
    let radius =
        f64::from_str(matches.value_of(RADIUS).unwrap()).expect("Could not parse escape radius");
    let threads =
        usize::from_str(matches.value_of(THREADS).unwrap()).expect("Could not parse thread count");
    let smooth = matches.is_present(SMOOTH);

    let family = match matches.value_of(FAMILY).unwrap() {
        "julia" => Family::Julia(constant),
        _ => Family::Mandelbrot,
    };

    let grid = match ComplexPlaneGrid::new(image_size.0, image_size.1, leftlower, rightupper) {
        Ok(grid) => grid,
        Err(e) => {
            eprintln!("Render failure: {}", e);
            std::process::exit(1);
        }
    };

    let rasterizer = match FractalRasterizer::new(family, iterations, radius, smooth) {
        Ok(rasterizer) => rasterizer,
        Err(e) => {
            eprintln!("Render failure: {}", e);
            std::process::exit(1);
        }
    };

    let result = if threads > 1 {
        rasterizer.compute_parallel(&grid, threads)
    } else {
        rasterizer.compute(&grid)
    };

    // Raw rasters pin white to the iteration limit so the interior
    // is always the brightest band; smoothed rasters scale to the
    // largest value actually seen.
    let white = if smooth {
        result.max_value()
    } else {
        iterations as f64
    };
    let pixels = flip_rows(&result.to_grayscale(white), image_size.0);

    if let Err(e) = write_image(matches.value_of(OUTPUT).unwrap(), &pixels, image_size) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
