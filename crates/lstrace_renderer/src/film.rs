//! Pixel buffer the tracer renders into.
//!
//! Holds a fixed-size, row-major grid of [`Rgba`] values. Besides plain
//! pixel access it offers background initialization (solid fill or a debug
//! checkerboard) and binary PPM output.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::Rgba;

/// Errors that can occur while writing a film to disk.
#[derive(Error, Debug)]
pub enum FilmError {
    #[error("Error opening PPM file \"{}\": {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type FilmResult<T> = Result<T, FilmError>;

/// A width x height image of RGBA pixels.
#[derive(Debug, Clone)]
pub struct Film {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
}

impl Film {
    /// Create a new film filled with opaque black.
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_background(width, height, Rgba::default())
    }

    /// Create a new film filled with `background`.
    pub fn with_background(width: usize, height: usize, background: Rgba) -> Self {
        Self {
            width,
            height,
            pixels: vec![background; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn num_pixels(&self) -> usize {
        self.pixels.len()
    }

    /// All pixels in row-major order.
    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Get the pixel at column `col`, row `row`.
    ///
    /// # Panics
    /// If `col >= width` or `row >= height`.
    pub fn pixel(&self, col: usize, row: usize) -> &Rgba {
        let index = self.index(col, row);
        &self.pixels[index]
    }

    /// Mutable access to the pixel at column `col`, row `row`.
    ///
    /// # Panics
    /// If `col >= width` or `row >= height`.
    pub fn pixel_mut(&mut self, col: usize, row: usize) -> &mut Rgba {
        let index = self.index(col, row);
        &mut self.pixels[index]
    }

    /// Mutable pixels for the whole image, row-major.
    ///
    /// Chunking this slice by multiples of `width` yields disjoint row bands.
    pub(crate) fn pixels_mut(&mut self) -> &mut [Rgba] {
        &mut self.pixels
    }

    /// Set every pixel to `color`.
    pub fn fill(&mut self, color: Rgba) {
        self.pixels.fill(color);
    }

    /// Paint a debug checkerboard.
    ///
    /// Pixel `(i, j)` becomes `c1` when `(i & size) ^ (j & size)` is non-zero
    /// and `c2` otherwise, so `size` should be a power of two.
    pub fn checkerboard(&mut self, c1: Rgba, c2: Rgba, size: usize) {
        let width = self.width;
        for (j, row) in self.pixels.chunks_mut(width.max(1)).enumerate() {
            for (i, pixel) in row.iter_mut().enumerate() {
                *pixel = if (i & size) ^ (j & size) != 0 { c1 } else { c2 };
            }
        }
    }

    /// Encode the film as a binary PPM (P6) image.
    ///
    /// Each channel is written as `(255.0 * value) as u8`: truncated, with
    /// out-of-range values saturating at 0 or 255. Alpha is dropped.
    pub fn write_ppm<W: Write>(&self, mut writer: W) -> FilmResult<()> {
        let mut bytes = Vec::with_capacity(3 * self.pixels.len());
        for p in &self.pixels {
            bytes.push((255.0 * p.r) as u8);
            bytes.push((255.0 * p.g) as u8);
            bytes.push((255.0 * p.b) as u8);
        }

        write!(writer, "P6\n{} {}\n255\n", self.width, self.height)?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Save the film to `<file_name>.ppm`.
    ///
    /// Failures are logged and returned; the film itself is untouched, so a
    /// caller may ignore the result without losing the render.
    pub fn save_ppm(&self, file_name: impl AsRef<Path>) -> FilmResult<PathBuf> {
        let mut name = file_name.as_ref().as_os_str().to_owned();
        name.push(".ppm");
        let path = PathBuf::from(name);

        let result = File::create(&path)
            .map_err(|source| FilmError::Create {
                path: path.clone(),
                source,
            })
            .and_then(|file| self.write_ppm(BufWriter::new(file)));

        match result {
            Ok(()) => {
                log::debug!("Wrote {}x{} PPM to {}", self.width, self.height, path.display());
                Ok(path)
            }
            Err(e) => {
                log::error!("{}", e);
                Err(e)
            }
        }
    }

    #[inline]
    fn index(&self, col: usize, row: usize) -> usize {
        assert!(col < self.width, "column {} out of range (width {})", col, self.width);
        assert!(row < self.height, "row {} out of range (height {})", row, self.height);
        col + row * self.width
    }
}
