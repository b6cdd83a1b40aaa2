//! RGBA color used by the film and the shaders.

use std::ops::{Add, AddAssign, Mul};

/// Floating-point RGBA components, nominally in [0, 1].
///
/// Arithmetic is channel-wise on all four components, alpha included, so an
/// average of identical colors reproduces that color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from red, green and blue.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Opaque gray of the given intensity.
    pub const fn gray(intensity: f32) -> Self {
        Self::new(intensity, intensity, intensity, 1.0)
    }

    /// Composite `rhs` with this color.
    ///
    /// Computes `s = rhs.a * (1 - a)`, then `rgb = a * rgb + s * rhs.rgb` and
    /// `a = a + s`. An already opaque color is left unchanged whatever `rhs`
    /// is.
    // FIXME: this weights `self` as the front layer, which is the reverse of
    // the usual front-to-back "over"; confirm callers expect that before
    // changing it.
    pub fn over(&mut self, rhs: &Rgba) {
        let s = rhs.a * (1.0 - self.a);
        self.r = self.a * self.r + s * rhs.r;
        self.g = self.a * self.g + s * rhs.g;
        self.b = self.a * self.b + s * rhs.b;
        self.a += s;
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Mul<f32> for Rgba {
    type Output = Rgba;

    fn mul(self, scale: f32) -> Rgba {
        Rgba::new(self.r * scale, self.g * scale, self.b * scale, self.a * scale)
    }
}

impl Mul for Rgba {
    type Output = Rgba;

    fn mul(self, rhs: Rgba) -> Rgba {
        Rgba::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b, self.a * rhs.a)
    }
}

impl Add for Rgba {
    type Output = Rgba;

    fn add(self, rhs: Rgba) -> Rgba {
        Rgba::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b, self.a + rhs.a)
    }
}

impl AddAssign for Rgba {
    fn add_assign(&mut self, rhs: Rgba) {
        self.r += rhs.r;
        self.g += rhs.g;
        self.b += rhs.b;
        self.a += rhs.a;
    }
}
