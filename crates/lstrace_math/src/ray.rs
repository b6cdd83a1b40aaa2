use crate::{DVec3, Interval};

/// A ray in world space with an eye point, a direction and a time span.
///
/// The time span `[t.min, t.max]` is the valid parameter range along the
/// ray. Cameras set it from their clipping planes; intersectors only report
/// hits inside it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub eye: DVec3,
    pub dir: DVec3,
    pub t: Interval,
}

impl Ray {
    /// Create a new ray.
    pub fn new(eye: DVec3, dir: DVec3, t0: f64, t1: f64) -> Self {
        Self {
            eye,
            dir,
            t: Interval::new(t0, t1),
        }
    }

    /// Get the eye (origin) of the ray.
    #[inline]
    pub fn eye(&self) -> DVec3 {
        self.eye
    }

    /// Get the direction vector of the ray.
    #[inline]
    pub fn dir(&self) -> DVec3 {
        self.dir
    }

    #[inline]
    pub fn t0(&self) -> f64 {
        self.t.min
    }

    #[inline]
    pub fn t1(&self) -> f64 {
        self.t.max
    }

    #[inline]
    pub fn set_eye(&mut self, eye: DVec3) {
        self.eye = eye;
    }

    #[inline]
    pub fn set_dir(&mut self, dir: DVec3) {
        self.dir = dir;
    }

    /// Multiply both ends of the time span by `scale`.
    ///
    /// Used when the direction is renormalised so the span keeps measuring
    /// the same world-space distances.
    #[inline]
    pub fn scale_time(&mut self, scale: f64) {
        self.t = self.t.scale(scale);
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: eye + t * dir
    pub fn at(&self, t: f64) -> DVec3 {
        self.eye + self.dir * t
    }
}
