/// A closed parameter range `[min, max]`.
///
/// Rays carry one of these as their time span: the part of the ray that
/// lies between the near and far clipping planes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// True if `t` lies in `[min, max]`.
    pub fn contains(&self, t: f64) -> bool {
        self.min <= t && t <= self.max
    }

    /// Both ends multiplied by `factor`.
    ///
    /// Used when a ray direction is rescaled so the span still covers the
    /// same segment of space. Overflow saturates to infinity.
    pub fn scale(&self, factor: f64) -> Interval {
        Interval::new(self.min * factor, self.max * factor)
    }
}
