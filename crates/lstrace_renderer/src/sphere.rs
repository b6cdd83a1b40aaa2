//! Analytic sphere level set.
//!
//! Stands in for a voxelized level set when no volume file is at hand: the
//! command-line renderer draws it, and the tracer tests use it as a volume
//! with a known answer.

use crate::{Ray, SurfaceHit, VolumeIntersector};
use lstrace_math::DVec3;

/// Signed distance field of a sphere: negative inside, zero on the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereLevelSet {
    center: DVec3,
    radius: f64,
}

impl SphereLevelSet {
    /// Create a new sphere. Negative radii are clamped to zero.
    pub fn new(center: DVec3, radius: f64) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
        }
    }

    pub fn center(&self) -> DVec3 {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Signed distance from `p` to the surface.
    pub fn signed_distance(&self, p: DVec3) -> f64 {
        (p - self.center).length() - self.radius
    }
}

/// Closed-form ray intersector for [`SphereLevelSet`].
#[derive(Debug, Clone, Copy)]
pub struct SphereIntersector {
    sphere: SphereLevelSet,
}

impl SphereIntersector {
    pub fn new(sphere: SphereLevelSet) -> Self {
        Self { sphere }
    }
}

impl VolumeIntersector for SphereIntersector {
    type Grid = SphereLevelSet;

    fn from_grid(grid: &SphereLevelSet) -> Self {
        Self::new(*grid)
    }

    fn intersects_ws(&mut self, ray: &Ray) -> Option<SurfaceHit> {
        let oc = ray.eye() - self.sphere.center;
        let a = ray.dir().length_squared();
        let h = ray.dir().dot(oc);
        let c = oc.length_squared() - self.sphere.radius * self.sphere.radius;

        let discriminant = h * h - a * c;
        if a == 0.0 || discriminant < 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the ray's time span
        let mut root = (-h - sqrtd) / a;
        if !ray.t.contains(root) {
            root = (-h + sqrtd) / a;
            if !ray.t.contains(root) {
                return None;
            }
        }

        let point = ray.at(root);
        let normal = if self.sphere.radius > 0.0 {
            (point - self.sphere.center) / self.sphere.radius
        } else {
            -ray.dir().normalize()
        };
        Some(SurfaceHit::new(point, normal))
    }
}
