//! Ray/volume intersection contract.
//!
//! The tracer does not know how a level set is stored or searched. It only
//! needs something that can be built from a grid, copied once per render
//! partition, and asked whether a world-space ray hits the surface.

use crate::Ray;
use lstrace_math::DVec3;

/// Where a ray crossed the zero level set, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub point: DVec3,
    pub normal: DVec3,
}

impl SurfaceHit {
    pub fn new(point: DVec3, normal: DVec3) -> Self {
        Self { point, normal }
    }
}

/// Tests world-space rays against a level set volume.
///
/// Implementations must not fail: a ray either hits within its time span or
/// it doesn't. `intersects_ws` takes `&mut self` so an implementation may
/// keep per-instance caches (e.g. tree accessors); each render partition
/// works on its own clone.
pub trait VolumeIntersector: Clone + Send + Sync {
    /// The volume this intersector is built from.
    type Grid: ?Sized;

    /// Build an intersector for `grid`.
    fn from_grid(grid: &Self::Grid) -> Self;

    /// Return the first surface crossing of `ray` inside its time span.
    fn intersects_ws(&mut self, ray: &Ray) -> Option<SurfaceHit>;
}
