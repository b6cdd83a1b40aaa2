//! lstrace renderer - multi-threaded level set ray tracing
//!
//! Renders narrow-band level set volumes into a [`Film`] through a
//! perspective or orthographic [`Camera`] and a simple [`Shader`].
//! Intersection testing is delegated to a [`VolumeIntersector`].
//!
//! These renders are meant for inspecting level sets, not for production
//! quality images.

mod camera;
mod color;
mod film;
mod intersector;
mod partition;
mod shader;
mod sphere;
mod tracer;

pub use camera::{
    Camera, CameraFrame, OrthographicCamera, PerspectiveCamera, DEFAULT_APERTURE,
    DEFAULT_FAR_PLANE, DEFAULT_FOCAL_LENGTH, DEFAULT_FRAME_WIDTH, DEFAULT_NEAR_PLANE,
};
pub use color::Rgba;
pub use film::{Film, FilmError, FilmResult};
pub use intersector::{SurfaceHit, VolumeIntersector};
pub use partition::{default_rows_per_partition, partition_rows, RowPartition};
pub use shader::{DiffuseShader, MatteShader, NormalShader, Shader};
pub use sphere::{SphereIntersector, SphereLevelSet};
pub use tracer::{JitterTable, RenderConfig, RenderContext, JITTER_TABLE_SIZE};

/// Re-export the ray and common math types from lstrace_math
pub use lstrace_math::{DVec3, Interval, Ray};

/// Ray-trace `grid` into `film`, building the intersector from the grid.
///
/// Rays that miss keep the film's existing pixels, so fill the film first.
///
/// # Panics
/// If `pixel_samples` is zero or the film and camera resolutions differ.
pub fn ray_trace<I: VolumeIntersector>(
    grid: &I::Grid,
    shader: &dyn Shader,
    camera: &dyn Camera,
    film: &mut Film,
    pixel_samples: usize,
    seed: u32,
    threaded: bool,
) {
    RenderConfig::<I>::from_grid(grid, shader, camera, pixel_samples, seed).trace(film, threaded);
}

/// Ray-trace into `film` with a prebuilt intersector.
///
/// # Panics
/// If `pixel_samples` is zero or the film and camera resolutions differ.
pub fn ray_trace_with_intersector<I: VolumeIntersector>(
    intersector: &I,
    shader: &dyn Shader,
    camera: &dyn Camera,
    film: &mut Film,
    pixel_samples: usize,
    seed: u32,
    threaded: bool,
) {
    RenderConfig::new(intersector.clone(), shader, camera, pixel_samples, seed)
        .trace(film, threaded);
}
