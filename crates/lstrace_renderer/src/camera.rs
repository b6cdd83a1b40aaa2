//! Cameras for primary ray generation.
//!
//! Both cameras mimic a Houdini camera: with no rotation or translation they
//! sit at the origin looking down the negative z-axis. Rotations are Euler
//! angles in degrees applied about X, then Y, then Z; the translation is
//! applied after the rotation.

use crate::{Film, Ray};
use lstrace_math::{camera_to_world, DAffine3, DVec3};
use std::f64::consts::PI;

/// Default focal length in mm (Houdini's camera).
pub const DEFAULT_FOCAL_LENGTH: f64 = 50.0;
/// Default aperture (frame width) in mm (Houdini's camera).
pub const DEFAULT_APERTURE: f64 = 41.2136;
/// Default near clipping plane.
pub const DEFAULT_NEAR_PLANE: f64 = 1e-3;
/// Default far clipping plane.
pub const DEFAULT_FAR_PLANE: f64 = f64::MAX;
/// Default orthographic frame width in world units.
pub const DEFAULT_FRAME_WIDTH: f64 = 1.0;

/// Maps raster coordinates of a film to world-space rays.
pub trait Camera: Send + Sync {
    /// Return a world-space ray through pixel `(col, row)`.
    ///
    /// Offsets are in [0, 1]; 0.5 is the pixel center.
    fn get_ray(&self, col: usize, row: usize, col_offset: f64, row_offset: f64) -> Ray;

    /// Width in pixels of the film this camera was built for.
    fn width(&self) -> usize;

    /// Height in pixels of the film this camera was built for.
    fn height(&self) -> usize;

    /// Ray through the center of pixel `(col, row)`.
    fn get_center_ray(&self, col: usize, row: usize) -> Ray {
        self.get_ray(col, row, 0.5, 0.5)
    }
}

/// State shared by both camera models.
#[derive(Debug, Clone, Copy)]
pub struct CameraFrame {
    width: usize,
    height: usize,
    scale_width: f64,
    scale_height: f64,
    /// Ray from the camera position along its forward axis, clipped to [near, far].
    ray: Ray,
    screen_to_world: DAffine3,
}

impl CameraFrame {
    /// Build the frame for `film`.
    ///
    /// # Panics
    /// Unless `near_plane > 0` and `far_plane > near_plane`.
    pub fn new(
        film: &Film,
        rotation: DVec3,
        translation: DVec3,
        frame_width: f64,
        near_plane: f64,
        far_plane: f64,
    ) -> Self {
        assert!(
            near_plane > 0.0 && far_plane > near_plane,
            "invalid clipping planes: near={near_plane}, far={far_plane}"
        );

        let screen_to_world = camera_to_world(rotation, translation);
        let ray = Ray::new(
            screen_to_world.transform_point3(DVec3::ZERO),
            screen_to_world.transform_vector3(DVec3::NEG_Z),
            near_plane,
            far_plane,
        );

        Self {
            width: film.width(),
            height: film.height(),
            scale_width: frame_width,
            scale_height: frame_width * film.height() as f64 / film.width() as f64,
            ray,
            screen_to_world,
        }
    }

    /// Map raster coordinates to the screen plane at depth `z`.
    ///
    /// Rows grow downwards in the image, so y is flipped.
    #[inline]
    pub fn raster_to_screen(&self, i: f64, j: f64, z: f64) -> DVec3 {
        DVec3::new(
            (2.0 * i / self.width as f64 - 1.0) * self.scale_width,
            (1.0 - 2.0 * j / self.height as f64) * self.scale_height,
            z,
        )
    }

    /// The camera's base ray: eye at the camera position, forward direction.
    pub fn base_ray(&self) -> Ray {
        self.ray
    }
}

/// Pinhole camera parameterised by focal length and aperture.
#[derive(Debug, Clone, Copy)]
pub struct PerspectiveCamera {
    frame: CameraFrame,
}

impl PerspectiveCamera {
    /// Create a perspective camera for `film`.
    ///
    /// - `focal_length`: focal length in mm
    /// - `aperture`: width in mm of the visible frame
    /// - `near_plane`, `far_plane`: clipping distances in world units
    pub fn new(
        film: &Film,
        rotation: DVec3,
        translation: DVec3,
        focal_length: f64,
        aperture: f64,
        near_plane: f64,
        far_plane: f64,
    ) -> Self {
        Self {
            frame: CameraFrame::new(
                film,
                rotation,
                translation,
                0.5 * aperture / focal_length,
                near_plane,
                far_plane,
            ),
        }
    }

    /// A 50mm camera at `translation`, rotated by `rotation` degrees.
    pub fn with_placement(film: &Film, rotation: DVec3, translation: DVec3) -> Self {
        Self::new(
            film,
            rotation,
            translation,
            DEFAULT_FOCAL_LENGTH,
            DEFAULT_APERTURE,
            DEFAULT_NEAR_PLANE,
            DEFAULT_FAR_PLANE,
        )
    }

    pub fn frame(&self) -> &CameraFrame {
        &self.frame
    }

    /// Horizontal field of view in degrees for a focal length and aperture in mm.
    pub fn focal_length_to_field_of_view(length: f64, aperture: f64) -> f64 {
        360.0 / PI * (aperture / (2.0 * length)).atan()
    }

    /// Focal length in mm for a horizontal field of view in degrees and an aperture in mm.
    pub fn field_of_view_to_focal_length(fov: f64, aperture: f64) -> f64 {
        aperture / (2.0 * (fov * PI / 360.0).tan())
    }
}

impl Camera for PerspectiveCamera {
    fn get_ray(&self, col: usize, row: usize, col_offset: f64, row_offset: f64) -> Ray {
        let mut ray = self.frame.ray;
        let dir = self
            .frame
            .raster_to_screen(col as f64 + col_offset, row as f64 + row_offset, -1.0);
        let dir = self.frame.screen_to_world.transform_vector3(dir).normalize();
        // Keep the clip range in world distance along the new direction.
        ray.scale_time(1.0 / dir.dot(ray.dir()));
        ray.set_dir(dir);
        ray
    }

    fn width(&self) -> usize {
        self.frame.width
    }

    fn height(&self) -> usize {
        self.frame.height
    }
}

/// Parallel-projection camera.
#[derive(Debug, Clone, Copy)]
pub struct OrthographicCamera {
    frame: CameraFrame,
}

impl OrthographicCamera {
    /// Create an orthographic camera for `film`.
    ///
    /// `frame_width` is the width of the visible frame in world units.
    pub fn new(
        film: &Film,
        rotation: DVec3,
        translation: DVec3,
        frame_width: f64,
        near_plane: f64,
        far_plane: f64,
    ) -> Self {
        Self {
            frame: CameraFrame::new(
                film,
                rotation,
                translation,
                0.5 * frame_width,
                near_plane,
                far_plane,
            ),
        }
    }

    /// A unit-frame camera at `translation`, rotated by `rotation` degrees.
    pub fn with_placement(film: &Film, rotation: DVec3, translation: DVec3) -> Self {
        Self::new(
            film,
            rotation,
            translation,
            DEFAULT_FRAME_WIDTH,
            DEFAULT_NEAR_PLANE,
            DEFAULT_FAR_PLANE,
        )
    }

    pub fn frame(&self) -> &CameraFrame {
        &self.frame
    }
}

impl Camera for OrthographicCamera {
    fn get_ray(&self, col: usize, row: usize, col_offset: f64, row_offset: f64) -> Ray {
        let mut ray = self.frame.ray;
        let eye = self
            .frame
            .raster_to_screen(col as f64 + col_offset, row as f64 + row_offset, 0.0);
        ray.set_eye(self.frame.screen_to_world.transform_point3(eye));
        ray
    }

    fn width(&self) -> usize {
        self.frame.width
    }

    fn height(&self) -> usize {
        self.frame.height
    }
}
