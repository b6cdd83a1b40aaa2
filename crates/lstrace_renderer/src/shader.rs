//! Surface shaders.
//!
//! Each shader maps a surface hit to a color with no lighting model beyond
//! a headlight. Shaders are cloned once per render partition.

use crate::{Ray, Rgba};
use lstrace_math::DVec3;

/// Converts a surface hit into a color.
pub trait Shader: Send + Sync {
    /// Shade the world-space hit `point` with surface `normal`, seen along `ray`.
    fn shade(&self, point: DVec3, normal: DVec3, ray: &Ray) -> Rgba;

    /// Clone into a new boxed shader.
    ///
    /// Every render partition shades with its own instance.
    fn clone_box(&self) -> Box<dyn Shader>;
}

impl Clone for Box<dyn Shader> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Flat color, independent of geometry.
#[derive(Debug, Clone, Copy)]
pub struct MatteShader {
    color: Rgba,
}

impl MatteShader {
    pub fn new(color: Rgba) -> Self {
        Self { color }
    }
}

impl Default for MatteShader {
    fn default() -> Self {
        Self::new(Rgba::WHITE)
    }
}

impl Shader for MatteShader {
    fn shade(&self, _point: DVec3, _normal: DVec3, _ray: &Ray) -> Rgba {
        self.color
    }

    fn clone_box(&self) -> Box<dyn Shader> {
        Box::new(*self)
    }
}

/// Treats the normal's (x, y, z) as (r, g, b), remapped from [-1, 1] to [0, 1].
#[derive(Debug, Clone, Copy)]
pub struct NormalShader {
    color: Rgba,
}

impl NormalShader {
    pub fn new(color: Rgba) -> Self {
        Self { color }
    }
}

impl Default for NormalShader {
    fn default() -> Self {
        Self::new(Rgba::WHITE)
    }
}

impl Shader for NormalShader {
    fn shade(&self, _point: DVec3, normal: DVec3, _ray: &Ray) -> Rgba {
        let n = 0.5 * (normal + DVec3::ONE);
        self.color * Rgba::rgb(n.x as f32, n.y as f32, n.z as f32)
    }

    fn clone_box(&self) -> Box<dyn Shader> {
        Box::new(*self)
    }
}

/// Two-sided Lambertian shading.
///
/// Assumes a single directional light at the camera, so the cosine term is
/// the dot product of the normal and the ray direction. Taking its absolute
/// value lights back faces too.
#[derive(Debug, Clone, Copy)]
pub struct DiffuseShader {
    color: Rgba,
}

impl DiffuseShader {
    pub fn new(color: Rgba) -> Self {
        Self { color }
    }
}

impl Default for DiffuseShader {
    fn default() -> Self {
        Self::new(Rgba::WHITE)
    }
}

impl Shader for DiffuseShader {
    fn shade(&self, _point: DVec3, normal: DVec3, ray: &Ray) -> Rgba {
        let cosine = normal.dot(ray.dir()).abs() as f32;
        self.color * Rgba::rgb(cosine, cosine, cosine)
    }

    fn clone_box(&self) -> Box<dyn Shader> {
        Box::new(*self)
    }
}
