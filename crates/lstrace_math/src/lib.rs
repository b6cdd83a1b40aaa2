// Re-export glam for convenience
pub use glam::*;

// lstrace math types
mod interval;
mod ray;
mod transform;

pub use interval::Interval;
pub use ray::Ray;
pub use transform::{camera_to_world, rotation_xyz_degrees};
