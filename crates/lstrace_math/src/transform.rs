// Camera placement transforms
//
// Builds the camera-to-world affine map from Euler angles and a translation.
// glam::DAffine3 already provides transform_point3() (full map) and
// transform_vector3() (linear part only, i.e. the Jacobian).

use glam::{DAffine3, DVec3};

/// Rotation about X, then Y, then Z, with angles given in degrees.
///
/// In column-vector form this is `Rz * Ry * Rx`. The order matters for any
/// rotation that is not about a single axis.
pub fn rotation_xyz_degrees(rotation: DVec3) -> DAffine3 {
    DAffine3::from_rotation_z(rotation.z.to_radians())
        * DAffine3::from_rotation_y(rotation.y.to_radians())
        * DAffine3::from_rotation_x(rotation.x.to_radians())
}

/// Camera-to-world map: XYZ Euler rotation (degrees) followed by a translation.
pub fn camera_to_world(rotation: DVec3, translation: DVec3) -> DAffine3 {
    DAffine3::from_translation(translation) * rotation_xyz_degrees(rotation)
}
