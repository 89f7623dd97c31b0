use glam::{Mat3, Quat, Vec3};

use crate::Pose;

const NEARLY_VERTICAL: f32 = 1e-6;

/// Heading-only coordinate frame with pitch and roll removed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct YawBasis {
    right: Vec3,
    up: Vec3,
    forward: Vec3,
}

impl YawBasis {
    /// Derives the basis from a reference pose.
    ///
    /// The forward axis is the reference forward projected onto the horizontal
    /// plane. When that projection degenerates the reference up axis is
    /// projected instead.
    #[must_use]
    pub fn from_reference(reference: &Pose) -> Self {
        let up = Vec3::Y;
        let mut forward = flatten(reference.forward(), up);
        if forward.length_squared() < NEARLY_VERTICAL {
            forward = flatten(reference.up(), up);
        }
        let forward = forward.try_normalize().unwrap_or(Vec3::Z);
        let right = up.cross(forward).try_normalize().unwrap_or(Vec3::X);

        Self { right, up, forward }
    }

    /// Horizontal heading.
    #[must_use]
    pub const fn forward(&self) -> Vec3 {
        self.forward
    }

    /// Lateral axis pointing to the participant's right.
    #[must_use]
    pub const fn right(&self) -> Vec3 {
        self.right
    }

    /// World up axis.
    #[must_use]
    pub const fn up(&self) -> Vec3 {
        self.up
    }

    /// Rotation looking along the heading with world up.
    #[must_use]
    pub fn rotation(&self) -> Quat {
        Quat::from_mat3(&Mat3::from_cols(self.right, self.up, self.forward))
    }

    /// Converts an offset expressed as `(right, up, forward)` into world space.
    #[must_use]
    pub fn to_world(&self, offset: Vec3) -> Vec3 {
        self.right * offset.x + self.up * offset.y + self.forward * offset.z
    }
}

fn flatten(vector: Vec3, normal: Vec3) -> Vec3 {
    vector - normal * vector.dot(normal)
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn pitch_does_not_change_heading() {
        let level = Pose::new(Vec3::ZERO, Quat::from_rotation_y(0.7));
        let pitched = Pose::new(
            Vec3::ZERO,
            Quat::from_rotation_y(0.7) * Quat::from_rotation_x(0.6),
        );

        let level = YawBasis::from_reference(&level);
        let pitched = YawBasis::from_reference(&pitched);

        assert!(level.forward().abs_diff_eq(pitched.forward(), 1e-5));
        assert!(level.right().abs_diff_eq(pitched.right(), 1e-5));
    }

    #[test]
    fn looking_straight_down_falls_back_to_up_axis() {
        let looking_down = Pose::new(Vec3::ZERO, Quat::from_rotation_x(FRAC_PI_2));
        let basis = YawBasis::from_reference(&looking_down);

        assert!(basis.forward().abs_diff_eq(Vec3::Z, 1e-5));
        assert!(basis.right().abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn identity_reference_yields_identity_rotation() {
        let basis = YawBasis::from_reference(&Pose::IDENTITY);
        assert!(basis.rotation().abs_diff_eq(Quat::IDENTITY, 1e-5));
        assert!(basis
            .to_world(Vec3::new(1.0, 2.0, 3.0))
            .abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-5));
    }
}
