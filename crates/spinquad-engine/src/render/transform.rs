//! Quad animation: the per-frame angle counter and the rotation it produces.

use bytemuck::{Pod, Zeroable};
use cgmath::{Deg, Matrix4, Quaternion, Rad, Rotation3, SquareMatrix, Vector3};

/// Largest angle (degrees) the counter reports before wrapping.
pub const MAX_ANGLE_DEG: u32 = 360;

/// Rotation animation state.
///
/// The counter reports `0..=360` and wraps once it has passed 360, so 360 is
/// reported for exactly one frame per revolution.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SpinState {
    angle_deg: u32,
}

impl SpinState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the counter at `angle_deg`.
    pub fn starting_at(angle_deg: u32) -> Self {
        Self { angle_deg }
    }

    /// Angle that the next `tick` would report if no wrap applies.
    pub fn angle_deg(&self) -> u32 {
        self.angle_deg
    }

    /// Advances the animation by one frame and returns the angle for this frame.
    pub fn tick(&mut self) -> u32 {
        if self.angle_deg > MAX_ANGLE_DEG {
            self.angle_deg = 0;
        }
        let current = self.angle_deg;
        self.angle_deg += 1;
        current
    }
}

/// Builds the model matrix for `angle_deg`: a rotation about +Z applied to identity.
pub fn rotation_matrix(angle_deg: u32) -> Matrix4<f32> {
    let angle: Rad<f32> = Deg(angle_deg as f32).into();
    let q = Quaternion::from_axis_angle(Vector3::unit_z(), angle);
    Matrix4::identity() * Matrix4::from(q)
}

/// Uniform block layout for `uniform Transform { mat4 transform; }`.
///
/// Column-major, matching GLSL `mat4`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct TransformUniform {
    pub transform: [[f32; 4]; 4],
}

impl TransformUniform {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub fn from_matrix(m: Matrix4<f32>) -> Self {
        Self { transform: m.into() }
    }

    pub fn for_angle(angle_deg: u32) -> Self {
        Self::from_matrix(rotation_matrix(angle_deg))
    }
}

impl Default for TransformUniform {
    fn default() -> Self {
        Self::from_matrix(Matrix4::identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_z_rotation(angle_deg: u32) -> [[f32; 4]; 4] {
        let rad = angle_deg as f32 * std::f32::consts::PI / 180.0;
        let (s, c) = rad.sin_cos();
        [
            [c, s, 0.0, 0.0],
            [-s, c, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]
    }

    fn assert_close(a: [[f32; 4]; 4], b: [[f32; 4]; 4], angle: u32) {
        for col in 0..4 {
            for row in 0..4 {
                let (x, y) = (a[col][row], b[col][row]);
                assert!(
                    (x - y).abs() < 1e-5,
                    "angle {angle}: m[{col}][{row}] = {x}, expected {y}"
                );
            }
        }
    }

    #[test]
    fn rotation_matches_reference_for_every_counter_value() {
        for angle in 0..=MAX_ANGLE_DEG {
            let m: [[f32; 4]; 4] = rotation_matrix(angle).into();
            assert_close(m, reference_z_rotation(angle), angle);
        }
    }

    #[test]
    fn zero_and_full_turn_are_identity() {
        let identity: [[f32; 4]; 4] = Matrix4::<f32>::identity().into();
        assert_close(rotation_matrix(0).into(), identity, 0);
        assert_close(rotation_matrix(360).into(), identity, 360);
    }

    #[test]
    fn quarter_turn_maps_x_to_y() {
        let m = rotation_matrix(90);
        let p = m * cgmath::Vector4::new(0.5, 0.0, 0.0, 1.0);
        assert!(p.x.abs() < 1e-6);
        assert!((p.y - 0.5).abs() < 1e-6);
        assert_eq!(p.w, 1.0);
    }

    #[test]
    fn counter_reports_zero_through_360_then_wraps() {
        let mut spin = SpinState::new();
        for expected in 0..=360 {
            assert_eq!(spin.tick(), expected);
        }
        // 362nd tick.
        assert_eq!(spin.tick(), 0);
        assert_eq!(spin.tick(), 1);
    }

    #[test]
    fn counter_never_exceeds_360_when_observed() {
        let mut spin = SpinState::new();
        for _ in 0..(3 * 361 + 17) {
            assert!(spin.tick() <= MAX_ANGLE_DEG);
        }
    }

    #[test]
    fn counter_past_limit_wraps_on_next_tick() {
        let mut spin = SpinState::starting_at(400);
        assert_eq!(spin.tick(), 0);
        assert_eq!(spin.angle_deg(), 1);
    }

    #[test]
    fn uniform_is_sixty_four_bytes_column_major() {
        assert_eq!(TransformUniform::SIZE, 64);
        let u = TransformUniform::for_angle(90);
        // Column 0 is the image of +X, which a quarter turn sends to +Y.
        assert!(u.transform[0][0].abs() < 1e-6);
        assert!((u.transform[0][1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn default_uniform_is_identity() {
        let u = TransformUniform::default();
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(u.transform[i][j], if i == j { 1.0 } else { 0.0 });
            }
        }
    }
}
