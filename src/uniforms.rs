use glam::{EulerRot, Mat4, Quat, Vec3};

/// Per-image uniform block consumed by the vertex shader at set 0, binding 0.
#[repr(C)]
#[derive(Copy, Default, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct UniformMatrices {
    pub world: Mat4,
    pub view: Mat4,
    pub proj: Mat4,
}

impl UniformMatrices {
    pub const SIZE: u64 = size_of::<Self>() as u64;

    pub const EYE: Vec3 = Vec3::new(0., 0., -5.);
    pub const FOVY_DEGREES: f32 = 45.;
    pub const ZNEAR: f32 = 0.01;
    pub const ZFAR: f32 = 100.;

    /// Matrices for the spinning cube at `frame` frames since startup.
    pub fn for_frame(frame: f32, aspect: f32) -> Self {
        let rotation = Quat::from_euler(
            EulerRot::YXZ,
            frame.to_radians(),
            0.,
            (frame / 1.5).to_radians(),
        );
        let world = Mat4::from_scale_rotation_translation(Vec3::ONE, rotation, Vec3::ZERO);
        let view = Mat4::look_at_lh(Self::EYE, Vec3::ZERO, Vec3::Y);

        let mut proj = Mat4::perspective_lh(
            Self::FOVY_DEGREES.to_radians(),
            aspect,
            Self::ZNEAR,
            Self::ZFAR,
        );
        // Vulkan clip space has +y pointing down.
        proj.y_axis.y *= -1.;

        Self { world, view, proj }
    }
}

/// Frame counter driving the rotation. Starts at zero and only ever grows by one.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FrameClock {
    frame: f32,
}

impl FrameClock {
    pub fn current(&self) -> f32 {
        self.frame
    }

    /// Returns the value for the frame being rendered and advances the counter.
    pub fn tick(&mut self) -> f32 {
        let frame = self.frame;
        self.frame += 1.;
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn clock_counts_up_by_one() {
        let mut clock = FrameClock::default();
        let ticks: Vec<f32> = (0..5).map(|_| clock.tick()).collect();
        assert_eq!(ticks, [0., 1., 2., 3., 4.]);
        assert_eq!(clock.current(), 5.);

        let mut previous = clock.current();
        for _ in 0..1000 {
            clock.tick();
            assert_eq!(clock.current() - previous, 1.);
            previous = clock.current();
        }
    }

    #[test]
    fn first_frame_has_identity_world() {
        let matrices = UniformMatrices::for_frame(0., 16. / 9.);
        assert!(matrices.world.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn projection_y_is_flipped() {
        let aspect = 480. / 270.;
        let matrices = UniformMatrices::for_frame(0., aspect);
        let unflipped = Mat4::perspective_lh(45f32.to_radians(), aspect, 0.01, 100.);
        assert!(matrices.proj.y_axis.y < 0.);
        assert_eq!(matrices.proj.y_axis.y, -unflipped.y_axis.y);
        assert_eq!(matrices.proj.x_axis, unflipped.x_axis);
        assert_eq!(matrices.proj.z_axis, unflipped.z_axis);
    }

    #[test]
    fn camera_looks_at_origin_from_behind() {
        let matrices = UniformMatrices::for_frame(0., 1.);
        let origin_in_view = matrices.view * Vec4::new(0., 0., 0., 1.);
        assert!((origin_in_view.z - 5.).abs() < 1e-5);
        assert!(origin_in_view.x.abs() < 1e-5 && origin_in_view.y.abs() < 1e-5);

        let clip = matrices.proj * origin_in_view;
        let depth = clip.z / clip.w;
        assert!((0.0..=1.0).contains(&depth));
    }

    #[test]
    fn rotation_preserves_scale() {
        let matrices = UniformMatrices::for_frame(123., 1.);
        let corner = matrices.world.transform_point3(Vec3::ONE);
        assert!((corner.length() - Vec3::ONE.length()).abs() < 1e-4);
    }

    #[test]
    fn block_is_three_column_major_matrices() {
        assert_eq!(UniformMatrices::SIZE, 3 * 64);
        let matrices = UniformMatrices::for_frame(10., 2.);
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&matrices));
        assert_eq!(&floats[..16], &matrices.world.to_cols_array());
        assert_eq!(&floats[32..], &matrices.proj.to_cols_array());
    }
}
