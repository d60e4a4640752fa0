use crate::config::{CameraConfig, CameraMode};
use crate::player::Avatar;
use glam::{Mat4, Quat, Vec3};

pub struct FollowCamera {
    pub position: Vec3,
    pub target_position: Vec3,
    pub look_at: Vec3,
    mode: CameraMode,
    look_height: f32,
}

impl FollowCamera {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            position: config.initial_position,
            target_position: config.initial_position,
            look_at: Vec3::ZERO,
            mode: config.mode,
            look_height: config.look_height,
        }
    }

    fn offset_from(avatar: &Avatar, offset: Vec3) -> Vec3 {
        avatar.position + Quat::from_rotation_y(avatar.yaw) * offset
    }

    /// `moving_longitudinal` is true while forward or backward is held; the
    /// smoothed camera only re-aims its target then.
    pub fn update(&mut self, avatar: &Avatar, moving_longitudinal: bool, dt: f32) {
        match self.mode {
            CameraMode::Smoothed { offset, smoothing } => {
                if moving_longitudinal {
                    self.target_position = Self::offset_from(avatar, offset);
                }
                let factor = smoothing.factor(dt);
                self.position = self.position.lerp(self.target_position, factor);
            }
            CameraMode::Rigid { offset } => {
                self.target_position = Self::offset_from(avatar, offset);
                self.position = self.target_position;
            }
        }
        self.look_at = avatar.position + Vec3::new(0.0, self.look_height, 0.0);
    }

    pub fn build_view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.look_at, Vec3::Y)
    }
}

pub struct Projection {
    aspect: f32,
    fovy: f32,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, fovy_degrees: f32, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy_degrees.to_radians(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn build_projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameConfig, Smoothing, Variant};

    fn smoothed(smoothing: Smoothing) -> FollowCamera {
        let mut config = GameConfig::for_variant(Variant::Harvest).camera;
        config.mode = CameraMode::Smoothed { offset: Vec3::new(0.0, 3.0, -12.0), smoothing };
        FollowCamera::new(&config)
    }

    #[test]
    fn smoothed_moves_part_way_toward_target() {
        let mut camera = smoothed(Smoothing::PerFrame(0.05));
        let avatar = Avatar::new(Vec3::ZERO, 0.0);
        let start = camera.position;
        camera.update(&avatar, true, 1.0 / 60.0);
        let target = Vec3::new(0.0, 3.0, -12.0);
        assert_eq!(camera.target_position, target);
        let expected = start + (target - start) * 0.05;
        assert!((camera.position - expected).length() < 1e-4);
        assert_eq!(camera.look_at, Vec3::new(0.0, 6.0, 0.0));
    }

    #[test]
    fn target_only_follows_while_moving_longitudinally() {
        let mut camera = smoothed(Smoothing::PerFrame(0.05));
        let mut avatar = Avatar::new(Vec3::ZERO, 0.0);
        camera.update(&avatar, true, 0.016);
        let target = camera.target_position;
        avatar.yaw = 1.0;
        avatar.position = Vec3::new(5.0, 0.0, 5.0);
        camera.update(&avatar, false, 0.016);
        assert_eq!(camera.target_position, target);
        // still looks at the avatar
        assert_eq!(camera.look_at, Vec3::new(5.0, 6.0, 5.0));
    }

    #[test]
    fn per_frame_smoothing_ignores_frame_time() {
        let avatar = Avatar::new(Vec3::ZERO, 0.0);
        let mut fast = smoothed(Smoothing::PerFrame(0.05));
        let mut slow = smoothed(Smoothing::PerFrame(0.05));
        fast.update(&avatar, true, 1.0 / 144.0);
        slow.update(&avatar, true, 1.0 / 30.0);
        assert_eq!(fast.position, slow.position);
    }

    #[test]
    fn exponential_smoothing_is_frame_rate_independent() {
        let avatar = Avatar::new(Vec3::ZERO, 0.0);
        let mut a = smoothed(Smoothing::Exponential { rate: 3.0 });
        let mut b = smoothed(Smoothing::Exponential { rate: 3.0 });
        for _ in 0..60 {
            a.update(&avatar, true, 1.0 / 60.0);
        }
        for _ in 0..30 {
            b.update(&avatar, true, 1.0 / 30.0);
        }
        assert!((a.position - b.position).length() < 1e-3);
    }

    #[test]
    fn rigid_sits_at_rotated_offset() {
        let config = GameConfig::for_variant(Variant::Gate).camera;
        let mut camera = FollowCamera::new(&config);
        let avatar = Avatar::new(Vec3::new(1.0, 2.0, 3.0), std::f32::consts::PI);
        camera.update(&avatar, false, 0.016);
        // facing -z, so the camera sits on the +z side
        assert!(camera.position.z > avatar.position.z);
        assert!((camera.position.x - 1.0).abs() < 1e-4);
        assert!((camera.position.y - 6.0).abs() < 1e-4);
        assert_eq!(camera.look_at, avatar.position + Vec3::new(0.0, 1.5, 0.0));
    }

    #[test]
    fn projection_handles_zero_height() {
        let mut p = Projection::new(800, 0, 75.0, 0.5, 1000.0);
        p.resize(1024, 768);
        assert!(p.build_projection_matrix().is_finite());
    }

    #[test]
    fn avatar_fully_in_view_for_each_variant() {
        for variant in [Variant::Harvest, Variant::Gate] {
            let config = GameConfig::for_variant(variant).camera;
            let projection = Projection::new(800, 600, config.fovy_degrees, config.znear, config.zfar);
            let mut camera = FollowCamera::new(&config);
            let avatar = Avatar::new(Vec3::new(3.0, 1.0, -2.0), 0.7);
            for _ in 0..600 {
                camera.update(&avatar, true, 1.0 / 60.0);
            }

            let view_proj = projection.build_projection_matrix() * camera.build_view_matrix();
            let head = avatar.position + Vec3::new(0.0, 2.0 * avatar.half_extents.y, 0.0);
            for point in [avatar.position, head] {
                let clip = view_proj * point.extend(1.0);
                let ndc = clip.truncate() / clip.w;
                assert!(clip.w > 0.0, "{variant:?}: behind the camera");
                assert!(ndc.x.abs() < 1.0 && ndc.y.abs() < 1.0, "{variant:?}: {point} at {ndc}");
            }
        }
    }
}
