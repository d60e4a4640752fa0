use crate::world::Aabb;
use glam::Vec3;

pub const AVATAR_HALF_EXTENTS: Vec3 = Vec3::new(0.5, 1.0, 0.5);

pub struct Avatar {
    pub position: Vec3,
    pub yaw: f32,
    pub half_extents: Vec3,
}

impl Avatar {
    pub fn new(position: Vec3, yaw: f32) -> Self {
        Self { position, yaw, half_extents: AVATAR_HALF_EXTENTS }
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, self.yaw.cos())
    }

    /// Box standing on the avatar's feet.
    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_center(
            self.position + Vec3::new(0.0, self.half_extents.y, 0.0),
            self.half_extents,
        )
    }
}
