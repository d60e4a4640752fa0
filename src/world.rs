use glam::{Mat3, Quat, Vec3};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    GrassBunch,
    Cube,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorldObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub position: Vec3,
    pub rotation: Quat,
    pub half_extents: Vec3,
    pub highlighted: bool,
}

impl WorldObject {
    pub fn new(id: ObjectId, kind: ObjectKind, position: Vec3, half_extents: Vec3) -> Self {
        Self {
            id,
            kind,
            position,
            rotation: Quat::IDENTITY,
            half_extents,
            highlighted: false,
        }
    }

    /// World-space box around the rotated object.
    pub fn aabb(&self) -> Aabb {
        let m = Mat3::from_quat(self.rotation);
        let abs = Mat3::from_cols(m.x_axis.abs(), m.y_axis.abs(), m.z_axis.abs());
        Aabb::from_center(self.position, abs * self.half_extents)
    }
}

/// The interactive props currently present in the scene.
#[derive(Debug, Clone, Default)]
pub struct WorldObjects {
    objects: BTreeMap<ObjectId, WorldObject>,
    next_id: u32,
}

impl WorldObjects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, kind: ObjectKind, position: Vec3, half_extents: Vec3) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects
            .insert(id, WorldObject::new(id, kind, position, half_extents));
        id
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<WorldObject> {
        self.objects.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorldObject> {
        self.objects.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut WorldObject> {
        self.objects.values_mut()
    }

    pub fn set_highlight(&mut self, id: ObjectId, on: bool) {
        if let Some(object) = self.objects.get_mut(&id) {
            object.highlighted = on;
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_and_remove() {
        let mut objects = WorldObjects::new();
        let a = objects.spawn(ObjectKind::Cube, Vec3::ZERO, Vec3::ONE);
        let b = objects.spawn(ObjectKind::Cube, Vec3::X, Vec3::ONE);
        assert_ne!(a, b);
        assert_eq!(objects.len(), 2);
        assert!(objects.remove(a).is_some());
        assert!(objects.remove(a).is_none());
        assert_eq!(objects.len(), 1);
        // ids are never reused
        let c = objects.spawn(ObjectKind::Cube, Vec3::Y, Vec3::ONE);
        assert_ne!(a, c);
    }

    #[test]
    fn aabb_overlap() {
        let a = Aabb::from_center(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::from_center(Vec3::new(1.5, 0.0, 0.0), Vec3::ONE);
        let c = Aabb::from_center(Vec3::new(3.0, 0.0, 0.0), Vec3::splat(0.5));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn rotated_box_grows() {
        let mut cube = WorldObject::new(ObjectId(0), ObjectKind::Cube, Vec3::ZERO, Vec3::ONE);
        let flat = cube.aabb();
        cube.rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);
        let turned = cube.aabb();
        assert!(turned.max.x > flat.max.x);
        assert!((turned.max.y - flat.max.y).abs() < 1e-5);
    }
}
