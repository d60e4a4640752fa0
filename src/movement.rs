use crate::config::{MovementConfig, Steering};
use crate::input::InputState;
use crate::player::Avatar;
use crate::terrain::Terrain;
use glam::Vec3;

/// Advances the avatar by one frame of input: steer, move within the terrain
/// bounds, then pin it to the surface.
pub fn step(avatar: &mut Avatar, input: &InputState, terrain: &Terrain, config: &MovementConfig) {
    let forward = avatar.forward();
    let right = forward.cross(Vec3::Y);

    let mut direction = Vec3::ZERO;
    if input.forward {
        direction += forward;
    }
    if input.backward {
        direction -= forward;
    }
    match config.steering {
        Steering::Rotate => {
            if input.left {
                avatar.yaw += config.rotation_speed;
            }
            if input.right {
                avatar.yaw -= config.rotation_speed;
            }
        }
        Steering::Strafe => {
            if input.left {
                direction -= right;
            }
            if input.right {
                direction += right;
            }
        }
    }

    let direction = direction.normalize_or_zero() * config.movement_speed;
    let new_x = avatar.position.x + direction.x;
    let new_z = avatar.position.z + direction.z;

    if terrain.in_bounds(new_x) {
        avatar.position.x = new_x;
    }
    if terrain.in_bounds(new_z) {
        avatar.position.z = new_z;
    }

    anchor(avatar, terrain, config.vertical_offset);
}

pub fn anchor(avatar: &mut Avatar, terrain: &Terrain, vertical_offset: f32) {
    avatar.position.y = terrain.height_at(avatar.position.x, avatar.position.z) + vertical_offset;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameConfig, TerrainConfig, Variant};
    use crate::input::MoveKey;

    fn terrain() -> Terrain {
        Terrain::generate(&TerrainConfig {
            half_size: 10.0,
            segments: 20,
            amplitude: 2.0,
            seed: 3,
            grass_count: 0,
        })
    }

    fn movement(steering: Steering) -> MovementConfig {
        let mut config = GameConfig::for_variant(Variant::Harvest).movement;
        config.steering = steering;
        config
    }

    #[test]
    fn idle_input_only_anchors() {
        let terrain = terrain();
        let config = movement(Steering::Rotate);
        let mut avatar = Avatar::new(Vec3::new(1.0, -50.0, 2.0), 0.3);
        step(&mut avatar, &InputState::default(), &terrain, &config);
        assert_eq!(avatar.position.x, 1.0);
        assert_eq!(avatar.position.z, 2.0);
        assert_eq!(avatar.position.y, terrain.height_at(1.0, 2.0) + config.vertical_offset);
    }

    #[test]
    fn forward_moves_by_speed_along_facing() {
        let terrain = terrain();
        let config = movement(Steering::Rotate);
        let mut avatar = Avatar::new(Vec3::ZERO, 0.0);
        let mut input = InputState::default();
        input.set(MoveKey::Forward, true);
        step(&mut avatar, &input, &terrain, &config);
        assert!((avatar.position.z - config.movement_speed).abs() < 1e-6);
        assert!(avatar.position.x.abs() < 1e-6);
    }

    #[test]
    fn rotate_steering_turns_in_place() {
        let terrain = terrain();
        let config = movement(Steering::Rotate);
        let mut avatar = Avatar::new(Vec3::ZERO, 0.0);
        let mut input = InputState::default();
        input.set(MoveKey::Left, true);
        step(&mut avatar, &input, &terrain, &config);
        assert_eq!(avatar.yaw, config.rotation_speed);
        assert_eq!(avatar.position.x, 0.0);
        assert_eq!(avatar.position.z, 0.0);
    }

    #[test]
    fn strafe_steering_side_steps() {
        let terrain = terrain();
        let config = movement(Steering::Strafe);
        let mut avatar = Avatar::new(Vec3::ZERO, 0.0);
        let mut input = InputState::default();
        input.set(MoveKey::Right, true);
        step(&mut avatar, &input, &terrain, &config);
        assert_eq!(avatar.yaw, 0.0);
        assert!((avatar.position.x.abs() - config.movement_speed).abs() < 1e-6);
        assert!(avatar.position.z.abs() < 1e-6);
    }

    #[test]
    fn diagonal_is_normalised() {
        let terrain = terrain();
        let config = movement(Steering::Strafe);
        let mut avatar = Avatar::new(Vec3::ZERO, 0.0);
        let mut input = InputState::default();
        input.set(MoveKey::Forward, true);
        input.set(MoveKey::Left, true);
        step(&mut avatar, &input, &terrain, &config);
        let horizontal = Vec3::new(avatar.position.x, 0.0, avatar.position.z).length();
        assert!((horizontal - config.movement_speed).abs() < 1e-6);
    }

    #[test]
    fn stays_inside_bounds_per_axis() {
        let terrain = terrain();
        let mut config = movement(Steering::Rotate);
        config.movement_speed = 0.7;
        // heading diagonally into the +x/+z corner
        let mut avatar = Avatar::new(Vec3::new(9.5, 0.0, 0.0), std::f32::consts::FRAC_PI_4);
        let mut input = InputState::default();
        input.set(MoveKey::Forward, true);
        for _ in 0..100 {
            step(&mut avatar, &input, &terrain, &config);
            assert!(avatar.position.x >= -10.0 && avatar.position.x <= 10.0);
            assert!(avatar.position.z >= -10.0 && avatar.position.z <= 10.0);
            let expected = terrain.height_at(avatar.position.x, avatar.position.z) + config.vertical_offset;
            assert_eq!(avatar.position.y, expected);
        }
        // x got stuck at the edge while z kept sliding
        assert!(avatar.position.x > 9.0);
        assert!(avatar.position.z > 9.0);
    }
}
