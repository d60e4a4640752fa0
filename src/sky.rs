use crate::config::SkyConfig;
use glam::Vec3;

/// Unit vector toward the sun. `elevation` is degrees above the horizon,
/// `azimuth` degrees around the vertical axis measured from +z.
pub fn sun_direction(elevation: f32, azimuth: f32) -> Vec3 {
    let phi = (90.0 - elevation).to_radians();
    let theta = azimuth.to_radians();
    Vec3::new(phi.sin() * theta.sin(), phi.cos(), phi.sin() * theta.cos())
}

/// Yaw that turns an avatar standing at `position` toward `sun`.
pub fn yaw_towards(sun: Vec3, position: Vec3) -> f32 {
    let to_sun = (sun - position).normalize_or_zero();
    to_sun.x.atan2(to_sun.z)
}

#[derive(Debug, Clone, Copy)]
pub struct Sky {
    pub sun: Vec3,
    pub exposure: f32,
}

impl Sky {
    pub fn new(config: &SkyConfig) -> Self {
        Self {
            sun: sun_direction(config.elevation, config.azimuth),
            exposure: config.exposure,
        }
    }

    /// Background colour: a warm horizon that cools as the sun climbs.
    pub fn clear_color(&self) -> [f64; 3] {
        let height = self.sun.y.clamp(0.0, 1.0) as f64;
        let horizon = [1.0, 0.78, 0.55];
        let zenith = [0.35, 0.55, 0.85];
        let e = self.exposure as f64 * 2.0;
        [
            (horizon[0] + (zenith[0] - horizon[0]) * height) * e,
            (horizon[1] + (zenith[1] - horizon[1]) * height) * e,
            (horizon[2] + (zenith[2] - horizon[2]) * height) * e,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sun_is_unit_and_low_for_small_elevation() {
        let sun = sun_direction(2.0, 180.0);
        assert!((sun.length() - 1.0).abs() < 1e-5);
        assert!(sun.y > 0.0 && sun.y < 0.05);
        // azimuth 180 puts it toward -z
        assert!(sun.z < -0.99);
    }

    #[test]
    fn zenith_sun_points_up() {
        let sun = sun_direction(90.0, 0.0);
        assert!((sun - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn yaw_faces_sun() {
        let sun = Vec3::new(0.0, 0.0, -1.0);
        let yaw = yaw_towards(sun, Vec3::new(0.0, 0.0, 40.0));
        let forward = Vec3::new(yaw.sin(), 0.0, yaw.cos());
        assert!(forward.z < -0.99);
    }
}
