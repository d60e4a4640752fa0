use crate::config::TerrainConfig;
use crate::world::{ObjectId, ObjectKind, WorldObject, WorldObjects};
use glam::Vec3;

pub const GRASS_BUNCH_HALF_EXTENTS: Vec3 = Vec3::new(0.4, 0.6, 0.4);

/// Square heightfield centred on the origin, sampled on a regular grid.
pub struct Terrain {
    half_size: f32,
    segments: usize,
    cell: f32,
    heights: Vec<f32>,
    grass: WorldObjects,
}

impl Terrain {
    pub fn generate(config: &TerrainConfig) -> Self {
        let segments = config.segments.max(1);
        let side = segments + 1;
        let cell = config.half_size * 2.0 / segments as f32;
        let mut rng = SplitMix64::new(config.seed);
        let phase_x = rng.next_f32() * std::f32::consts::TAU;
        let phase_z = rng.next_f32() * std::f32::consts::TAU;

        let mut heights = vec![0.0; side * side];
        for iz in 0..side {
            for ix in 0..side {
                let x = -config.half_size + ix as f32 * cell;
                let z = -config.half_size + iz as f32 * cell;

                let h1 = (x * 0.1 + phase_x).sin() * (z * 0.1 + phase_z).cos();
                let h2 = (x * 0.05 + phase_z).sin() * (z * 0.05 + phase_x).cos();

                heights[iz * side + ix] = (h1 + h2) * config.amplitude;
            }
        }

        let mut terrain = Self {
            half_size: config.half_size,
            segments,
            cell,
            heights,
            grass: WorldObjects::new(),
        };

        let spread = config.half_size * 0.9;
        for _ in 0..config.grass_count {
            let x = (rng.next_f32() * 2.0 - 1.0) * spread;
            let z = (rng.next_f32() * 2.0 - 1.0) * spread;
            let y = terrain.height_at(x, z);
            terrain
                .grass
                .spawn(ObjectKind::GrassBunch, Vec3::new(x, y, z), GRASS_BUNCH_HALF_EXTENTS);
        }

        log::info!(
            "generated terrain: {}x{} cells, half size {}, {} grass bunches",
            segments,
            segments,
            config.half_size,
            terrain.grass.len()
        );
        terrain
    }

    #[cfg(test)]
    pub fn half_size(&self) -> f32 {
        self.half_size
    }

    pub fn segments(&self) -> usize {
        self.segments
    }

    pub fn in_bounds(&self, v: f32) -> bool {
        v >= -self.half_size && v <= self.half_size
    }

    /// Height of grid vertex `(ix, iz)`, both in `0..=segments`.
    pub fn sample(&self, ix: usize, iz: usize) -> f32 {
        self.heights[iz * (self.segments + 1) + ix]
    }

    /// World-space position of grid vertex `(ix, iz)`.
    pub fn vertex(&self, ix: usize, iz: usize) -> Vec3 {
        Vec3::new(
            -self.half_size + ix as f32 * self.cell,
            self.sample(ix, iz),
            -self.half_size + iz as f32 * self.cell,
        )
    }

    /// Surface height at `(x, z)`, interpolated on the same triangle the mesh
    /// draws. Inputs outside the domain are clamped to its edge.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let gx = ((x + self.half_size) / self.cell).clamp(0.0, self.segments as f32);
        let gz = ((z + self.half_size) / self.cell).clamp(0.0, self.segments as f32);

        let ix = (gx.floor() as usize).min(self.segments - 1);
        let iz = (gz.floor() as usize).min(self.segments - 1);
        let fx = gx - ix as f32;
        let fz = gz - iz as f32;

        let tl = self.sample(ix, iz);
        let tr = self.sample(ix + 1, iz);
        let bl = self.sample(ix, iz + 1);
        let br = self.sample(ix + 1, iz + 1);

        // cells are split along the tr-bl diagonal
        if fx + fz <= 1.0 {
            tl + (tr - tl) * fx + (bl - tl) * fz
        } else {
            br + (bl - br) * (1.0 - fx) + (tr - br) * (1.0 - fz)
        }
    }

    pub fn grass_bunches(&self) -> &WorldObjects {
        &self.grass
    }

    pub fn grass_bunches_mut(&mut self) -> &mut WorldObjects {
        &mut self.grass
    }

    pub fn remove_grass_bunch(&mut self, id: ObjectId) -> Option<WorldObject> {
        self.grass.remove(id)
    }

    /// Deterministic scatter of `count` points on the terrain surface.
    pub fn scatter(&self, seed: u64, count: usize) -> Vec<Vec3> {
        let mut rng = SplitMix64::new(seed ^ 0x9e37_79b9_7f4a_7c15);
        let spread = self.half_size * 0.8;
        (0..count)
            .map(|_| {
                let x = (rng.next_f32() * 2.0 - 1.0) * spread;
                let z = (rng.next_f32() * 2.0 - 1.0) * spread;
                Vec3::new(x, self.height_at(x, z), z)
            })
            .collect()
    }
}

struct SplitMix64(u64);

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TerrainConfig {
        TerrainConfig {
            half_size: 100.0,
            segments: 50,
            amplitude: 3.0,
            seed: 11,
            grass_count: 20,
        }
    }

    #[test]
    fn heights_are_finite_across_domain() {
        let terrain = Terrain::generate(&config());
        let mut x = -100.0;
        while x <= 100.0 {
            let mut z = -100.0;
            while z <= 100.0 {
                assert!(terrain.height_at(x, z).is_finite());
                z += 3.7;
            }
            x += 3.7;
        }
        assert!(terrain.height_at(100.0, 100.0).is_finite());
        assert!(terrain.height_at(-100.0, -100.0).is_finite());
    }

    #[test]
    fn matches_grid_vertices() {
        let terrain = Terrain::generate(&config());
        for (ix, iz) in [(0, 0), (3, 7), (25, 25), (50, 50), (50, 0)] {
            let v = terrain.vertex(ix, iz);
            assert!((terrain.height_at(v.x, v.z) - v.y).abs() < 1e-3);
        }
    }

    #[test]
    fn continuous_between_samples() {
        let terrain = Terrain::generate(&config());
        let cell = 200.0 / 50.0;
        let mut max_step = 0.0f32;
        for iz in 0..50 {
            for ix in 0..50 {
                max_step = max_step
                    .max((terrain.sample(ix + 1, iz) - terrain.sample(ix, iz)).abs())
                    .max((terrain.sample(ix, iz + 1) - terrain.sample(ix, iz)).abs())
                    .max((terrain.sample(ix + 1, iz) - terrain.sample(ix, iz + 1)).abs());
            }
        }
        let step = 0.05;
        let mut x = -60.0;
        while x < 60.0 {
            let a = terrain.height_at(x, 12.3);
            let b = terrain.height_at(x + step, 12.3);
            assert!((a - b).abs() <= max_step * step / cell + 1e-4);
            x += step;
        }
    }

    #[test]
    fn deterministic_for_seed() {
        let a = Terrain::generate(&config());
        let b = Terrain::generate(&config());
        assert_eq!(a.height_at(12.5, -40.25), b.height_at(12.5, -40.25));
        let pa: Vec<_> = a.grass_bunches().iter().map(|g| g.position).collect();
        let pb: Vec<_> = b.grass_bunches().iter().map(|g| g.position).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn grass_sits_on_surface_and_can_be_removed() {
        let mut terrain = Terrain::generate(&config());
        assert_eq!(terrain.grass_bunches().len(), 20);
        let first = terrain.grass_bunches().iter().next().unwrap().clone();
        assert!((terrain.height_at(first.position.x, first.position.z) - first.position.y).abs() < 1e-4);
        assert!(terrain.remove_grass_bunch(first.id).is_some());
        assert!(terrain.remove_grass_bunch(first.id).is_none());
        assert_eq!(terrain.grass_bunches().len(), 19);
    }

    #[test]
    fn clamps_out_of_range() {
        let terrain = Terrain::generate(&config());
        assert_eq!(terrain.height_at(500.0, 0.0), terrain.height_at(100.0, 0.0));
    }
}
