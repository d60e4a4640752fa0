use crate::hud::Hud;
use crate::terrain::Terrain;
use crate::world::{Aabb, ObjectId, ObjectKind, WorldObjects};
use glam::Vec3;

pub const HARVEST_TITLE: &str = "Harvest?";
pub const HARVEST_INSTRUCTION: &str = "(press 'spacebar' to harvest rice grass)";
pub const GATE_TITLE: &str = "Leave a note?";
pub const GATE_INSTRUCTION: &str = "(type, then press 'enter')";

/// Highlights the nearest grass bunch in reach and harvests it on request.
#[derive(Debug, Default)]
pub struct HarvestDetector {
    radius: f32,
    highlighted: Option<ObjectId>,
}

impl HarvestDetector {
    pub fn new(radius: f32) -> Self {
        Self { radius, ..Default::default() }
    }

    #[cfg(test)]
    pub fn highlighted(&self) -> Option<ObjectId> {
        self.highlighted
    }

    pub fn update(&mut self, avatar_position: Vec3, bunches: &mut WorldObjects, hud: &mut Hud) {
        let nearest = bunches
            .iter()
            .filter(|b| b.kind == ObjectKind::GrassBunch)
            .map(|b| (b.id, b.position.distance(avatar_position)))
            .filter(|&(_, d)| d < self.radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id);

        if nearest != self.highlighted {
            if let Some(previous) = self.highlighted {
                bunches.set_highlight(previous, false);
            }
            if let Some(id) = nearest {
                bunches.set_highlight(id, true);
                log::debug!("highlighting grass bunch {:?}", id);
            }
            self.highlighted = nearest;
        }

        if self.highlighted.is_some() {
            hud.show_prompt(HARVEST_TITLE, HARVEST_INSTRUCTION);
        } else {
            hud.hide_prompt();
        }
    }

    /// Harvests the highlighted bunch, returning the new total kept by the
    /// HUD counter. Does nothing when no bunch is highlighted.
    pub fn harvest(&mut self, terrain: &mut Terrain, hud: &mut Hud) -> Option<u32> {
        let id = self.highlighted.take()?;
        terrain.remove_grass_bunch(id);
        let total = hud.count() + 1;
        hud.hide_prompt();
        hud.set_count(total);
        log::info!("rice grass collected: {}", total);
        Some(total)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateState {
    Roaming,
    Prompting { object: ObjectId },
    Showing { object: ObjectId, text: String, remaining: f32 },
}

/// Freezes the avatar on touching a cube until a note has been typed and
/// shown, then removes the cube.
#[derive(Debug)]
pub struct CollisionGate {
    state: GateState,
    message_secs: f32,
}

impl CollisionGate {
    pub fn new(message_secs: f32) -> Self {
        Self { state: GateState::Roaming, message_secs }
    }

    #[cfg(test)]
    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn is_frozen(&self) -> bool {
        !matches!(self.state, GateState::Roaming)
    }

    /// Returns the cube that was touched, if this frame started a collision.
    /// The touched cube stays highlighted until it is removed.
    pub fn update(&mut self, avatar_box: &Aabb, cubes: &mut WorldObjects, hud: &mut Hud) -> Option<ObjectId> {
        if self.is_frozen() {
            return None;
        }
        let hit = cubes
            .iter()
            .find(|c| c.kind == ObjectKind::Cube && c.aabb().intersects(avatar_box))?
            .id;
        cubes.set_highlight(hit, true);
        log::info!("collided with cube {:?}", hit);
        self.state = GateState::Prompting { object: hit };
        hud.show_prompt(GATE_TITLE, GATE_INSTRUCTION);
        hud.open_entry();
        Some(hit)
    }

    pub fn submit(&mut self, hud: &mut Hud) -> bool {
        let GateState::Prompting { object } = self.state else {
            return false;
        };
        let text = hud.take_entry().unwrap_or_default();
        hud.hide_prompt();
        hud.show_message(&text);
        log::info!("submitted note {:?} at cube {:?}", text, object);
        self.state = GateState::Showing { object, text, remaining: self.message_secs };
        true
    }

    pub fn tick(&mut self, dt: f32, cubes: &mut WorldObjects, hud: &mut Hud) {
        let GateState::Showing { object, remaining, .. } = &mut self.state else {
            return;
        };
        *remaining -= dt;
        if *remaining > 0.0 {
            return;
        }
        let object = *object;
        cubes.remove(object);
        hud.clear_message();
        self.state = GateState::Roaming;
        log::debug!("removed cube {:?}, movement unfrozen", object);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerrainConfig;

    fn terrain_with_grass(positions: &[Vec3]) -> Terrain {
        let mut terrain = Terrain::generate(&TerrainConfig {
            half_size: 20.0,
            segments: 10,
            amplitude: 0.0,
            seed: 1,
            grass_count: 0,
        });
        for &p in positions {
            terrain
                .grass_bunches_mut()
                .spawn(ObjectKind::GrassBunch, p, Vec3::splat(0.5));
        }
        terrain
    }

    #[test]
    fn highlights_single_nearest_bunch() {
        let mut terrain = terrain_with_grass(&[Vec3::new(1.5, 0.0, 0.0), Vec3::new(0.5, 0.0, 0.0)]);
        let mut hud = Hud::new();
        let mut detector = HarvestDetector::new(2.0);
        detector.update(Vec3::ZERO, terrain.grass_bunches_mut(), &mut hud);

        let lit: Vec<_> = terrain.grass_bunches().iter().filter(|b| b.highlighted).collect();
        assert_eq!(lit.len(), 1);
        assert_eq!(lit[0].position, Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(hud.prompt().map(|p| p.title.as_str()), Some(HARVEST_TITLE));
    }

    #[test]
    fn leaving_range_clears_highlight_and_prompt() {
        let mut terrain = terrain_with_grass(&[Vec3::new(1.0, 0.0, 0.0)]);
        let mut hud = Hud::new();
        let mut detector = HarvestDetector::new(2.0);
        detector.update(Vec3::ZERO, terrain.grass_bunches_mut(), &mut hud);
        assert!(detector.highlighted().is_some());

        detector.update(Vec3::new(10.0, 0.0, 0.0), terrain.grass_bunches_mut(), &mut hud);
        assert!(detector.highlighted().is_none());
        assert!(terrain.grass_bunches().iter().all(|b| !b.highlighted));
        assert!(hud.prompt().is_none());
    }

    #[test]
    fn switching_bunches_moves_highlight() {
        let mut terrain = terrain_with_grass(&[Vec3::new(1.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0)]);
        let mut hud = Hud::new();
        let mut detector = HarvestDetector::new(2.0);
        detector.update(Vec3::ZERO, terrain.grass_bunches_mut(), &mut hud);
        detector.update(Vec3::new(5.0, 0.0, 0.0), terrain.grass_bunches_mut(), &mut hud);
        let lit: Vec<_> = terrain.grass_bunches().iter().filter(|b| b.highlighted).collect();
        assert_eq!(lit.len(), 1);
        assert_eq!(lit[0].position.x, 5.0);
    }

    #[test]
    fn harvest_counts_once_and_removes() {
        let mut terrain = terrain_with_grass(&[Vec3::new(1.0, 0.0, 0.0)]);
        let mut hud = Hud::with_counter("Ricegrass");
        let mut detector = HarvestDetector::new(2.0);
        detector.update(Vec3::ZERO, terrain.grass_bunches_mut(), &mut hud);

        assert_eq!(detector.harvest(&mut terrain, &mut hud), Some(1));
        assert!(terrain.grass_bunches().is_empty());
        assert!(hud.prompt().is_none());
        assert_eq!(hud.count(), 1);

        assert_eq!(detector.harvest(&mut terrain, &mut hud), None);
        assert_eq!(hud.count(), 1);
    }

    #[test]
    fn harvest_out_of_range_is_noop() {
        let mut terrain = terrain_with_grass(&[Vec3::new(8.0, 0.0, 0.0)]);
        let mut hud = Hud::new();
        let mut detector = HarvestDetector::new(2.0);
        detector.update(Vec3::ZERO, terrain.grass_bunches_mut(), &mut hud);
        assert_eq!(detector.harvest(&mut terrain, &mut hud), None);
        assert_eq!(terrain.grass_bunches().len(), 1);
        assert_eq!(hud.count(), 0);
    }

    #[test]
    fn gate_freezes_until_note_shown() {
        let mut cubes = WorldObjects::new();
        let cube = cubes.spawn(ObjectKind::Cube, Vec3::new(0.0, 1.0, 1.0), Vec3::ONE);
        let mut hud = Hud::new();
        let mut gate = CollisionGate::new(3.0);

        let far = Aabb::from_center(Vec3::new(10.0, 1.0, 10.0), Vec3::splat(0.5));
        assert_eq!(gate.update(&far, &mut cubes, &mut hud), None);
        assert!(!gate.is_frozen());

        let near = Aabb::from_center(Vec3::new(0.0, 1.0, 0.0), Vec3::splat(0.5));
        assert_eq!(gate.update(&near, &mut cubes, &mut hud), Some(cube));
        assert!(gate.is_frozen());
        assert!(hud.is_entry_open());
        assert!(cubes.iter().all(|c| c.highlighted));
        // no second trigger while frozen
        assert_eq!(gate.update(&near, &mut cubes, &mut hud), None);

        hud.type_text("hello");
        assert!(gate.submit(&mut hud));
        assert_eq!(hud.message(), Some("hello"));
        assert!(gate.is_frozen());

        gate.tick(2.0, &mut cubes, &mut hud);
        assert!(gate.is_frozen());
        assert_eq!(cubes.len(), 1);

        gate.tick(1.5, &mut cubes, &mut hud);
        assert!(!gate.is_frozen());
        assert!(cubes.is_empty());
        assert!(hud.message().is_none());
    }

    #[test]
    fn submit_outside_prompt_is_ignored() {
        let mut hud = Hud::new();
        let mut gate = CollisionGate::new(3.0);
        assert!(!gate.submit(&mut hud));
        assert_eq!(gate.state(), &GateState::Roaming);
    }

    #[test]
    fn only_matching_kinds_interact() {
        let mut terrain = terrain_with_grass(&[]);
        terrain
            .grass_bunches_mut()
            .spawn(ObjectKind::Cube, Vec3::new(0.5, 0.0, 0.0), Vec3::ONE);
        let mut hud = Hud::new();
        let mut detector = HarvestDetector::new(2.0);
        detector.update(Vec3::ZERO, terrain.grass_bunches_mut(), &mut hud);
        assert!(detector.highlighted().is_none());

        let mut props = WorldObjects::new();
        props.spawn(ObjectKind::GrassBunch, Vec3::new(0.0, 1.0, 0.0), Vec3::ONE);
        let mut gate = CollisionGate::new(3.0);
        let avatar = Aabb::from_center(Vec3::new(0.0, 1.0, 0.0), Vec3::splat(0.5));
        assert_eq!(gate.update(&avatar, &mut props, &mut hud), None);
        assert!(!gate.is_frozen());
    }
}
