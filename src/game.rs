use crate::animation::{Animator, ClipAction};
use crate::camera::FollowCamera;
use crate::config::{GameConfig, Variant};
use crate::hud::Hud;
use crate::input::{Command, InputState, map_key};
use crate::interaction::{CollisionGate, HarvestDetector};
use crate::movement;
use crate::player::Avatar;
use crate::sky::{Sky, yaw_towards};
use crate::terrain::Terrain;
use crate::world::{ObjectKind, WorldObjects};
use glam::{Quat, Vec3};
use std::collections::HashSet;
use winit::keyboard::KeyCode;

pub enum Interaction {
    Harvest(HarvestDetector),
    Gate { gate: CollisionGate, cubes: WorldObjects },
}

/// Everything the frame loop mutates, owned in one place.
pub struct GameState {
    config: GameConfig,
    terrain: Terrain,
    sky: Sky,
    avatar: Avatar,
    animator: Option<Animator>,
    input: InputState,
    camera: FollowCamera,
    interaction: Interaction,
    hud: Hud,
    /// Keys physically down right now.
    held: HashSet<KeyCode>,
    /// Keys that were already down when the note entry opened. Their
    /// auto-repeat text is not typed until they are released.
    stale: HashSet<KeyCode>,
}

impl GameState {
    pub fn new(config: GameConfig) -> Self {
        let terrain = Terrain::generate(&config.terrain);
        let sky = Sky::new(&config.sky);

        let spawn = config.movement.spawn;
        let mut avatar = Avatar::new(spawn, yaw_towards(sky.sun, spawn));
        movement::anchor(&mut avatar, &terrain, config.movement.vertical_offset);

        let (interaction, hud) = match config.variant {
            Variant::Harvest => (
                Interaction::Harvest(HarvestDetector::new(config.interaction.harvest_radius)),
                Hud::with_counter("Ricegrass"),
            ),
            Variant::Gate => {
                let mut cubes = WorldObjects::new();
                let half = Vec3::splat(config.interaction.cube_half_size);
                for p in terrain.scatter(config.terrain.seed, config.interaction.cube_count) {
                    cubes.spawn(ObjectKind::Cube, p + Vec3::new(0.0, half.y + 0.5, 0.0), half);
                }
                (
                    Interaction::Gate { gate: CollisionGate::new(config.interaction.message_secs), cubes },
                    Hud::new(),
                )
            }
        };

        let camera = FollowCamera::new(&config.camera);

        Self {
            config,
            terrain,
            sky,
            avatar,
            animator: None,
            input: InputState::default(),
            camera,
            interaction,
            hud,
            held: HashSet::new(),
            stale: HashSet::new(),
        }
    }

    /// Assets are in; input is accepted from now on.
    pub fn mark_ready(&mut self, idle: ClipAction, walk: ClipAction) {
        self.animator = Some(Animator::new(idle, walk, self.config.movement.crossfade_secs));
        log::info!("assets ready, input enabled");
    }

    pub fn is_ready(&self) -> bool {
        self.animator.is_some()
    }

    pub fn is_frozen(&self) -> bool {
        match &self.interaction {
            Interaction::Harvest(_) => false,
            Interaction::Gate { gate, .. } => gate.is_frozen(),
        }
    }

    pub fn key_down(&mut self, code: KeyCode) {
        self.held.insert(code);
        if !self.is_ready() {
            return;
        }
        let Some(command) = map_key(code) else {
            return;
        };

        if self.is_frozen() {
            if let Interaction::Gate { gate, .. } = &mut self.interaction {
                match command {
                    Command::Submit => {
                        gate.submit(&mut self.hud);
                    }
                    Command::Erase => self.hud.erase(),
                    _ => {}
                }
            }
            return;
        }

        match command {
            Command::Move(key) => self.input.set(key, true),
            Command::Harvest => {
                if let Interaction::Harvest(detector) = &mut self.interaction {
                    detector.harvest(&mut self.terrain, &mut self.hud);
                }
            }
            Command::Submit | Command::Erase => {}
        }
    }

    pub fn key_up(&mut self, code: KeyCode) {
        self.held.remove(&code);
        self.stale.remove(&code);
        if !self.is_ready() || self.is_frozen() {
            return;
        }
        if let Some(Command::Move(key)) = map_key(code) {
            self.input.set(key, false);
        }
    }

    /// Text produced by a press of `code`, typed into the open note entry.
    pub fn text_input(&mut self, code: KeyCode, text: &str) {
        if self.stale.contains(&code) {
            return;
        }
        if self.is_frozen() && self.hud.is_entry_open() {
            self.hud.type_text(text);
        }
    }

    /// One tick of the render loop.
    pub fn frame(&mut self, dt: f32) {
        let Some(animator) = self.animator.as_mut() else {
            return;
        };

        if let Some(t) = animator.set_moving(self.input.any()) {
            log::debug!("animation {:?} -> {:?}", t.from, t.to);
        }
        animator.update(dt);

        let frozen = self.is_frozen();
        if !frozen {
            movement::step(&mut self.avatar, &self.input, &self.terrain, &self.config.movement);
        }
        self.camera
            .update(&self.avatar, !frozen && self.input.longitudinal(), dt);

        match &mut self.interaction {
            Interaction::Harvest(detector) => {
                detector.update(self.avatar.position, self.terrain.grass_bunches_mut(), &mut self.hud);
            }
            Interaction::Gate { gate, cubes } => {
                let spin = Quat::from_euler(
                    glam::EulerRot::XYZ,
                    self.config.interaction.cube_spin,
                    self.config.interaction.cube_spin,
                    0.0,
                );
                for cube in cubes.iter_mut() {
                    cube.rotation = (spin * cube.rotation).normalize();
                }
                if gate.update(&self.avatar.bounding_box(), cubes, &mut self.hud).is_some() {
                    self.input.clear();
                    self.stale = self.held.clone();
                }
                gate.tick(dt, cubes, &mut self.hud);
            }
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn sky(&self) -> &Sky {
        &self.sky
    }

    pub fn avatar(&self) -> &Avatar {
        &self.avatar
    }

    pub fn animator(&self) -> Option<&Animator> {
        self.animator.as_ref()
    }

    pub fn camera(&self) -> &FollowCamera {
        &self.camera
    }

    pub fn hud(&self) -> &Hud {
        &self.hud
    }

    pub fn hud_mut(&mut self) -> &mut Hud {
        &mut self.hud
    }

    /// Cubes in the gate variant, `None` in the harvest variant.
    pub fn cubes(&self) -> Option<&WorldObjects> {
        match &self.interaction {
            Interaction::Gate { cubes, .. } => Some(cubes),
            Interaction::Harvest(_) => None,
        }
    }
}
