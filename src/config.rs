use clap::{Parser, ValueEnum};
use glam::Vec3;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Variant {
    /// Turn with left/right, harvest ricegrass bunches.
    Harvest,
    /// Strafe with left/right, touch spinning cubes to leave a note.
    Gate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SmoothingMode {
    PerFrame,
    Exponential,
}

#[derive(Parser, Debug)]
#[command(name = "ricegrass-walk", about = "Walk a generated terrain and harvest ricegrass")]
pub struct Cli {
    #[arg(long, value_enum, default_value_t = Variant::Harvest)]
    pub variant: Variant,

    /// Terrain and prop placement seed
    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    #[arg(long)]
    pub grass_count: Option<usize>,

    #[arg(long)]
    pub cube_count: Option<usize>,

    /// glTF file with the avatar mesh and its idle clip
    #[arg(long)]
    pub idle_model: Option<PathBuf>,

    /// glTF file whose first clip is used as the walk cycle
    #[arg(long)]
    pub walk_model: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = SmoothingMode::PerFrame)]
    pub smoothing: SmoothingMode,

    /// Decay rate per second, only used with `--smoothing exponential`
    #[arg(long, default_value_t = 3.0)]
    pub smoothing_rate: f32,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("terrain half size must be positive, got {0}")]
    HalfSize(f32),
    #[error("terrain needs at least one segment per side")]
    Segments,
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("per-frame smoothing factor must be in (0, 1], got {0}")]
    SmoothingFactor(f32),
}

#[derive(Debug, Clone)]
pub struct TerrainConfig {
    pub half_size: f32,
    pub segments: usize,
    pub amplitude: f32,
    pub seed: u64,
    pub grass_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steering {
    /// Left/right turn the avatar in place.
    Rotate,
    /// Left/right side-step relative to the facing direction.
    Strafe,
}

#[derive(Debug, Clone)]
pub struct MovementConfig {
    pub movement_speed: f32,
    pub rotation_speed: f32,
    pub vertical_offset: f32,
    pub steering: Steering,
    pub spawn: Vec3,
    pub crossfade_secs: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Smoothing {
    /// Fixed lerp factor applied once per frame, whatever the frame time.
    PerFrame(f32),
    /// Exponential decay, `1 - e^(-rate * dt)` per frame.
    Exponential { rate: f32 },
}

impl Smoothing {
    pub fn factor(&self, dt: f32) -> f32 {
        match *self {
            Smoothing::PerFrame(factor) => factor,
            Smoothing::Exponential { rate } => 1.0 - (-rate * dt).exp(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraMode {
    Smoothed { offset: Vec3, smoothing: Smoothing },
    Rigid { offset: Vec3 },
}

#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub mode: CameraMode,
    pub initial_position: Vec3,
    pub look_height: f32,
    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
}

#[derive(Debug, Clone)]
pub struct InteractionConfig {
    pub harvest_radius: f32,
    pub cube_count: usize,
    pub cube_half_size: f32,
    pub cube_spin: f32,
    pub message_secs: f32,
}

#[derive(Debug, Clone)]
pub struct SkyConfig {
    pub elevation: f32,
    pub azimuth: f32,
    pub exposure: f32,
}

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub variant: Variant,
    pub terrain: TerrainConfig,
    pub movement: MovementConfig,
    pub camera: CameraConfig,
    pub interaction: InteractionConfig,
    pub sky: SkyConfig,
}

impl GameConfig {
    pub fn for_variant(variant: Variant) -> Self {
        let (steering, mode, look_height) = match variant {
            Variant::Harvest => (
                Steering::Rotate,
                CameraMode::Smoothed {
                    offset: Vec3::new(0.0, 3.0, -12.0),
                    smoothing: Smoothing::PerFrame(0.05),
                },
                6.0,
            ),
            // the close chase camera aims near the waist to keep the feet in view
            Variant::Gate => (
                Steering::Strafe,
                CameraMode::Rigid { offset: Vec3::new(0.0, 4.0, -8.0) },
                1.5,
            ),
        };

        Self {
            variant,
            terrain: TerrainConfig {
                half_size: 100.0,
                segments: 200,
                amplitude: 3.0,
                seed: 7,
                grass_count: 120,
            },
            movement: MovementConfig {
                movement_speed: 0.08,
                rotation_speed: 0.02,
                vertical_offset: 0.2,
                steering,
                spawn: Vec3::new(0.0, -20.0, 40.0),
                crossfade_secs: 0.5,
            },
            camera: CameraConfig {
                mode,
                initial_position: Vec3::new(20.0, 40.0, 90.0),
                look_height,
                fovy_degrees: 75.0,
                znear: 0.5,
                zfar: 1000.0,
            },
            interaction: InteractionConfig {
                harvest_radius: 2.0,
                cube_count: 12,
                cube_half_size: 1.0,
                cube_spin: 0.01,
                message_secs: 3.0,
            },
            sky: SkyConfig {
                elevation: 2.0,
                azimuth: 180.0,
                exposure: 0.5,
            },
        }
    }

    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = Self::for_variant(cli.variant);
        config.terrain.seed = cli.seed;
        if let Some(count) = cli.grass_count {
            config.terrain.grass_count = count;
        }
        if let Some(count) = cli.cube_count {
            config.interaction.cube_count = count;
        }
        if let (SmoothingMode::Exponential, CameraMode::Smoothed { smoothing, .. }) =
            (cli.smoothing, &mut config.camera.mode)
        {
            *smoothing = Smoothing::Exponential { rate: cli.smoothing_rate };
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.terrain.half_size > 0.0) {
            return Err(ConfigError::HalfSize(self.terrain.half_size));
        }
        if self.terrain.segments == 0 {
            return Err(ConfigError::Segments);
        }
        positive("movement speed", self.movement.movement_speed)?;
        positive("rotation speed", self.movement.rotation_speed)?;
        positive("crossfade duration", self.movement.crossfade_secs)?;
        positive("harvest radius", self.interaction.harvest_radius)?;
        positive("message duration", self.interaction.message_secs)?;
        match self.camera.mode {
            CameraMode::Smoothed { smoothing: Smoothing::PerFrame(factor), .. } => {
                if !(factor > 0.0 && factor <= 1.0) {
                    return Err(ConfigError::SmoothingFactor(factor));
                }
            }
            CameraMode::Smoothed { smoothing: Smoothing::Exponential { rate }, .. } => {
                positive("smoothing rate", rate)?;
            }
            CameraMode::Rigid { .. } => {}
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}
