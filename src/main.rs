mod animation;
mod assets;
mod camera;
mod config;
mod game;
mod hud;
mod input;
mod interaction;
mod model;
mod movement;
mod player;
mod renderer;
mod sky;
mod terrain;
mod world;

use clap::Parser;
use config::{Cli, GameConfig};
use game::GameState;
use renderer::Renderer;
use std::sync::{Arc, mpsc};
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

struct App {
    config: GameConfig,
    paths: Option<assets::AssetPaths>,
    pending: Option<mpsc::Receiver<assets::AvatarAsset>>,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    game: Option<GameState>,
    last_frame: Instant,
}

impl App {
    fn new(config: GameConfig, paths: assets::AssetPaths) -> Self {
        Self {
            config,
            paths: Some(paths),
            pending: None,
            window: None,
            renderer: None,
            game: None,
            last_frame: Instant::now(),
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attributes = Window::default_attributes().with_title("Ricegrass Walk");
        let window = Arc::new(event_loop.create_window(window_attributes)?);
        self.window = Some(window.clone());

        let game = GameState::new(self.config.clone());
        let renderer = pollster::block_on(Renderer::new(window, &game))?;
        if let Some(paths) = self.paths.take() {
            self.pending = Some(assets::spawn_loader(paths));
        }

        self.game = Some(game);
        self.renderer = Some(renderer);
        self.last_frame = Instant::now();
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.start(event_loop) {
                log::error!("Failed to start: {:?}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let window = match self.window.as_ref() {
            Some(w) => w,
            None => return,
        };
        let (Some(renderer), Some(game)) = (self.renderer.as_mut(), self.game.as_mut()) else {
            return;
        };

        if id != window.id() {
            return;
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event: KeyEvent { physical_key: PhysicalKey::Code(code), state, text, repeat, .. },
                ..
            } => match state {
                ElementState::Pressed => {
                    if let Some(text) = text.as_deref() {
                        game.text_input(code, text);
                    }
                    if !repeat {
                        game.key_down(code);
                    }
                }
                ElementState::Released => game.key_up(code),
            },
            WindowEvent::Resized(physical_size) => {
                renderer.resize(physical_size);
                window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.last_frame).as_secs_f32();
                self.last_frame = now;

                let loaded = self.pending.as_ref().and_then(|rx| rx.try_recv().ok());
                if let Some(avatar) = loaded {
                    renderer.set_avatar_mesh(&avatar.mesh);
                    game.mark_ready(avatar.idle, avatar.walk);
                    self.pending = None;
                }

                game.frame(dt);
                renderer.update(game, dt);
                if game.hud_mut().take_dirty() {
                    let title = game.hud().title();
                    log::info!("{}", title);
                    window.set_title(&title);
                }

                match renderer.render() {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size()),
                    Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                    Err(e) => log::warn!("{:?}", e),
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = GameConfig::from_cli(&cli)?;
    log::info!("starting {:?} variant, seed {}", config.variant, config.terrain.seed);

    let paths = assets::AssetPaths {
        idle_model: cli.idle_model,
        walk_model: cli.walk_model,
    };
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, paths);
    event_loop.run_app(&mut app)?;
    Ok(())
}
