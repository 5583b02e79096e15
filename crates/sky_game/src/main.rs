//! Sky Jump: endless vertical platformer.
//!
//! winit drives the event loop via `ApplicationHandler`. Input events are
//! folded into `InputState` and the `InputRouter` as they arrive; everything
//! else happens in `RedrawRequested`:
//!
//!   1. `FrameClock::advance()`: measure the wall-clock delta (capped)
//!   2. `GameSession::tick()`: sub-stepped physics, landings, scrolling
//!   3. Rebuild the sprite batch from the session's draw list
//!   4. Upload the camera uniform, draw the board, composite the egui HUD
//!
//! The tuning file is watched via mtime polling; a valid edit is queued and
//! takes effect when the next run starts, controls, frame cap and sprite
//! images included.

mod camera;
mod character;
mod collision;
mod config;
mod draw;
mod level;
mod progression;
mod session;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use config::{
    load_config_from_path, load_config_or_default, ConfigWatcher, GameConfig, ImageConfig,
};
use draw::{fill_batch, DrawList, SpriteImage};
use session::{GameHooks, GameSession};
use sky_core::control::{ControlKind, InputRouter};
use sky_core::input::{InputState, Key, PointerId};
use sky_core::time::FrameClock;
use sky_devtools::{BoardArea, DebugStats, HudView, Overlay};
use sky_platform::{request_tilt, NoTiltSensor, PlatformConfig, TiltSensor};
use sky_render::{Camera2D, GpuContext, MeshBuffers, SpriteBatch, SpritePipeline, Texture};

const CONFIG_PATH: &str = "assets/config/sky_jump.json";
/// Router pointer id for the desktop mouse, clear of real touch ids.
const MOUSE_TOUCH_ID: u64 = u64::MAX;

struct SpriteTexture {
    bind_group: wgpu::BindGroup,
    tint: [f32; 4],
}

/// All mutable game state. Constructed lazily in `ApplicationHandler::resumed`
/// once the window and GPU surface are available.
struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    started: Instant,
    clock: FrameClock,
    input: InputState,
    router: InputRouter,
    tilt_sensor: Box<dyn TiltSensor>,
    camera: Camera2D,
    sprite_pipeline: SpritePipeline,
    overlay: Overlay,

    config_watcher: ConfigWatcher,
    session: GameSession,
    seed: u64,
    /// Run whose config the router, clock, camera and textures reflect.
    applied_run: u64,
    images: ImageConfig,
    textures: HashMap<&'static str, SpriteTexture>,

    batch: SpriteBatch,
    mesh: MeshBuffers,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
}

impl EngineState {
    fn new(window: Arc<Window>, config: GameConfig, seed: u64) -> Result<Self, String> {
        let gpu = GpuContext::new(window.clone())?;
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let overlay = Overlay::new(&gpu.device, gpu.surface_format, &window);

        let camera = Camera2D::new(config.board.width, config.board.height, gpu.size.0, gpu.size.1);
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera.build_uniform()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);

        let textures = load_sprite_textures(&gpu, &sprite_pipeline, &config);
        let mesh = MeshBuffers::new(&gpu.device);

        let router = InputRouter::new(config.controls);
        let clock = FrameClock::new(config.physics.max_frame_dt);
        let images = config.images.clone();
        let session = GameSession::new(config, seed, session_hooks());
        let applied_run = session.run_number();

        Ok(Self {
            window,
            gpu,
            started: Instant::now(),
            clock,
            input: InputState::new(),
            router,
            tilt_sensor: Box::new(NoTiltSensor),
            camera,
            sprite_pipeline,
            overlay,
            config_watcher: ConfigWatcher::new(PathBuf::from(CONFIG_PATH)),
            session,
            seed,
            applied_run,
            images,
            textures,
            batch: SpriteBatch::new(),
            mesh,
            camera_buffer,
            camera_bind_group,
        })
    }

    fn reload_config(&mut self, reason: &str) {
        match load_config_from_path(self.config_watcher.path()) {
            Ok(config) => {
                log::info!(
                    "Config reloaded ({}): '{}'",
                    reason,
                    self.config_watcher.path().display()
                );
                self.session.queue_config(config);
            }
            Err(err) => {
                log::error!("Config reload failed ({}): {}", reason, err);
            }
        }
    }

    /// Once the session has started a new run, pick up the settings of the
    /// config it applied. Sprites are reloaded only when the image set changed.
    fn sync_run_settings(&mut self) {
        let run = self.session.run_number();
        if run == self.applied_run {
            return;
        }
        self.applied_run = run;
        let config = self.session.config();
        self.router.set_config(config.controls);
        self.clock.max_frame_dt = config.physics.max_frame_dt;
        self.camera.board = (config.board.width, config.board.height);
        if config.images != self.images {
            log::info!("Image set changed, reloading sprites");
            self.textures = load_sprite_textures(&self.gpu, &self.sprite_pipeline, config);
            self.images = config.images.clone();
        }
    }

    fn toggle_tilt(&mut self) {
        if self.router.active() == ControlKind::Tilt {
            self.router.disable_tilt();
        } else if request_tilt(self.tilt_sensor.as_mut()) {
            self.router.enable_tilt();
        }
    }

    fn pointer_pressed(&mut self, id: PointerId, router_id: u64, screen: (f64, f64)) {
        let Some(pos) = self.camera.screen_to_board(screen.0, screen.1) else {
            return;
        };
        if self.input.pointer_down(id) {
            self.router
                .touch_pressed(router_id, pos.0, self.session.config().board.width);
        }
    }

    fn pointer_released(&mut self, id: PointerId, router_id: u64) {
        if self.input.pointer_up(id) {
            self.router.touch_released(router_id);
        }
    }

    /// Refill the sprite batch from the session and upload it. Returns the
    /// draw list for the background and HUD.
    fn rebuild_batch(&mut self) -> DrawList {
        let list = self.session.draw_list();
        let textures = &self.textures;
        fill_batch(&mut self.batch, &list, |image| {
            textures
                .get(image.key())
                .map_or(image.fallback_color(), |t| t.tint)
        });
        self.mesh
            .upload(&self.gpu.device, &self.gpu.queue, &self.batch);
        list
    }

    fn board_area(&self) -> BoardArea {
        let vp = self.camera.board_viewport();
        let ppp = self.window.scale_factor() as f32;
        BoardArea {
            rect: egui::Rect::from_min_size(
                egui::pos2(vp.x / ppp, vp.y / ppp),
                egui::vec2(vp.width / ppp, vp.height / ppp),
            ),
            board_size: egui::vec2(self.camera.board.0, self.camera.board.1),
        }
    }
}

fn session_hooks() -> GameHooks {
    GameHooks {
        on_score_update: Some(Box::new(|score| log::trace!("Score update: {}", score))),
        on_game_end: Some(Box::new(|score| log::info!("Run ended with score {}", score))),
    }
}

/// Load each sprite image, substituting a tinted blank texture for any image
/// that is not configured or fails to load.
fn load_sprite_textures(
    gpu: &GpuContext,
    pipeline: &SpritePipeline,
    config: &GameConfig,
) -> HashMap<&'static str, SpriteTexture> {
    let mut textures = HashMap::new();
    for &image in SpriteImage::ALL {
        let loaded = match config.images.path_for(image) {
            Some(path) => match load_texture_file(gpu, Path::new(path)) {
                Ok(texture) => Some(texture),
                Err(err) => {
                    log::warn!("{}. Using a blank sprite for '{}'.", err, image.key());
                    None
                }
            },
            None => {
                log::debug!("No image configured for '{}', using a blank sprite", image.key());
                None
            }
        };
        let (texture, tint) = match loaded {
            Some(texture) => (texture, [1.0; 4]),
            None => (
                Texture::solid(&gpu.device, &gpu.queue, [255, 255, 255, 255], image.key()),
                image.fallback_color(),
            ),
        };
        let bind_group = pipeline.create_texture_bind_group(&gpu.device, &texture);
        textures.insert(image.key(), SpriteTexture { bind_group, tint });
    }
    textures
}

fn load_texture_file(gpu: &GpuContext, path: &Path) -> Result<Texture, String> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Failed to read image '{}': {e}", path.display()))?;
    let texture = Texture::from_bytes(&gpu.device, &gpu.queue, &bytes, &path.display().to_string())?;
    log::info!(
        "Loaded image '{}' ({}x{})",
        path.display(),
        texture.size.0,
        texture.size.1
    );
    Ok(texture)
}

struct App {
    config: GameConfig,
    seed: u64,
    state: Option<EngineState>,
}

impl App {
    fn new(config: GameConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let platform = PlatformConfig::for_board(self.config.board.width, self.config.board.height);
        let started = sky_platform::create_window(event_loop, &platform).and_then(|window| {
            log::info!("Window created: {}x{}", platform.width, platform.height);
            EngineState::new(window, self.config.clone(), self.seed)
        });
        match started {
            Ok(state) => self.state = Some(state),
            Err(err) => {
                log::error!("Refusing to start: {}", err);
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state.overlay.handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let (w, h) = (physical_size.width, physical_size.height);
                if state.gpu.resize(w, h) {
                    state.camera.viewport = (w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => {
                                if state.input.key_down(key) {
                                    state.router.key_pressed(key);
                                }
                            }
                            ElementState::Released => {
                                if state.input.key_up(key) {
                                    state.router.key_released(key);
                                }
                            }
                        }
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                state.input.cursor_position = (position.x, position.y);
            }

            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } if board_receives_click(button_state, egui_consumed) => match button_state {
                ElementState::Pressed => {
                    let cursor = state.input.cursor_position;
                    state.pointer_pressed(PointerId::Mouse, MOUSE_TOUCH_ID, cursor);
                }
                ElementState::Released => {
                    state.pointer_released(PointerId::Mouse, MOUSE_TOUCH_ID);
                }
            },

            WindowEvent::Touch(touch) => {
                let id = PointerId::Touch(touch.id);
                match touch.phase {
                    TouchPhase::Started => {
                        state.pointer_pressed(id, touch.id, (touch.location.x, touch.location.y));
                    }
                    TouchPhase::Moved => {}
                    TouchPhase::Ended | TouchPhase::Cancelled => {
                        state.pointer_released(id, touch.id);
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }

                if state.input.is_just_pressed(Key::Escape) {
                    event_loop.exit();
                    return;
                }
                if state.input.is_just_pressed(Key::F3) {
                    state.overlay.toggle_debug();
                }
                if state.input.is_just_pressed(Key::T) {
                    state.toggle_tilt();
                }
                if state.config_watcher.should_reload() {
                    state.reload_config("file watcher");
                }
                if state.router.active() == ControlKind::Tilt {
                    while let Some(gamma) = state.tilt_sensor.read_gamma() {
                        state.router.tilt_reading(gamma);
                    }
                }

                // Simulation phase.
                let dt = state.clock.advance(state.started.elapsed().as_secs_f64());
                state.session.tick(dt, state.router.frame_input());
                state.router.end_frame();
                state.input.end_frame();
                state.sync_run_settings();

                let list = state.rebuild_batch();

                // Render phase reads the finalized simulation state from this frame.
                state.gpu.queue.write_buffer(
                    &state.camera_buffer,
                    0,
                    bytemuck::cast_slice(&[state.camera.build_uniform()]),
                );

                let Some((output, view)) = state.gpu.begin_frame() else {
                    return;
                };

                let hud = HudView {
                    score: list.hud.score,
                    max_score: list.hud.max_score,
                    tier_label: list.hud.tier_label.clone(),
                    game_over: list.hud.game_over,
                };
                let stats = DebugStats {
                    draw_calls: state.batch.draw_calls.len() as u32,
                    texture_binds: state.batch.texture_binds() as u32,
                    sprite_count: state.batch.quad_count() as u32,
                    platform_count: state.session.platforms().len() as u32,
                    camera_y: state.session.camera_y(),
                    tier: list.hud.tier as u32,
                    control_label: state.router.active().label().to_string(),
                    seed: state.seed,
                };
                let area = state.board_area();
                let (egui_primitives, egui_textures_delta, overlay_actions) = state
                    .overlay
                    .prepare(&state.window, area, &hud, &state.clock, &stats);

                if overlay_actions.restart {
                    // Gated by the session on the next tick like Space or a tap.
                    state.router.request_restart();
                }
                if overlay_actions.reload_config {
                    state.reload_config("overlay");
                }

                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [state.gpu.size.0, state.gpu.size.1],
                    pixels_per_point: state.window.scale_factor() as f32,
                };

                let mut encoder =
                    state
                        .gpu
                        .device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("Render Encoder"),
                        });

                {
                    let [r, g, b] = list.background;
                    let clear_color = wgpu::Color {
                        r: f64::from(r),
                        g: f64::from(g),
                        b: f64::from(b),
                        a: 1.0,
                    };
                    let mut last_bound_texture_key: Option<&str> = None;
                    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Board Render Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(clear_color),
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        ..Default::default()
                    });

                    let vp = state.camera.board_viewport();
                    render_pass.set_viewport(vp.x, vp.y, vp.width, vp.height, 0.0, 1.0);
                    render_pass.set_pipeline(&state.sprite_pipeline.render_pipeline);
                    render_pass.set_bind_group(0, &state.camera_bind_group, &[]);
                    render_pass.set_vertex_buffer(0, state.mesh.vertex_buffer.slice(..));
                    render_pass.set_index_buffer(
                        state.mesh.index_buffer.slice(..),
                        wgpu::IndexFormat::Uint32,
                    );

                    for draw in &state.batch.draw_calls {
                        if let Some(texture) = state.textures.get(&*draw.texture_key) {
                            if last_bound_texture_key != Some(&*draw.texture_key) {
                                render_pass.set_bind_group(1, &texture.bind_group, &[]);
                                last_bound_texture_key = Some(&*draw.texture_key);
                            }
                            render_pass.draw_indexed(
                                draw.index_start..(draw.index_start + draw.index_count),
                                0,
                                0..1,
                            );
                        }
                    }
                }

                state.overlay.upload(
                    &state.gpu.device,
                    &state.gpu.queue,
                    &mut encoder,
                    &egui_primitives,
                    &egui_textures_delta,
                    &screen_descriptor,
                );

                {
                    let mut egui_pass = encoder
                        .begin_render_pass(&wgpu::RenderPassDescriptor {
                            label: Some("egui Render Pass"),
                            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                view: &view,
                                resolve_target: None,
                                ops: wgpu::Operations {
                                    load: wgpu::LoadOp::Load,
                                    store: wgpu::StoreOp::Store,
                                },
                            })],
                            depth_stencil_attachment: None,
                            ..Default::default()
                        })
                        .forget_lifetime();

                    state
                        .overlay
                        .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
                }

                state.overlay.cleanup(&egui_textures_delta);

                state.gpu.queue.submit(std::iter::once(encoder.finish()));
                output.present();
            }

            _ => {}
        }
    }
}

/// Presses over egui stay with egui; releases always reach the board so a
/// drag that ends over the debug window cannot leave a touch held.
fn board_receives_click(button_state: ElementState, egui_consumed: bool) -> bool {
    button_state == ElementState::Released || !egui_consumed
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyD => Some(Key::D),
        KeyCode::Space => Some(Key::Space),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::F3 => Some(Key::F3),
        KeyCode::KeyT => Some(Key::T),
        _ => None,
    }
}

/// Seed from the config when pinned, otherwise from the wall clock.
fn choose_seed(config: &GameConfig) -> u64 {
    config.level.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Sky Jump starting...");

    let config = load_config_or_default(Path::new(CONFIG_PATH));
    let seed = choose_seed(&config);
    log::info!("Level seed: {}", seed);

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, seed);
    event_loop.run_app(&mut app).expect("Event loop error");
}
