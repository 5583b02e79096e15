//! egui overlay drawn on top of the board: the score card, the game-over
//! banner and an F3 debug window.
//!
//! egui needs a three-phase render split because
//! `egui_wgpu::Renderer::render()` wants a `RenderPass<'static>` while
//! `begin_render_pass` borrows the encoder:
//!
//!   1. `prepare()`: run the UI, produce tessellated primitives
//!   2. `upload()`: upload textures and update GPU buffers
//!   3. `paint()`: render into a pass created with `forget_lifetime()`
//!
//! followed by `cleanup()` to free textures egui dropped.

use egui::{Align2, Color32, CornerRadius, FontId, Pos2, Rect, Vec2};
use sky_core::time::FrameClock;
use winit::window::Window;

/// What the score card and banner show.
#[derive(Debug, Clone, Default)]
pub struct HudView {
    pub score: u32,
    pub max_score: u32,
    pub tier_label: String,
    pub game_over: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DebugStats {
    pub draw_calls: u32,
    pub texture_binds: u32,
    pub sprite_count: u32,
    pub platform_count: u32,
    pub camera_y: f32,
    pub tier: u32,
    pub control_label: String,
    pub seed: u64,
}

#[derive(Debug, Clone, Default)]
pub struct OverlayActions {
    pub restart: bool,
    pub reload_config: bool,
}

pub const GAME_OVER_TEXT: &str = "Game Over: press Space or tap to restart";

pub struct Overlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub debug_visible: bool,
}

impl Overlay {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat, window: &Window) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            debug_visible: false,
        }
    }

    /// Returns true when egui wants the event for itself.
    pub fn handle_window_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        response.consumed
    }

    pub fn toggle_debug(&mut self) {
        self.debug_visible = !self.debug_visible;
        log::info!("Debug overlay: {}", if self.debug_visible { "ON" } else { "OFF" });
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        area: BoardArea,
        hud: &HudView,
        clock: &FrameClock,
        stats: &DebugStats,
    ) -> (
        Vec<egui::ClippedPrimitive>,
        egui::TexturesDelta,
        OverlayActions,
    ) {
        let mut actions = OverlayActions::default();
        let debug_visible = self.debug_visible;
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            let painter = ctx.layer_painter(egui::LayerId::new(
                egui::Order::Foreground,
                egui::Id::new("hud"),
            ));
            draw_score_card(&painter, area, hud);
            if hud.game_over {
                draw_game_over_banner(&painter, area);
            }

            if debug_visible {
                egui::Window::new("Debug")
                    .default_pos([10.0, 120.0])
                    .show(ctx, |ui| {
                        ui.label(format!("FPS: {:.1}", clock.smoothed_fps));
                        ui.label(format!("Frame time: {:.2} ms", clock.smoothed_frame_time_ms));
                        ui.label(format!("Frame: {}", clock.frame_count));
                        ui.label(format!("Capped frames: {}", clock.capped_frames));
                        ui.separator();
                        ui.label(format!("Draw calls: {}", stats.draw_calls));
                        ui.label(format!("Texture binds: {}", stats.texture_binds));
                        ui.label(format!("Sprites: {}", stats.sprite_count));
                        ui.label(format!("Platforms: {}", stats.platform_count));
                        ui.label(format!("Camera Y: {:.1}", stats.camera_y));
                        ui.label(format!("Tier: {}", stats.tier));
                        ui.separator();
                        ui.label(format!("Control: {}", stats.control_label));
                        ui.label(format!("Seed: {}", stats.seed));
                        ui.horizontal(|ui| {
                            if ui.button("Restart").clicked() {
                                actions.restart = true;
                            }
                            if ui.button("Reload config").clicked() {
                                actions.reload_config = true;
                            }
                        });
                    });
            }
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta, actions)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }
        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

/// Maps board pixels into egui points.
#[derive(Debug, Clone, Copy)]
pub struct BoardArea {
    pub rect: Rect,
    pub board_size: Vec2,
}

impl BoardArea {
    pub fn scale(&self) -> f32 {
        if self.board_size.x > 0.0 {
            self.rect.width() / self.board_size.x
        } else {
            1.0
        }
    }

    pub fn to_screen(&self, board: Pos2) -> Pos2 {
        self.rect.min + board.to_vec2() * self.scale()
    }
}

/// White rounded card with a black border at board (5, 5), score centred.
fn draw_score_card(painter: &egui::Painter, area: BoardArea, hud: &HudView) {
    let scale = area.scale();
    let card = Rect::from_min_size(area.to_screen(Pos2::new(5.0, 5.0)), Vec2::new(60.0, 30.0) * scale);
    painter.rect_filled(card.expand(1.0), CornerRadius::same(10), Color32::BLACK);
    painter.rect_filled(card, CornerRadius::same(10), Color32::WHITE);
    painter.text(
        card.center(),
        Align2::CENTER_CENTER,
        hud.score.to_string(),
        FontId::proportional(16.0 * scale),
        Color32::BLACK,
    );
    painter.text(
        Pos2::new(card.min.x, card.max.y + 4.0 * scale),
        Align2::LEFT_TOP,
        format!("Best {} · {}", hud.max_score, hud.tier_label),
        FontId::proportional(11.0 * scale),
        Color32::BLACK,
    );
}

fn draw_game_over_banner(painter: &egui::Painter, area: BoardArea) {
    let origin = area.to_screen(Pos2::new(
        area.board_size.x / 7.0,
        area.board_size.y * 7.0 / 8.0,
    ));
    painter.text(
        origin,
        Align2::LEFT_BOTTOM,
        GAME_OVER_TEXT,
        FontId::proportional(14.0 * area.scale()),
        Color32::BLACK,
    );
}
