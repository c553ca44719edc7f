//! F3 debug window drawn with egui over the game.
//!
//! egui's wgpu renderer wants a `RenderPass<'static>` while the encoder is
//! still borrowed for uploads, so a frame goes through four calls:
//!
//!   1. `prepare()` -- run the UI and tessellate
//!   2. `upload()`  -- push textures and buffers through the encoder
//!   3. `paint()`   -- draw into a pass created with `forget_lifetime()`
//!   4. `cleanup()` -- free textures egui dropped
//!
//! Events always reach egui so the window can take clicks while shown.

use ledge_core::time::TimeState;
use winit::window::Window;

/// Per-frame numbers the game reports to the overlay.
#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub draw_calls: u32,
    pub texture_binds: u32,
    pub sprite_count: u32,
    /// "Playing", "Won" or "Lost".
    pub status_label: String,
    pub active_enemies: u32,
    pub total_enemies: u32,
    pub world_ticks: u64,
    pub paused: bool,
    pub show_bounds: bool,
}

impl OverlayStats {
    pub fn simulation_lines(&self) -> Vec<String> {
        vec![
            format!("Status: {}", self.status_label),
            format!(
                "Enemies: {}/{} active",
                self.active_enemies, self.total_enemies
            ),
            format!("World ticks: {}", self.world_ticks),
        ]
    }

    pub fn render_lines(&self) -> Vec<String> {
        vec![
            format!("Draw calls: {}", self.draw_calls),
            format!("Texture binds: {}", self.texture_binds),
            format!("Sprites: {}", self.sprite_count),
        ]
    }
}

pub fn timing_lines(time: &TimeState) -> Vec<String> {
    vec![
        format!("FPS: {:.1}", time.smoothed_fps),
        format!("Frame time: {:.2} ms", time.smoothed_frame_time_ms),
        format!("Steps this frame: {}", time.steps_this_frame),
        format!("Total steps: {}", time.fixed_step_count),
        format!(
            "Simulated: {:.3} s",
            time.total_time_us as f64 / 1_000_000.0
        ),
        format!("Alpha: {:.2}", time.interpolation_alpha),
    ]
}

/// Buttons clicked this frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayActions {
    pub toggle_pause: bool,
    /// Advance one fixed tick while paused.
    pub single_step: bool,
    pub toggle_bounds: bool,
}

pub struct DebugOverlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub visible: bool,
}

impl DebugOverlay {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
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
            visible: false,
        }
    }

    /// Returns true when egui consumed the event.
    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        self.egui_winit_state
            .on_window_event(window, event)
            .consumed
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Debug overlay: {}", if self.visible { "ON" } else { "OFF" });
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        time: &TimeState,
        stats: &OverlayStats,
    ) -> (
        Vec<egui::ClippedPrimitive>,
        egui::TexturesDelta,
        OverlayActions,
    ) {
        let mut actions = OverlayActions::default();
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let visible = self.visible;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if !visible {
                return;
            }
            egui::Window::new("Ledge")
                .default_pos([10.0, 10.0])
                .show(ctx, |ui| {
                    for line in timing_lines(time) {
                        ui.label(line);
                    }
                    ui.separator();
                    for line in stats.simulation_lines() {
                        ui.label(line);
                    }
                    ui.separator();
                    for line in stats.render_lines() {
                        ui.label(line);
                    }

                    ui.separator();
                    ui.horizontal(|ui| {
                        let pause_label = if stats.paused { "Resume" } else { "Pause" };
                        if ui.button(pause_label).clicked() {
                            actions.toggle_pause = true;
                        }
                        if stats.paused && ui.button("Step").clicked() {
                            actions.single_step = true;
                        }
                        let bounds_label = if stats.show_bounds {
                            "Hide bounds"
                        } else {
                            "Show bounds"
                        };
                        if ui.button(bounds_label).clicked() {
                            actions.toggle_bounds = true;
                        }
                    });
                    if stats.paused {
                        ui.label("\u{23f8} PAUSED");
                    }
                });
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta, actions)
    }

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
