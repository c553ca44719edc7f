//! Ledge -- a small single-screen platformer.
//!
//! winit drives the event loop via `ApplicationHandler`. Each `RedrawRequested`:
//!
//!   1. Sample input once and hand it to the world as the player's intent
//!   2. `begin_frame()` feeds wall-clock time into the fixed-step accumulator,
//!      then `while should_step()` runs `World::tick` once per slice
//!   3. Rebuild the sprite mesh from `World::sprites()`
//!   4. Upload the camera uniform, issue draw calls, composite the egui overlay
//!
//! Content (level JSON and textures) is loaded once at startup. Any failure
//! there is fatal.

mod ai;
mod assets;
mod banner;
mod collision;
mod entity;
mod level;
mod mesh;
mod physics;
#[cfg(test)]
mod replay;
mod world;

use std::path::Path;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use assets::{AssetError, TextureLoader, TextureSet};
use entity::TextureHandle;
use ledge_core::input::{InputState, Key};
use ledge_core::time::{SystemClock, TimeState};
use ledge_devtools::{DebugOverlay, OverlayStats};
use ledge_platform::window::PlatformConfig;
use ledge_render::{Camera2D, GpuContext, SpritePipeline, SpriteVertex, Texture};
use level::load_level_from_path;
use mesh::{DrawCall, SpriteMesh};
use world::{ControllerInput, World};

const LEVEL_PATH: &str = "assets/levels/level1.json";
/// Draw-call key for the solid white texture used by bounding-box outlines.
const BOUNDS_TEXTURE: TextureHandle = TextureHandle(u32::MAX);

const MOVE_LEFT: [Key; 2] = [Key::Left, Key::A];
const MOVE_RIGHT: [Key; 2] = [Key::Right, Key::D];
const JUMP: [Key; 3] = [Key::Space, Key::W, Key::Up];

struct GpuSpriteTexture {
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

/// Uploads level textures straight to the GPU; handles index `textures`.
struct GpuTextureLoader<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    pipeline: &'a SpritePipeline,
    textures: Vec<GpuSpriteTexture>,
}

impl TextureLoader for GpuTextureLoader<'_> {
    fn load_texture(&mut self, path: &str) -> Result<TextureHandle, AssetError> {
        let bytes = std::fs::read(path).map_err(|source| AssetError::Read {
            path: path.to_string(),
            source,
        })?;
        let texture = Texture::from_bytes(self.device, self.queue, &bytes, path).map_err(
            |source| AssetError::Decode {
                path: path.to_string(),
                source,
            },
        )?;
        let bind_group = self.pipeline.create_texture_bind_group(self.device, &texture);
        let handle = TextureHandle(self.textures.len() as u32);
        log::debug!(
            "Uploaded texture '{}' ({}x{}) as {:?}",
            path,
            texture.size.0,
            texture.size.1,
            handle
        );
        self.textures.push(GpuSpriteTexture {
            texture,
            bind_group,
        });
        Ok(handle)
    }
}

/// All mutable game state. Constructed in `ApplicationHandler::resumed` once
/// the window and GPU surface exist.
struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    time: TimeState,
    clock: SystemClock,
    input: InputState,
    camera: Camera2D,
    sprite_pipeline: SpritePipeline,
    debug_overlay: DebugOverlay,

    world: World,
    textures: Vec<GpuSpriteTexture>,
    bounds_texture: GpuSpriteTexture,
    show_bounds: bool,
    paused: bool,
    single_step_requested: bool,

    // The sprite mesh is rebuilt on the CPU each frame and streamed into these
    // buffers. Buffers grow (power-of-two) but never shrink.
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
    draw_calls: Vec<DrawCall>,
    texture_binds: usize,
    sprite_count: usize,
}

impl EngineState {
    fn new(window: Arc<Window>) -> Self {
        let level_path = Path::new(LEVEL_PATH);
        let level_file = load_level_from_path(level_path).unwrap_or_else(|err| {
            log::error!("{err}");
            panic!("Failed to load level '{}': {}", level_path.display(), err);
        });

        let gpu = GpuContext::new(window.clone()).unwrap_or_else(|err| {
            log::error!("{err}");
            panic!("Failed to initialise GPU: {err}");
        });
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let debug_overlay = DebugOverlay::new(&gpu.device, gpu.surface_format, &window);

        let mut loader = GpuTextureLoader {
            device: &gpu.device,
            queue: &gpu.queue,
            pipeline: &sprite_pipeline,
            textures: Vec::new(),
        };
        let texture_set = TextureSet::load(&level_file.textures, &mut loader).unwrap_or_else(|err| {
            log::error!("{err}");
            panic!("Failed to load textures for '{}': {}", level_path.display(), err);
        });
        let textures = loader.textures;
        let texture_bytes: u64 = textures
            .iter()
            .map(|t| u64::from(t.texture.size.0) * u64::from(t.texture.size.1) * 4)
            .sum();
        log::info!(
            "GPU textures: {} for {} keys ({:.1} KiB)",
            textures.len(),
            texture_set.len(),
            texture_bytes as f64 / 1024.0
        );

        let level = level_file.build(&texture_set).unwrap_or_else(|err| {
            log::error!("{err}");
            panic!("Failed to build level '{}': {}", level_path.display(), err);
        });
        log::info!(
            "Level '{}' ready (fixed dt {}us)",
            level.level_id,
            level.fixed_dt_us
        );

        let white = Texture::solid_white(&gpu.device, &gpu.queue);
        let bounds_texture = GpuSpriteTexture {
            bind_group: sprite_pipeline.create_texture_bind_group(&gpu.device, &white),
            texture: white,
        };

        let camera = Camera2D::new(level.camera.half_width, level.camera.half_height);
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera.build_uniform()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);
        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        let mut state = Self {
            window,
            gpu,
            time: TimeState::new(level.fixed_dt_us),
            clock: SystemClock::new(),
            input: InputState::new(),
            camera,
            sprite_pipeline,
            debug_overlay,
            world: level.world,
            textures,
            bounds_texture,
            show_bounds: false,
            paused: false,
            single_step_requested: false,
            vertex_buffer,
            index_buffer,
            camera_buffer,
            camera_bind_group,
            mesh_vertex_capacity: 0,
            mesh_index_capacity: 0,
            draw_calls: Vec::new(),
            texture_binds: 0,
            sprite_count: 0,
        };
        state.rebuild_mesh();
        state
    }

    fn texture_for(&self, handle: TextureHandle) -> Option<&GpuSpriteTexture> {
        if handle == BOUNDS_TEXTURE {
            Some(&self.bounds_texture)
        } else {
            self.textures.get(handle.0 as usize)
        }
    }

    /// Keys that act once per rendered frame rather than per tick.
    fn handle_frame_keys(&mut self) {
        if self.input.is_just_pressed(Key::Escape) {
            self.input.request_quit();
        }
        if self.input.is_just_pressed(Key::F3) {
            self.debug_overlay.toggle();
        }
        if self.input.is_just_pressed(Key::F4) {
            self.toggle_bounds();
        }
        if self.input.is_just_pressed(Key::P) {
            self.toggle_pause();
        }
        if self.input.is_just_pressed(Key::N) && self.paused {
            self.single_step_requested = true;
        }
    }

    fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        log::info!(
            "Simulation {}",
            if self.paused { "PAUSED" } else { "RESUMED" }
        );
    }

    fn toggle_bounds(&mut self) {
        self.show_bounds = !self.show_bounds;
        log::info!(
            "Bounding boxes: {}",
            if self.show_bounds { "ON" } else { "OFF" }
        );
    }

    /// Feed the frame's wall time to the scheduler and run the ticks it owes.
    fn simulate(&mut self) {
        self.time.begin_frame(&self.clock);
        if self.paused {
            // Paused time is dropped, not replayed on resume.
            self.time.discard_pending();
            if self.single_step_requested {
                self.single_step_requested = false;
                self.world.tick(self.time.fixed_dt_us);
            }
        } else {
            while self.time.should_step() {
                self.world.tick(self.time.fixed_dt_us);
            }
        }
        self.time.end_frame();
    }

    fn overlay_stats(&self) -> OverlayStats {
        OverlayStats {
            draw_calls: self.draw_calls.len() as u32,
            texture_binds: self.texture_binds as u32,
            sprite_count: self.sprite_count as u32,
            status_label: self.world.status().label().to_string(),
            active_enemies: self.world.active_enemy_count() as u32,
            total_enemies: self.world.enemies().len() as u32,
            world_ticks: self.world.tick_count(),
            paused: self.paused,
            show_bounds: self.show_bounds,
        }
    }

    fn rebuild_mesh(&mut self) {
        let bounds = self.show_bounds.then_some(BOUNDS_TEXTURE);
        let mesh = SpriteMesh::build(&self.world.sprites(), bounds);
        self.ensure_mesh_capacity(mesh.vertices.len(), mesh.indices.len());
        self.sprite_count = mesh.quad_count();
        self.texture_binds = mesh.texture_binds();

        if !mesh.vertices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&mesh.vertices));
        }
        if !mesh.indices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&mesh.indices));
        }
        self.draw_calls = mesh.draw_calls;
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }

    fn render(&mut self) {
        self.gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera.build_uniform()]),
        );

        let Some((output, view)) = self.gpu.begin_frame() else {
            return;
        };

        let stats = self.overlay_stats();
        let (egui_primitives, egui_textures_delta, overlay_actions) =
            self.debug_overlay
                .prepare(&self.window, &self.time, &stats);

        if overlay_actions.toggle_pause {
            self.toggle_pause();
        }
        if overlay_actions.single_step {
            self.single_step_requested = true;
        }
        if overlay_actions.toggle_bounds {
            self.toggle_bounds();
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut last_bound: Option<TextureHandle> = None;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sprite Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            render_pass.set_pipeline(&self.sprite_pipeline.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

            for draw in &self.draw_calls {
                let Some(texture) = self.texture_for(draw.texture) else {
                    log::warn!("Draw call references unknown texture {:?}", draw.texture);
                    continue;
                };
                if last_bound != Some(draw.texture) {
                    render_pass.set_bind_group(1, &texture.bind_group, &[]);
                    last_bound = Some(draw.texture);
                }
                render_pass.draw_indexed(
                    draw.index_start..(draw.index_start + draw.index_count),
                    0,
                    0..1,
                );
            }
        }

        self.debug_overlay.upload(
            &self.gpu.device,
            &self.gpu.queue,
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

            self.debug_overlay
                .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
        }

        self.debug_overlay.cleanup(&egui_textures_delta);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

struct App {
    config: PlatformConfig,
    state: Option<EngineState>,
}

impl App {
    fn new() -> Self {
        Self {
            config: PlatformConfig::default(),
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = ledge_platform::window::create_window(event_loop, &self.config);
        log::info!(
            "Window created: {}x{}",
            self.config.width,
            self.config.height
        );
        self.state = Some(EngineState::new(window));
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
        let Some(state) = self.state.as_mut() else {
            return;
        };

        let egui_consumed = state
            .debug_overlay
            .handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(key),
                            ElementState::Released => state.input.key_up(key),
                        }
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }

                state.handle_frame_keys();
                if state.input.quit_requested() {
                    log::info!("Quit requested, exiting.");
                    event_loop.exit();
                    return;
                }

                state.world.apply_input(controller_input(&state.input));
                state.simulate();
                state.rebuild_mesh();
                state.render();

                // Jump presses are latched into the world by `apply_input`, so
                // edges can be cleared even on frames that ran no tick.
                state.input.end_frame();
            }

            _ => {}
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn controller_input(input: &InputState) -> ControllerInput {
    ControllerInput {
        move_x: input.axis(&MOVE_LEFT, &MOVE_RIGHT),
        jump_pressed: input.any_just_pressed(&JUMP),
    }
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::Space => Some(Key::Space),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::F3 => Some(Key::F3),
        KeyCode::F4 => Some(Key::F4),
        KeyCode::KeyW => Some(Key::W),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyD => Some(Key::D),
        KeyCode::KeyP => Some(Key::P),
        KeyCode::KeyN => Some(Key::N),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Ledge starting...");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app).expect("Event loop error");
}
