//! Stats Overlay
//!
//! Egui HUD drawn onto the primary view only. Shows the window-management
//! key bindings and live frame statistics. Wraps the full egui lifecycle:
//! input bridging, frame build, tessellation, GPU upload, draw.

use winit::event::WindowEvent;
use winit::window::Window;

use crate::views::MAX_WINDOWS;

/// Numbers displayed by the HUD, sampled once per frame by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayStats {
    pub fps: f32,
    pub frame: u64,
    pub windows: usize,
}

/// Egui overlay for the primary view.
pub struct Overlay {
    /// Shared egui context (cheap to clone, reference-counted internally).
    ctx: egui::Context,
    /// Bridges winit events into egui raw input.
    state: egui_winit::State,
    /// Egui's wgpu backend, owns its pipelines, textures and vertex buffers.
    renderer: egui_wgpu::Renderer,

    /// Tessellated draw data produced by [`run`](Self::run), consumed by
    /// [`prepare`](Self::prepare) and [`render`](Self::render).
    primitives: Vec<egui::ClippedPrimitive>,
    /// Texture create/update/free operations accumulated during the frame.
    textures_delta: egui::TexturesDelta,
    /// Current viewport size and DPI, kept in sync via [`resize`](Self::resize).
    screen_descriptor: egui_wgpu::ScreenDescriptor,
}

impl Overlay {
    /// Creates the overlay for `window`, rendering into `output_format`.
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat, window: &Window) -> Self {
        let size = window.inner_size();
        let ctx = egui::Context::default();

        let id = ctx.viewport_id();
        let state = egui_winit::State::new(ctx.clone(), id, window, None, None, None);

        let renderer =
            egui_wgpu::Renderer::new(device, output_format, egui_wgpu::RendererOptions::default());

        Self {
            ctx,
            state,
            renderer,
            primitives: Vec::new(),
            textures_delta: egui::TexturesDelta::default(),
            screen_descriptor: egui_wgpu::ScreenDescriptor {
                size_in_pixels: [size.width, size.height],
                pixels_per_point: window.scale_factor() as f32,
            },
        }
    }

    /// Forwards a winit window event to egui.
    ///
    /// Returns `true` if egui consumed the event and the application should
    /// skip its own handling.
    pub fn handle_input(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Builds the HUD for this frame and tessellates it for rendering.
    pub fn run(&mut self, window: &Window, stats: &OverlayStats) {
        let raw_input = self.state.take_egui_input(window);
        self.ctx.begin_pass(raw_input);

        egui::Window::new("multiwin")
            .default_pos([10.0, 10.0])
            .resizable(false)
            .show(&self.ctx, |ui| {
                ui.label("Rendering into multiple windows.");
                ui.label("Press C to create a window, D to destroy one.");
                ui.separator();
                ui.label(format!("FPS: {:.1}", stats.fps));
                ui.label(format!("Frame: {}", stats.frame));
                ui.label(format!("Windows: {}/{}", stats.windows, MAX_WINDOWS));
            });

        let egui::FullOutput {
            shapes,
            textures_delta,
            platform_output,
            ..
        } = self.ctx.end_pass();

        self.state.handle_platform_output(window, platform_output);
        self.textures_delta = textures_delta;
        self.primitives = self.ctx.tessellate(shapes, self.ctx.pixels_per_point());
    }

    /// Uploads egui textures and geometry for the frame built by
    /// [`run`](Self::run). Buffer uploads go through a temporary encoder
    /// submitted immediately.
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        for (id, delta) in &self.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui buffer upload"),
        });
        let user_cmd_bufs = self.renderer.update_buffers(
            device,
            queue,
            &mut encoder,
            &self.primitives,
            &self.screen_descriptor,
        );
        let mut cmd_bufs: Vec<wgpu::CommandBuffer> = Vec::with_capacity(1 + user_cmd_bufs.len());
        cmd_bufs.push(encoder.finish());
        cmd_bufs.extend(user_cmd_bufs);
        queue.submit(cmd_bufs);

        for id in &self.textures_delta.free {
            self.renderer.free_texture(id);
        }

        self.textures_delta.set.clear();
        self.textures_delta.free.clear();
    }

    /// Draws the HUD over the already-rendered scene.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let mut rpass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            })
            .forget_lifetime();

        self.renderer
            .render(&mut rpass, &self.primitives, &self.screen_descriptor);
    }

    /// Updates the screen descriptor after a resize or DPI change.
    pub fn resize(&mut self, width: u32, height: u32, scale_factor: f32) {
        if width > 0 && height > 0 {
            self.screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [width, height],
                pixels_per_point: scale_factor,
            };
        }
    }
}
