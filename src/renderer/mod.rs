//! Multi-Window Renderer
//!
//! Owns the GPU context, the cube scene, the primary view's HUD overlay and
//! the screenshot capture. Renders one pass per live view each frame: the
//! primary view draws every draw group no secondary view has claimed, each
//! secondary view draws exactly its own group.
//!
//! The renderer is also the [`TargetHost`] for the application's
//! [`ViewTable`](crate::views::ViewTable): the table drives *when* swap
//! chains come and go, the renderer binds and releases them.

mod capture;
mod context;
mod cubes;
mod overlay;

use std::path::Path;
use std::sync::Arc;

use winit::event::WindowEvent;
use winit::window::Window;

use crate::errors::Result;
use crate::settings::Settings;
use crate::views::{TargetHost, ViewId, ViewTable};

pub use capture::Capture;
pub use context::{GpuContext, ViewTarget};
pub use cubes::CubeScene;
pub use overlay::{Overlay, OverlayStats};

/// Per-frame inputs sampled by the application loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInfo {
    /// Seconds since startup, drives the cube animation.
    pub time: f32,
    /// Monotonic frame counter, drives the capture cadence.
    pub frame: u64,
    /// Last measured frames per second, shown by the HUD.
    pub fps: f32,
}

/// Renders the shared cube field into every live view.
pub struct Renderer {
    gpu: GpuContext,
    primary: ViewTarget,
    scene: CubeScene,
    overlay: Overlay,
    capture: Capture,
    settings: Settings,
}

impl Renderer {
    /// Initializes the GPU against the primary window.
    ///
    /// The swap chain format negotiated for the primary surface becomes the
    /// scene's pipeline format; secondary surfaces must match it.
    pub fn new(window: Arc<Window>, settings: Settings) -> Result<Self> {
        let size = window.inner_size();
        let (gpu, primary) = pollster::block_on(GpuContext::new(
            window.clone(),
            &settings,
            size.width.max(1),
            size.height.max(1),
        ))?;

        let scene = CubeScene::new(&gpu.device, primary.color_format(), settings.depth_format);
        let overlay = Overlay::new(&gpu.device, primary.color_format(), &window);
        let capture = Capture::new(&settings);

        Ok(Self {
            gpu,
            primary,
            scene,
            overlay,
            capture,
            settings,
        })
    }

    /// Where periodic captures are written.
    #[must_use]
    pub fn capture_dir(&self) -> &Path {
        self.capture.dir()
    }

    /// Forwards a primary-window event to the HUD.
    ///
    /// Returns `true` if the HUD consumed it.
    pub fn overlay_input(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.overlay.handle_input(window, event)
    }

    /// Resizes the primary swap chain and the HUD viewport.
    pub fn resize_primary(&mut self, width: u32, height: u32, scale_factor: f32) {
        self.primary.resize(&self.gpu.device, width, height);
        self.overlay.resize(width, height, scale_factor);
    }

    /// Renders one frame into the primary view and every bound secondary
    /// view, then presents them all.
    ///
    /// One camera serves every view: the projection follows the primary
    /// view's aspect ratio, so secondary windows show the same image framing
    /// regardless of their own size. Draw groups of views without a usable
    /// swap chain fall back into the primary view.
    ///
    /// On frames the capture cadence selects, every presentable view is
    /// read back and written to [`capture_dir`](Self::capture_dir) between
    /// submit and present.
    pub fn draw(
        &mut self,
        views: &ViewTable<Arc<Window>, ViewTarget>,
        window: &Window,
        info: &FrameInfo,
    ) -> Result<()> {
        self.scene
            .update(&self.gpu.queue, info.time, self.primary.aspect());

        let stats = OverlayStats {
            fps: info.fps,
            frame: info.frame,
            windows: views.len(),
        };
        self.overlay.run(window, &stats);
        self.overlay.prepare(&self.gpu.device, &self.gpu.queue);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        let mut pending: Vec<(ViewId, wgpu::SurfaceTexture, bool)> = Vec::new();

        // Primary view: every group without a bound secondary view, plus
        // the HUD on top.
        if let Some(frame) = self.acquire(&self.primary)? {
            let color = frame
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());
            self.render_view(
                &mut encoder,
                &color,
                &self.primary.depth_view,
                !views.claimed(),
            );
            self.overlay.render(&mut encoder, &color);
            pending.push((ViewId::PRIMARY, frame, self.primary.can_capture));
        }

        // Secondary views: their own group only.
        for (view, slot) in views.iter() {
            if view.is_primary() {
                continue;
            }
            let Some(target) = slot.target() else {
                continue;
            };
            if let Some(frame) = self.acquire(target)? {
                let color = frame
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                self.render_view(&mut encoder, &color, &target.depth_view, view.bit());
                pending.push((view, frame, target.can_capture));
            }
        }

        self.gpu.queue.submit(Some(encoder.finish()));

        if let Some(count) = self.capture.due(info.frame) {
            for (view, frame, can_capture) in &pending {
                if !can_capture {
                    continue;
                }
                let saved = self.capture.save_view(
                    &self.gpu.device,
                    &self.gpu.queue,
                    &frame.texture,
                    frame.texture.format(),
                    count,
                    *view,
                );
                match saved {
                    Ok(path) => log::info!("view {view}: captured {}", path.display()),
                    Err(err) => log::warn!("view {view}: capture failed: {err}"),
                }
            }
        }

        for (_, frame, _) in pending {
            frame.present();
        }
        Ok(())
    }

    /// Acquires the next swap chain image of `target`.
    ///
    /// `None` skips the view for this frame: timeouts are logged, outdated
    /// or lost surfaces are reconfigured and retried next frame. Device
    /// loss and allocation failures propagate as errors.
    fn acquire(&self, target: &ViewTarget) -> Result<Option<wgpu::SurfaceTexture>> {
        match target.surface.get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("view {}: surface timeout, skipping frame", target.view);
                Ok(None)
            }
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                target.reconfigure(&self.gpu.device);
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Records one cube pass drawing `groups` into the given attachments.
    fn render_view(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        color: &wgpu::TextureView,
        depth: &wgpu::TextureView,
        groups: u8,
    ) {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Cube Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.settings.clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        self.scene.draw(&mut rpass, groups);
    }
}

// ============================================================================
// TargetHost
// ============================================================================

impl TargetHost<Arc<Window>> for Renderer {
    type Target = ViewTarget;

    fn create_target(
        &mut self,
        view: ViewId,
        window: &Arc<Window>,
        width: u32,
        height: u32,
    ) -> Option<ViewTarget> {
        let target = match ViewTarget::new(
            &self.gpu,
            view,
            window.clone(),
            width,
            height,
            &self.settings,
        ) {
            Ok(target) => target,
            Err(err) => {
                log::warn!("view {view}: failed to bind a surface: {err}");
                return None;
            }
        };

        // The scene pipeline is built once against the primary's format.
        if target.color_format() != self.primary.color_format() {
            log::warn!(
                "view {view}: surface format {:?} does not match {:?}, leaving view unbound",
                target.color_format(),
                self.primary.color_format()
            );
            return None;
        }

        log::info!("view {view}: surface bound at {width}x{height}");
        Some(target)
    }

    fn destroy_target(&mut self, view: ViewId, target: ViewTarget) {
        drop(target);
        log::debug!("view {view}: surface released");
    }

    fn flush_frames(&mut self, frames: usize) {
        for _ in 0..frames {
            self.gpu
                .queue
                .submit(std::iter::empty::<wgpu::CommandBuffer>());
            let _ = self.gpu.device.poll(wgpu::PollType::wait_indefinitely());
        }
    }
}
