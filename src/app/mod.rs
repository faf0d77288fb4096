//! Application Shell
//!
//! Winit event loop for the multi-window demo. The primary window drives
//! everything: its redraw reconciles the view table against observed window
//! state, then renders every live view in one submission. Secondary windows
//! are opened with the C key (random position, fixed size) and closed with
//! the D key or their own close button.

mod bindings;

pub use bindings::Command;

use std::collections::HashSet;
use std::sync::Arc;

use rand::Rng;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::errors::Result;
use crate::renderer::{FrameInfo, Renderer, ViewTarget};
use crate::settings::Settings;
use crate::utils::{FpsCounter, Timer};
use crate::views::{ViewId, ViewTable, WindowState};

/// Fixed size of windows opened with the C key.
const SECONDARY_SIZE: PhysicalSize<u32> = PhysicalSize::new(640, 480);

/// Owns the event loop state: the view table, frame timing and the renderer.
pub struct App {
    settings: Settings,
    renderer: Option<Renderer>,
    views: ViewTable<Arc<Window>, ViewTarget>,
    /// Windows whose close button was pressed; their slots are cleared by
    /// the next reconcile.
    pending_close: HashSet<WindowId>,
    timer: Timer,
    fps: FpsCounter,
}

impl App {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            renderer: None,
            views: ViewTable::new(),
            pending_close: HashSet::new(),
            timer: Timer::new(),
            fps: FpsCounter::new(),
        }
    }

    /// Runs the event loop until the primary window closes or the renderer
    /// hits a fatal error.
    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self)?;
        Ok(())
    }

    fn primary_window(&self) -> Option<Arc<Window>> {
        self.views
            .get(ViewId::PRIMARY)
            .map(|slot| slot.window().clone())
    }

    /// Opens a secondary window and claims a view for it.
    ///
    /// With all views in use the freshly created window is dropped again,
    /// closing it before it ever renders.
    fn create_window(&mut self, event_loop: &ActiveEventLoop) {
        let mut rng = rand::rng();
        let position = PhysicalPosition::new(
            rng.random_range(0..self.settings.width.max(1)),
            rng.random_range(0..self.settings.height.max(1)),
        );
        let attributes = Window::default_attributes()
            .with_title("Window")
            .with_inner_size(SECONDARY_SIZE)
            .with_position(position);

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::warn!("window creation failed: {err}");
                return;
            }
        };

        match self.views.insert(window.clone()) {
            Some(view) => {
                window.set_title(&format!("Window - view {view}"));
                log::info!("view {view}: window opened");
            }
            None => {
                log::warn!("all views are in use, dropping the new window");
            }
        }
    }

    /// Closes the oldest secondary window, releasing its swap chain first.
    fn destroy_window(&mut self) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        match self.views.destroy_first(renderer) {
            Some((view, window)) => {
                log::info!("view {view}: window closed");
                drop(window);
            }
            None => log::info!("no secondary window to destroy"),
        }
    }

    /// Renders one frame: reconcile the table, then draw and present every
    /// live view.
    fn redraw(&mut self, event_loop: &ActiveEventLoop, primary: &Window) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };

        self.timer.tick();
        self.fps.update();

        let pending = &self.pending_close;
        self.views.reconcile(renderer, |_, window| {
            let size = window.inner_size();
            WindowState {
                alive: !pending.contains(&window.id()),
                width: size.width,
                height: size.height,
            }
        });
        self.pending_close.clear();

        let info = FrameInfo {
            time: self.timer.elapsed_seconds(),
            frame: self.timer.frame_count,
            fps: self.fps.current_fps,
        };
        if let Err(err) = renderer.draw(&self.views, primary, &info) {
            log::error!("fatal render error: {err}");
            event_loop.exit();
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(self.settings.title.clone())
            .with_inner_size(PhysicalSize::new(self.settings.width, self.settings.height));

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("primary window creation failed: {err}");
                event_loop.exit();
                return;
            }
        };

        match Renderer::new(window.clone(), self.settings.clone()) {
            Ok(renderer) => {
                log::info!(
                    "captures will be written to {}",
                    renderer.capture_dir().display()
                );
                self.renderer = Some(renderer);
                self.views.insert(window);
            }
            Err(err) => {
                log::error!("fatal renderer error: {err}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(primary) = self.primary_window() else {
            return;
        };
        let is_primary = primary.id() == window_id;

        // The HUD gets first look at primary-window events.
        if is_primary
            && let Some(renderer) = self.renderer.as_mut()
            && renderer.overlay_input(&primary, &event)
        {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                if is_primary {
                    event_loop.exit();
                } else {
                    self.pending_close.insert(window_id);
                }
            }
            WindowEvent::Resized(size) if is_primary => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize_primary(
                        size.width,
                        size.height,
                        primary.scale_factor() as f32,
                    );
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } if is_primary => {
                let size = primary.inner_size();
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize_primary(size.width, size.height, scale_factor as f32);
                }
            }
            WindowEvent::KeyboardInput { event, .. } if is_primary => {
                match bindings::command_for(&event) {
                    Some(Command::CreateWindow) => self.create_window(event_loop),
                    Some(Command::DestroyWindow) => self.destroy_window(),
                    None => {}
                }
            }
            WindowEvent::RedrawRequested if is_primary => {
                self.redraw(event_loop, &primary);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(slot) = self.views.get(ViewId::PRIMARY) {
            slot.window().request_redraw();
        }
    }
}
