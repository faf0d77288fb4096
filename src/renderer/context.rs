//! wgpu Context
//!
//! One [`GpuContext`] (instance, adapter, device, queue) is shared by every
//! window; each window gets its own [`ViewTarget`] holding the surface,
//! surface configuration, and depth buffer bound to it. Targets for
//! secondary windows are created and destroyed as windows come and go,
//! while the primary target lives for the whole session.

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::errors::{MultiwinError, Result};
use crate::settings::Settings;
use crate::views::ViewId;

/// Core wgpu handles shared by all views.
pub struct GpuContext {
    /// The instance surfaces are created from
    pub instance: wgpu::Instance,
    /// The adapter all surfaces are configured against
    pub adapter: wgpu::Adapter,
    /// The wgpu device for GPU operations
    pub device: wgpu::Device,
    /// The command queue for submitting work
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Initializes the GPU against the primary window and returns the
    /// context together with the primary window's [`ViewTarget`].
    ///
    /// The adapter is requested compatible with the primary surface;
    /// surfaces bound to further windows reuse it.
    pub async fn new<W>(
        window: W,
        settings: &Settings,
        width: u32,
        height: u32,
    ) -> Result<(Self, ViewTarget)>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        let instance = match settings.backends {
            Some(backends) => wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends,
                ..Default::default()
            }),
            None => wgpu::Instance::default(),
        };
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: settings.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| MultiwinError::AdapterRequestFailed(e.to_string()))?;

        let info = adapter.get_info();
        log::info!("adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                memory_hints: wgpu::MemoryHints::Performance,
                ..Default::default()
            })
            .await?;

        let gpu = Self {
            instance,
            adapter,
            device,
            queue,
        };
        let primary =
            ViewTarget::from_surface(&gpu, ViewId::PRIMARY, surface, width, height, settings)?;
        Ok((gpu, primary))
    }
}

/// Swap chain, configuration, and depth buffer for one window.
pub struct ViewTarget {
    /// The view this target belongs to
    pub view: ViewId,
    /// The window surface for presentation
    pub surface: wgpu::Surface<'static>,
    /// Surface configuration
    pub config: wgpu::SurfaceConfiguration,
    /// Depth buffer texture view (recreated on resize)
    pub depth_view: wgpu::TextureView,

    depth_format: wgpu::TextureFormat,
    /// Whether the surface supports being copied out for screenshots
    pub can_capture: bool,
}

impl ViewTarget {
    /// Binds a new surface to `window` and configures it.
    pub fn new<W>(
        gpu: &GpuContext,
        view: ViewId,
        window: W,
        width: u32,
        height: u32,
        settings: &Settings,
    ) -> Result<Self>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        let surface = gpu.instance.create_surface(window)?;
        Self::from_surface(gpu, view, surface, width, height, settings)
    }

    fn from_surface(
        gpu: &GpuContext,
        view: ViewId,
        surface: wgpu::Surface<'static>,
        width: u32,
        height: u32,
        settings: &Settings,
    ) -> Result<Self> {
        let mut config = surface
            .get_default_config(&gpu.adapter, width, height)
            .ok_or_else(|| {
                MultiwinError::AdapterRequestFailed("Surface not supported by adapter".to_string())
            })?;

        config.present_mode = if settings.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        // Screenshots copy the surface texture out, which not every
        // backend permits.
        let caps = surface.get_capabilities(&gpu.adapter);
        let can_capture = caps.usages.contains(wgpu::TextureUsages::COPY_SRC);
        if can_capture {
            config.usage |= wgpu::TextureUsages::COPY_SRC;
        } else {
            log::warn!("view {view}: surface cannot be copied, screenshots disabled");
        }

        surface.configure(&gpu.device, &config);
        let depth_view =
            Self::create_depth_texture(&gpu.device, &config, settings.depth_format, view);

        Ok(Self {
            view,
            surface,
            config,
            depth_view,
            depth_format: settings.depth_format,
            can_capture,
        })
    }

    /// Reconfigures the surface at a new size and rebuilds the depth buffer.
    /// Zero-sized requests are ignored.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(device, &self.config);
            self.depth_view =
                Self::create_depth_texture(device, &self.config, self.depth_format, self.view);
        }
    }

    /// Re-applies the current configuration after the surface was lost.
    pub fn reconfigure(&self, device: &wgpu::Device) {
        self.surface.configure(device, &self.config);
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        format: wgpu::TextureFormat,
        view: ViewId,
    ) -> wgpu::TextureView {
        let size = wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(&format!("Depth Texture (view {view})")),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        };
        let texture = device.create_texture(&desc);
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Returns the surface color format.
    #[must_use]
    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Returns the current surface dimensions.
    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Aspect ratio of the surface.
    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }
}
