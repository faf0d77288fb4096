//! App Settings
//!
//! Configuration consumed once at startup. There is no config file; a demo
//! of this size is configured in code, in `main`, by building a [`Settings`]
//! value.

use std::path::PathBuf;

/// Global configuration for the app and its renderer.
///
/// # Fields
///
/// | Field              | Description                               | Default              |
/// |--------------------|-------------------------------------------|----------------------|
/// | `title`            | Primary window title                      | `"multiwin"`         |
/// | `width`, `height`  | Primary window size in pixels             | `1280 × 720`         |
/// | `vsync`            | Vertical sync enabled                     | `true`               |
/// | `backends`         | Forced wgpu backend (or auto)             | `None`               |
/// | `power_preference` | GPU adapter selection strategy            | `HighPerformance`    |
/// | `clear_color`      | Per-view clear color                      | `0x30_30_30`         |
/// | `depth_format`     | Depth buffer texture format               | `Depth32Float`       |
/// | `capture_interval` | Frames between screenshot captures        | `300` (`0` disables) |
/// | `capture_dir`      | Screenshot directory (or system temp dir) | `None`               |
///
/// # Example
///
/// ```rust,ignore
/// use multiwin::Settings;
///
/// let settings = Settings {
///     vsync: false,
///     capture_interval: 0,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Settings {
    /// Title of the primary window. Secondary windows are titled after
    /// their view id.
    pub title: String,

    /// Initial width of the primary window, in physical pixels.
    pub width: u32,

    /// Initial height of the primary window, in physical pixels.
    pub height: u32,

    /// Enable vertical synchronization.
    ///
    /// When `true`, presentation is capped to the display refresh rate.
    /// Applies to every window's swap chain.
    pub vsync: bool,

    /// Force a specific wgpu backend (Vulkan, Metal, DX12, …).
    ///
    /// `None` lets wgpu choose the best available backend for the platform.
    /// Override this only when debugging backend-specific issues.
    pub backends: Option<wgpu::Backends>,

    /// GPU adapter selection preference.
    pub power_preference: wgpu::PowerPreference,

    /// Background clear color, shared by all views.
    pub clear_color: wgpu::Color,

    /// Depth buffer texture format.
    pub depth_format: wgpu::TextureFormat,

    /// Take a screenshot of every view each time this many frames have
    /// elapsed. `0` disables captures entirely.
    pub capture_interval: u64,

    /// Directory screenshots are written to.
    ///
    /// `None` resolves to `multiwin-captures` under the system temp
    /// directory. The directory is created on first use.
    pub capture_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: "multiwin".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
            backends: None,
            power_preference: wgpu::PowerPreference::HighPerformance,
            clear_color: wgpu::Color {
                r: 48.0 / 255.0,
                g: 48.0 / 255.0,
                b: 48.0 / 255.0,
                a: 1.0,
            },
            depth_format: wgpu::TextureFormat::Depth32Float,
            capture_interval: 300,
            capture_dir: None,
        }
    }
}
