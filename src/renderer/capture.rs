//! Screenshot Capture
//!
//! Periodically copies every view's rendered frame out of its surface
//! texture and writes it as a PNG named `frame_<count>_<view>.png`, where
//! `count` is the capture ordinal. The copy runs after submit and before
//! present, so each file holds exactly what its window is about to show.

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use wgpu::{
    BufferDescriptor, BufferUsages, COPY_BYTES_PER_ROW_ALIGNMENT, Extent3d, MapMode, Origin3d,
    PollType, TexelCopyBufferInfo, TexelCopyBufferLayout, TexelCopyTextureInfo, TextureAspect,
    TextureFormat,
};

use crate::errors::{MultiwinError, Result};
use crate::settings::Settings;
use crate::views::ViewId;

/// Writes periodic PNG captures of every live view.
pub struct Capture {
    dir: PathBuf,
    interval: u64,
    dir_ready: bool,
}

impl Capture {
    /// Directory name under the system temp dir when none is configured.
    const DEFAULT_SUBDIR: &'static str = "multiwin-captures";

    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        let dir = settings
            .capture_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(Self::DEFAULT_SUBDIR));
        Self {
            dir,
            interval: settings.capture_interval,
            dir_ready: false,
        }
    }

    /// Returns the capture ordinal on frames that should be captured.
    #[must_use]
    pub fn due(&self, frame: u64) -> Option<u64> {
        (self.interval > 0 && frame > 0 && frame % self.interval == 0)
            .then(|| frame / self.interval)
    }

    /// Where captures are written.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Copies `texture` off the GPU and writes it to the capture directory
    /// under the given capture ordinal.
    ///
    /// Blocks until the copy is mapped. Returns the written path.
    pub fn save_view(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture: &wgpu::Texture,
        format: TextureFormat,
        count: u64,
        view: ViewId,
    ) -> Result<PathBuf> {
        if !self.dir_ready {
            std::fs::create_dir_all(&self.dir)?;
            self.dir_ready = true;
        }

        let (width, height) = (texture.width(), texture.height());
        let pixels = read_texture_rgba(device, queue, texture, format, width, height)?;

        let path = self.dir.join(capture_file_name(count, view));
        image::save_buffer_with_format(
            &path,
            &pixels,
            width,
            height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )?;
        Ok(path)
    }
}

fn capture_file_name(count: u64, view: ViewId) -> String {
    format!("frame_{count}_{view}.png")
}

/// Reads `texture` back as tightly packed RGBA8 rows (no gamma conversion).
fn read_texture_rgba(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    format: TextureFormat,
    width: u32,
    height: u32,
) -> Result<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(MultiwinError::ReadbackFailed(format!(
            "empty texture: {width}x{height}"
        )));
    }
    let bytes_per_pixel: u32 = match format {
        TextureFormat::Rgba8Unorm
        | TextureFormat::Rgba8UnormSrgb
        | TextureFormat::Bgra8Unorm
        | TextureFormat::Bgra8UnormSrgb => 4,
        other => {
            return Err(MultiwinError::ReadbackFailed(format!(
                "unsupported surface format {other:?}"
            )));
        }
    };

    let bytes_per_row = bytes_per_pixel * width;
    let padded_bytes_per_row =
        bytes_per_row.div_ceil(COPY_BYTES_PER_ROW_ALIGNMENT) * COPY_BYTES_PER_ROW_ALIGNMENT;

    let buffer = device.create_buffer(&BufferDescriptor {
        label: Some("Capture Buffer"),
        size: u64::from(padded_bytes_per_row) * u64::from(height),
        usage: BufferUsages::COPY_DST | BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Capture Encoder"),
    });
    encoder.copy_texture_to_buffer(
        TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: Origin3d::ZERO,
            aspect: TextureAspect::All,
        },
        TexelCopyBufferInfo {
            buffer: &buffer,
            layout: TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(Some(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(MapMode::Read, move |res| {
        let _ = tx.send(res);
    });
    let _ = device.poll(PollType::wait_indefinitely());

    match rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(err)) => return Err(err.into()),
        Err(_) => {
            return Err(MultiwinError::ReadbackFailed(
                "map callback dropped".to_string(),
            ));
        }
    }

    let data = slice.get_mapped_range();
    let mut pixels = unpad_rows(&data, width, height, padded_bytes_per_row);
    drop(data);
    buffer.unmap();

    if matches!(
        format,
        TextureFormat::Bgra8Unorm | TextureFormat::Bgra8UnormSrgb
    ) {
        swap_red_blue(&mut pixels);
    }
    Ok(pixels)
}

/// Strips the per-row copy padding, leaving `width * 4` bytes per row.
fn unpad_rows(data: &[u8], width: u32, height: u32, padded_bytes_per_row: u32) -> Vec<u8> {
    let bytes_per_row = (width * 4) as usize;
    let mut pixels = Vec::with_capacity(bytes_per_row * height as usize);
    for row in 0..height as usize {
        let start = row * padded_bytes_per_row as usize;
        pixels.extend_from_slice(&data[start..start + bytes_per_row]);
    }
    pixels
}

fn swap_red_blue(pixels: &mut [u8]) {
    for chunk in pixels.chunks_exact_mut(4) {
        chunk.swap(0, 2);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn capture_with_interval(interval: u64) -> Capture {
        Capture {
            dir: PathBuf::new(),
            interval,
            dir_ready: false,
        }
    }

    #[test]
    fn capture_names_carry_count_and_view() {
        let view = ViewId::new(3).unwrap();
        assert_eq!(capture_file_name(2, view), "frame_2_3.png");
    }

    #[test]
    fn cadence_counts_from_one_and_skips_frame_zero() {
        let capture = capture_with_interval(300);
        assert_eq!(capture.due(0), None);
        assert_eq!(capture.due(299), None);
        assert_eq!(capture.due(300), Some(1));
        assert_eq!(capture.due(301), None);
        assert_eq!(capture.due(600), Some(2));
    }

    #[test]
    fn zero_interval_disables_captures() {
        let capture = capture_with_interval(0);
        assert_eq!(capture.due(0), None);
        assert_eq!(capture.due(300), None);
    }

    #[test]
    fn unpad_drops_alignment_bytes() {
        // 2x2 image: 8-byte rows padded to 12.
        let mut data = Vec::new();
        for row in 0..2u8 {
            for px in 0..2u8 {
                data.extend_from_slice(&[row, px, 0, 255]);
            }
            data.extend_from_slice(&[0xaa; 4]);
        }

        let pixels = unpad_rows(&data, 2, 2, 12);
        #[rustfmt::skip]
        assert_eq!(pixels, vec![
            0, 0, 0, 255,  0, 1, 0, 255,
            1, 0, 0, 255,  1, 1, 0, 255,
        ]);
    }

    #[test]
    fn red_blue_swap_leaves_green_and_alpha() {
        let mut pixels = vec![10, 20, 30, 40, 1, 2, 3, 4];
        swap_red_blue(&mut pixels);
        assert_eq!(pixels, vec![30, 20, 10, 40, 3, 2, 1, 4]);
    }
}
