//! Cube Field Pass
//!
//! The one scene everything renders: an 11 × 11 field of rotating color
//! cubes. Cubes are dealt round-robin into [`MAX_WINDOWS`] draw groups, and
//! instances are uploaded grouped so each group is one contiguous instance
//! range. Views pick the groups they draw via a bitmap: a secondary window
//! draws its own group, the primary picks up group 0 plus every group whose
//! view has no target of its own. Opening a window therefore visibly pulls
//! a share of the field out of the primary view.

use std::ops::Range;

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::views::MAX_WINDOWS;

/// Cubes per grid side.
const GRID_DIM: usize = 11;
/// Total cube count.
const CUBE_COUNT: usize = GRID_DIM * GRID_DIM;

const CAMERA_EYE: Vec3 = Vec3::new(0.0, 0.0, -35.0);
const FOV_Y_DEGREES: f32 = 60.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 100.0;

// ---------------------------------------------------------------------------
// GPU data
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
    /// RGBA, one byte per channel.
    color: [u8; 4],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Unorm8x4];

    const fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

const CUBE_VERTICES: [Vertex; 8] = [
    Vertex { position: [-1.0,  1.0,  1.0], color: [0x00, 0x00, 0x00, 0xff] },
    Vertex { position: [ 1.0,  1.0,  1.0], color: [0xff, 0x00, 0x00, 0xff] },
    Vertex { position: [-1.0, -1.0,  1.0], color: [0x00, 0xff, 0x00, 0xff] },
    Vertex { position: [ 1.0, -1.0,  1.0], color: [0xff, 0xff, 0x00, 0xff] },
    Vertex { position: [-1.0,  1.0, -1.0], color: [0x00, 0x00, 0xff, 0xff] },
    Vertex { position: [ 1.0,  1.0, -1.0], color: [0xff, 0x00, 0xff, 0xff] },
    Vertex { position: [-1.0, -1.0, -1.0], color: [0x00, 0xff, 0xff, 0xff] },
    Vertex { position: [ 1.0, -1.0, -1.0], color: [0xff, 0xff, 0xff, 0xff] },
];

const CUBE_INDICES: [u16; 36] = [
    0, 1, 2,
    1, 3, 2,
    4, 6, 5,
    5, 6, 7,
    0, 2, 4,
    4, 2, 6,
    1, 5, 3,
    5, 7, 3,
    0, 4, 1,
    4, 5, 1,
    2, 3, 6,
    6, 3, 7,
];

/// Per-instance model matrix, split into four vec4 attributes.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct InstanceRaw {
    model: [[f32; 4]; 4],
}

impl InstanceRaw {
    const ATTRIBS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
    ];

    const fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

// ---------------------------------------------------------------------------
// Scene math
// ---------------------------------------------------------------------------

/// Model matrix of cube `index` at `time` seconds: a per-cell rotation phase
/// on a fixed grid position.
fn cube_model(index: usize, time: f32) -> Mat4 {
    let xx = (index % GRID_DIM) as f32;
    let yy = (index / GRID_DIM) as f32;
    let rotation =
        Mat4::from_rotation_y(time + yy * 0.37) * Mat4::from_rotation_x(time + xx * 0.21);
    let position = Vec3::new(-15.0 + xx * 3.0, -15.0 + yy * 3.0, 0.0);
    Mat4::from_translation(position) * rotation
}

/// Camera matrix shared by every view.
///
/// Left-handed, depth 0..1. All views reuse the primary window's aspect
/// ratio, so secondary windows stretch the image rather than widen the
/// frustum.
fn view_proj(aspect: f32) -> Mat4 {
    let view = Mat4::look_at_lh(CAMERA_EYE, Vec3::ZERO, Vec3::Y);
    let proj = Mat4::perspective_lh(FOV_Y_DEGREES.to_radians(), aspect, Z_NEAR, Z_FAR);
    proj * view
}

/// Instance range of each draw group.
///
/// Cube `i` belongs to group `i % MAX_WINDOWS`; instances are uploaded in
/// group order, so group `g` occupies one contiguous range.
fn group_ranges() -> [Range<u32>; MAX_WINDOWS] {
    let mut start = 0u32;
    std::array::from_fn(|group| {
        let count = (CUBE_COUNT - group).div_ceil(MAX_WINDOWS) as u32;
        let range = start..start + count;
        start = range.end;
        range
    })
}

// ---------------------------------------------------------------------------
// CubeScene
// ---------------------------------------------------------------------------

/// Pipeline and buffers for the cube field, shared by every view.
pub struct CubeScene {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    ranges: [Range<u32>; MAX_WINDOWS],
}

impl CubeScene {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Cubes Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/cubes.wgsl").into()),
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cube Vertices"),
            contents: bytemuck::cast_slice(&CUBE_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cube Indices"),
            contents: bytemuck::cast_slice(&CUBE_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Cube Instances"),
            size: (CUBE_COUNT * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform"),
            contents: bytemuck::bytes_of(&CameraUniform {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Cubes Pipeline Layout"),
            bind_group_layouts: &[&camera_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Cubes Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout(), InstanceRaw::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview_mask: None,
            cache: None,
        });

        Self {
            pipeline,
            vertex_buffer,
            index_buffer,
            instance_buffer,
            camera_buffer,
            camera_bind_group,
            ranges: group_ranges(),
        }
    }

    /// Uploads the camera and all cube transforms for this frame.
    pub fn update(&self, queue: &wgpu::Queue, time: f32, aspect: f32) {
        let camera = CameraUniform {
            view_proj: view_proj(aspect).to_cols_array_2d(),
        };
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&camera));

        let mut instances = Vec::with_capacity(CUBE_COUNT);
        for group in 0..MAX_WINDOWS {
            for index in (group..CUBE_COUNT).step_by(MAX_WINDOWS) {
                instances.push(InstanceRaw {
                    model: cube_model(index, time).to_cols_array_2d(),
                });
            }
        }
        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
    }

    /// Records draws for every group whose bit is set in `groups`.
    pub fn draw(&self, rpass: &mut wgpu::RenderPass<'_>, groups: u8) {
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.camera_bind_group, &[]);
        rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        rpass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        rpass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);

        for (group, range) in self.ranges.iter().enumerate() {
            if groups & (1 << group) != 0 {
                rpass.draw_indexed(0..CUBE_INDICES.len() as u32, 0, range.clone());
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_ranges_partition_the_field() {
        let ranges = group_ranges();

        let mut expected_start = 0;
        for (group, range) in ranges.iter().enumerate() {
            assert_eq!(range.start, expected_start, "group {group} not contiguous");
            let brute_count = (group..CUBE_COUNT).step_by(MAX_WINDOWS).count() as u32;
            assert_eq!(range.end - range.start, brute_count);
            expected_start = range.end;
        }
        assert_eq!(expected_start as usize, CUBE_COUNT);
    }

    #[test]
    fn cubes_sit_on_their_grid_cells() {
        // Rotation must not displace a cube; the translation column is the
        // grid position regardless of time.
        let index = 24; // xx = 2, yy = 2
        let model = cube_model(index, 1.7);
        assert_eq!(model.w_axis.x, -15.0 + 2.0 * 3.0);
        assert_eq!(model.w_axis.y, -15.0 + 2.0 * 3.0);
        assert_eq!(model.w_axis.z, 0.0);
        assert_eq!(model.w_axis.w, 1.0);
    }

    #[test]
    fn camera_projects_origin_inside_the_depth_range() {
        let vp = view_proj(1280.0 / 720.0);
        let ndc = vp.project_point3(Vec3::ZERO);
        assert!(ndc.x.abs() < 1e-6);
        assert!(ndc.y.abs() < 1e-6);
        assert!(ndc.z > 0.0 && ndc.z < 1.0, "origin depth {} out of range", ndc.z);
    }
}
