//! Interleaved terrain vertex and its `wgpu::VertexBufferLayout`.
//!
//! | Location | Offset | Format    | Field    |
//! |----------|--------|-----------|----------|
//! | 0        | 0      | Float32x3 | position |
//! | 1        | 12     | Float32x3 | normal   |
//! | 2        | 24     | Float32x2 | uv       |
//! | 3        | 32     | Float32x2 | slope, erosion |

use std::mem;

use wgpu::{VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

/// One terrain vertex as uploaded to the GPU (40 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    /// `1 - normal.y`.
    pub slope: f32,
    /// Net erosion (+) or deposition (−) at this cell.
    pub erosion: f32,
}

static_assertions::assert_eq_size!(TerrainVertex, [u8; 40]);

pub const TERRAIN_VERTEX_ATTRIBUTES: [VertexAttribute; 4] = [
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: 0,
        shader_location: 0,
    },
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: 12,
        shader_location: 1,
    },
    VertexAttribute {
        format: VertexFormat::Float32x2,
        offset: 24,
        shader_location: 2,
    },
    // slope and erosion share one attribute
    VertexAttribute {
        format: VertexFormat::Float32x2,
        offset: 32,
        shader_location: 3,
    },
];

/// The vertex buffer layout for terrain render pipelines.
pub const TERRAIN_VERTEX_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: mem::size_of::<TerrainVertex>() as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &TERRAIN_VERTEX_ATTRIBUTES,
};

/// Owned copy of [`TERRAIN_VERTEX_LAYOUT`].
pub fn terrain_vertex_buffer_layout() -> VertexBufferLayout<'static> {
    TERRAIN_VERTEX_LAYOUT
}

const _: () = assert!(mem::offset_of!(TerrainVertex, normal) == 12);
const _: () = assert!(mem::offset_of!(TerrainVertex, uv) == 24);
const _: () = assert!(mem::offset_of!(TerrainVertex, slope) == 32);
const _: () = assert!(mem::offset_of!(TerrainVertex, erosion) == 36);
const _: () = assert!(
    TERRAIN_VERTEX_ATTRIBUTES[3].offset + 8 <= mem::size_of::<TerrainVertex>() as u64,
    "last attribute exceeds vertex stride"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_stride_matches_vertex_struct_size() {
        assert_eq!(TERRAIN_VERTEX_LAYOUT.array_stride, 40);
        assert_eq!(
            terrain_vertex_buffer_layout().attributes.len(),
            TERRAIN_VERTEX_ATTRIBUTES.len()
        );
    }

    #[test]
    fn test_shader_locations_are_sequential() {
        for (i, attr) in TERRAIN_VERTEX_ATTRIBUTES.iter().enumerate() {
            assert_eq!(attr.shader_location, i as u32);
        }
    }

    #[test]
    fn test_vertex_bytes_layout() {
        let v = TerrainVertex {
            position: [1.0, 2.0, 3.0],
            normal: [0.0, 1.0, 0.0],
            uv: [0.5, 0.25],
            slope: 0.0,
            erosion: -1.0,
        };
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&v));
        assert_eq!(floats, &[1.0, 2.0, 3.0, 0.0, 1.0, 0.0, 0.5, 0.25, 0.0, -1.0]);
    }

    #[test]
    fn test_layout_is_valid_for_wgpu_pipeline() {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            force_fallback_adapter: true,
            ..Default::default()
        }));

        let Ok(adapter) = adapter else {
            // No adapter (headless CI): skip.
            return;
        };

        let (device, _queue) =
            pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default()))
                .expect("failed to create device");

        let shader_source = r#"
            @vertex
            fn vs_main(
                @location(0) position: vec3<f32>,
                @location(1) normal: vec3<f32>,
                @location(2) uv: vec2<f32>,
                @location(3) slope_erosion: vec2<f32>,
            ) -> @builtin(position) vec4<f32> {
                return vec4<f32>(position + normal * slope_erosion.x, uv.x);
            }

            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return vec4<f32>(1.0, 1.0, 1.0, 1.0);
            }
        "#;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("test_terrain_shader"),
            source: wgpu::ShaderSource::Wgsl(shader_source.into()),
        });

        let _pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("test_terrain_pipeline"),
            layout: None,
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[TERRAIN_VERTEX_LAYOUT],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: wgpu::TextureFormat::Rgba8Unorm,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview_mask: None,
            cache: None,
        });
    }
}
