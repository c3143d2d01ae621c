//! Quad geometry: vertex layout, constant data and GPU upload.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// Interleaved vertex: position, color, texture coordinate (8 floats, 32 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Float32x4, // color
        2 => Float32x2  // uv
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Unit quad centered on the origin, UV origin at the bottom-left corner.
#[rustfmt::skip]
pub const QUAD_VERTICES: [Vertex; 4] = [
    Vertex { position: [-0.5, -0.5], color: [1.0, 0.0, 0.0, 1.0], uv: [0.0, 0.0] },
    Vertex { position: [ 0.5, -0.5], color: [0.0, 1.0, 0.0, 1.0], uv: [1.0, 0.0] },
    Vertex { position: [-0.5,  0.5], color: [0.0, 1.0, 0.0, 1.0], uv: [0.0, 1.0] },
    Vertex { position: [ 0.5,  0.5], color: [1.0, 1.0, 1.0, 1.0], uv: [1.0, 1.0] },
];

#[rustfmt::skip]
pub const QUAD_INDICES: [u32; 6] = [
    0, 1, 2,
    1, 2, 3,
];

/// Vertex + index buffers living on the GPU.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    /// Uploads `vertices` and `indices` once into static buffers.
    pub fn upload(device: &wgpu::Device, vertices: &[Vertex], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("spinquad quad vbo"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("spinquad quad ibo"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        log::debug!(
            "uploaded mesh: {} vertices, {} indices",
            vertices.len(),
            indices.len()
        );

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    /// Uploads the constant quad.
    pub fn quad(device: &wgpu::Device) -> Self {
        Self::upload(device, &QUAD_VERTICES, &QUAD_INDICES)
    }

    pub const INDEX_FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_eight_floats() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        assert_eq!(Vertex::layout().array_stride, 32);
        assert_eq!(Vertex::layout().step_mode, wgpu::VertexStepMode::Vertex);
    }

    #[test]
    fn vertex_attributes_match_interleaving() {
        let attrs = Vertex::ATTRS;
        assert_eq!(attrs.len(), 3);

        let expected = [
            (0, 0, wgpu::VertexFormat::Float32x2),
            (1, 8, wgpu::VertexFormat::Float32x4),
            (2, 24, wgpu::VertexFormat::Float32x2),
        ];
        for (attr, (location, offset, format)) in attrs.iter().zip(expected) {
            assert_eq!(attr.shader_location, location);
            assert_eq!(attr.offset, offset);
            assert_eq!(attr.format, format);
        }

        let last = attrs[2];
        assert_eq!(last.offset + last.format.size(), 32);
    }

    #[test]
    fn vertex_bytes_are_tightly_packed() {
        let bytes: &[u8] = bytemuck::cast_slice(&QUAD_VERTICES);
        assert_eq!(bytes.len(), 4 * 32);

        let floats: &[f32] = bytemuck::cast_slice(&QUAD_VERTICES);
        // Second vertex: position then color then uv.
        assert_eq!(&floats[8..16], &[0.5, -0.5, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn indices_form_two_triangles_in_range() {
        assert_eq!(QUAD_INDICES.len(), 6);
        assert_eq!(QUAD_INDICES.chunks_exact(3).count(), 2);
        assert!(QUAD_INDICES.iter().all(|&i| (i as usize) < QUAD_VERTICES.len()));
    }

    #[test]
    fn triangles_cover_the_unit_quad() {
        let area: f32 = QUAD_INDICES
            .chunks_exact(3)
            .map(|tri| {
                let [a, b, c] = [0, 1, 2].map(|k| QUAD_VERTICES[tri[k] as usize].position);
                ((b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1])).abs() * 0.5
            })
            .sum();
        assert!((area - 1.0).abs() < 1e-6);

        for v in QUAD_VERTICES {
            assert!(v.position.iter().all(|p| p.abs() == 0.5));
        }
    }

    #[test]
    fn uv_follows_position() {
        for v in QUAD_VERTICES {
            assert_eq!(v.uv[0], v.position[0] + 0.5);
            assert_eq!(v.uv[1], v.position[1] + 0.5);
        }
    }

    #[test]
    fn quad_uploads_six_indices() {
        let (device, _queue) = crate::render::noop_device();
        let mesh = GpuMesh::quad(&device);
        assert_eq!(mesh.index_count, 6);
        assert_eq!(mesh.vertex_buffer.size(), 4 * 32);
        assert_eq!(mesh.index_buffer.size(), 6 * 4);
        assert!(mesh.index_buffer.usage().contains(wgpu::BufferUsages::INDEX));
    }
}
