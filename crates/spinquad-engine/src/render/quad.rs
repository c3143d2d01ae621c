//! The textured quad renderer: owns every GPU resource of the demo scene.

use std::path::Path;

use anyhow::{Context, Result};

use super::mesh::GpuMesh;
use super::program::{Program, TRANSFORM_UNIFORM};
use super::shader::{compile_shader, ShaderKind};
use super::texture::{GpuTexture, TextureData};
use super::transform::TransformUniform;
use super::{RenderCtx, RenderTarget};

/// Asset locations the renderer is built from.
#[derive(Debug, Clone, Copy)]
pub struct QuadAssets<'a> {
    pub vertex_shader: &'a Path,
    pub fragment_shader: &'a Path,
    pub texture: &'a Path,
}

/// Textured quad drawn with a single indexed draw call.
///
/// All GPU objects are owned here and released together when the renderer drops,
/// including when construction fails half-way.
pub struct QuadRenderer {
    program: Program,
    mesh: GpuMesh,
    texture: GpuTexture,
    transform_ubo: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl QuadRenderer {
    /// Uploads geometry, builds the program and loads the texture.
    ///
    /// Order: geometry, shaders, link, texture decode, texture upload. The image is
    /// decoded before any texture object exists.
    pub fn new(ctx: &RenderCtx<'_>, assets: QuadAssets<'_>) -> Result<Self> {
        let mesh = GpuMesh::quad(ctx.device);

        let vertex = compile_shader(ShaderKind::Vertex, assets.vertex_shader)?;
        let fragment = compile_shader(ShaderKind::Fragment, assets.fragment_shader)?;
        let program = Program::link(ctx.device, ctx.surface_format, vertex, fragment)
            .context("shader program failed to link")?;

        let texture = {
            let data = TextureData::load(assets.texture)?;
            GpuTexture::upload(ctx.device, ctx.queue, &data)?
        };

        let transform_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("spinquad transform ubo"),
            size: TransformUniform::SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        ctx.queue.write_buffer(
            &transform_ubo,
            0,
            bytemuck::bytes_of(&TransformUniform::default()),
        );

        let transform_binding = program
            .uniform_binding(TRANSFORM_UNIFORM)
            .context("transform uniform has no binding")?;
        let interface = program.interface();
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("spinquad bind group"),
            layout: program.bind_group_layout(),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: transform_binding,
                    resource: transform_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: interface.texture,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: interface.sampler,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        });

        log::info!("quad renderer ready");

        Ok(Self {
            program,
            mesh,
            texture,
            transform_ubo,
            bind_group,
        })
    }

    /// Size of the bound texture's base level.
    pub fn texture_size(&self) -> (u32, u32) {
        let size = self.texture.texture.size();
        (size.width, size.height)
    }

    /// Writes `transform` and draws the quad on top of the target's contents.
    pub fn render(
        &self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        transform: &TransformUniform,
    ) {
        ctx.queue
            .write_buffer(&self.transform_ubo, 0, bytemuck::bytes_of(transform));

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("spinquad quad pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
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
        });

        rpass.set_pipeline(self.program.pipeline());
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.mesh.vertex_buffer.slice(..));
        rpass.set_index_buffer(self.mesh.index_buffer.slice(..), GpuMesh::INDEX_FORMAT);
        rpass.draw_indexed(0..self.mesh.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::render::noop_device;
    use crate::render::shader::ShaderError;

    fn shipped(rel: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../..").join(rel)
    }

    fn build(vertex: &Path, fragment: &Path, texture: &Path) -> Result<QuadRenderer> {
        let (device, queue) = noop_device();
        let ctx = RenderCtx::new(&device, &queue, wgpu::TextureFormat::Bgra8Unorm);
        QuadRenderer::new(
            &ctx,
            QuadAssets {
                vertex_shader: vertex,
                fragment_shader: fragment,
                texture,
            },
        )
    }

    #[test]
    fn shipped_assets_build_a_renderer() {
        let renderer = build(
            &shipped("shaders/vertex.glsl"),
            &shipped("shaders/fragment.glsl"),
            &shipped("assets/test.png"),
        )
        .unwrap();
        assert_eq!(renderer.texture_size(), (64, 64));
        assert_eq!(renderer.mesh.index_count, 6);
    }

    #[test]
    fn missing_texture_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let err = build(
            &shipped("shaders/vertex.glsl"),
            &shipped("shaders/fragment.glsl"),
            &dir.path().join("nope.png"),
        )
        .err()
        .expect("missing texture must fail");
        assert!(format!("{err:#}").contains("nope.png"));
    }

    #[test]
    fn broken_shader_stops_before_link() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.glsl");
        std::fs::write(&broken, "#version 450\nvoid main() { gl_Position = ; }\n").unwrap();

        let err = build(
            &broken,
            &shipped("shaders/fragment.glsl"),
            &shipped("assets/test.png"),
        )
        .err()
        .expect("broken shader must fail");
        assert!(err.downcast_ref::<ShaderError>().is_some());
    }
}
