//! Program linking: stage interface checks, uniform reflection and pipeline creation.

use std::borrow::Cow;
use std::collections::BTreeMap;

use naga::{AddressSpace, Binding, ImageDimension, ResourceBinding, TypeInner};

use super::mesh::Vertex;
use super::shader::{CompiledShader, ShaderKind};

/// Name of the model-matrix uniform the vertex stage must declare.
pub const TRANSFORM_UNIFORM: &str = "transform";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("expected a {expected} shader, got a {found} shader")]
    StageMismatch {
        expected: ShaderKind,
        found: ShaderKind,
    },

    #[error("{kind} shader has no entry point")]
    MissingEntryPoint { kind: ShaderKind },

    #[error("fragment input at location {location} is not written by the vertex shader")]
    MissingVarying { location: u32 },

    #[error("varying at location {location} has different types in the vertex and fragment shaders")]
    VaryingTypeMismatch { location: u32 },

    #[error("uniform `{name}` is not declared")]
    MissingUniform { name: String },

    #[error("uniform `{name}` is bound in group {group}; only group 0 is supported")]
    UnsupportedGroup { name: String, group: u32 },

    #[error("binding {binding} is used by more than one uniform")]
    BindingConflict { binding: u32 },

    #[error("vertex input at location {location} is not provided by the vertex buffer layout")]
    MissingAttribute { location: u32 },

    #[error("render pipeline rejected by the device: {0}")]
    Pipeline(String),
}

/// Binding slots (group 0) resolved from the linked stages.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LinkedInterface {
    pub transform: u32,
    pub texture: u32,
    pub sampler: u32,
}

/// Checks that `vertex` and `fragment` can be linked and resolves their bindings.
///
/// This is the CPU half of [`Program::link`]; it needs no GPU.
pub fn check_link(
    vertex: &CompiledShader,
    fragment: &CompiledShader,
) -> Result<LinkedInterface, LinkError> {
    expect_stage(vertex, ShaderKind::Vertex)?;
    expect_stage(fragment, ShaderKind::Fragment)?;

    let attributes = stage_inputs(vertex)?;
    if let Some(location) = attributes
        .keys()
        .find(|loc| !Vertex::ATTRS.iter().any(|a| a.shader_location == **loc))
    {
        return Err(LinkError::MissingAttribute { location: *location });
    }

    let outputs = stage_outputs(vertex)?;
    let inputs = stage_inputs(fragment)?;

    for (location, ty) in &inputs {
        match outputs.get(location) {
            None => return Err(LinkError::MissingVarying { location: *location }),
            Some(out_ty) if out_ty != ty => {
                return Err(LinkError::VaryingTypeMismatch { location: *location });
            }
            Some(_) => {}
        }
    }

    let transform = group0_binding(
        TRANSFORM_UNIFORM,
        find_uniform(&vertex.module, TRANSFORM_UNIFORM),
    )?;
    let texture = group0_binding(
        "texture2D",
        find_handle(&fragment.module, |inner| {
            matches!(
                inner,
                TypeInner::Image {
                    dim: ImageDimension::D2,
                    arrayed: false,
                    ..
                }
            )
        }),
    )?;
    let sampler = group0_binding(
        "sampler",
        find_handle(&fragment.module, |inner| {
            matches!(inner, TypeInner::Sampler { comparison: false })
        }),
    )?;

    if transform == texture || transform == sampler {
        return Err(LinkError::BindingConflict { binding: transform });
    }
    if texture == sampler {
        return Err(LinkError::BindingConflict { binding: texture });
    }

    Ok(LinkedInterface {
        transform,
        texture,
        sampler,
    })
}

/// Resolves the binding of a uniform by name.
///
/// Matches a global variable with that name, or a member of a uniform block
/// (`uniform Transform { mat4 transform; }` resolves `transform`).
pub fn find_uniform(module: &naga::Module, name: &str) -> Option<ResourceBinding> {
    module.global_variables.iter().find_map(|(_, var)| {
        let binding = var.binding.clone()?;
        if var.name.as_deref() == Some(name) {
            return Some(binding);
        }
        if !matches!(var.space, AddressSpace::Uniform) {
            return None;
        }
        match &module.types[var.ty].inner {
            TypeInner::Struct { members, .. }
                if members.iter().any(|m| m.name.as_deref() == Some(name)) =>
            {
                Some(binding)
            }
            _ => None,
        }
    })
}

/// Collects every group 0 binding of `module` by name.
///
/// Uniform block members are listed under their own names, so the block in the
/// vertex shader contributes `transform`.
pub fn reflect_bindings(module: &naga::Module, out: &mut BTreeMap<String, u32>) {
    for (_, var) in module.global_variables.iter() {
        let Some(binding) = var.binding.as_ref().filter(|b| b.group == 0) else {
            continue;
        };
        if let Some(name) = &var.name {
            out.insert(name.clone(), binding.binding);
        }
        if let (AddressSpace::Uniform, TypeInner::Struct { members, .. }) =
            (var.space, &module.types[var.ty].inner)
        {
            for name in members.iter().filter_map(|m| m.name.as_ref()) {
                out.insert(name.clone(), binding.binding);
            }
        }
    }
}

fn find_handle(
    module: &naga::Module,
    pred: impl Fn(&TypeInner) -> bool,
) -> Option<ResourceBinding> {
    module.global_variables.iter().find_map(|(_, var)| {
        if matches!(var.space, AddressSpace::Handle) && pred(&module.types[var.ty].inner) {
            var.binding.clone()
        } else {
            None
        }
    })
}

fn group0_binding(name: &str, binding: Option<ResourceBinding>) -> Result<u32, LinkError> {
    let binding = binding.ok_or_else(|| LinkError::MissingUniform {
        name: name.to_string(),
    })?;
    if binding.group != 0 {
        return Err(LinkError::UnsupportedGroup {
            name: name.to_string(),
            group: binding.group,
        });
    }
    Ok(binding.binding)
}

fn expect_stage(shader: &CompiledShader, expected: ShaderKind) -> Result<(), LinkError> {
    if shader.kind != expected {
        return Err(LinkError::StageMismatch {
            expected,
            found: shader.kind,
        });
    }
    Ok(())
}

fn entry_point(shader: &CompiledShader) -> Result<&naga::EntryPoint, LinkError> {
    let stage = shader.kind.naga_stage();
    shader
        .module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage)
        .ok_or(LinkError::MissingEntryPoint { kind: shader.kind })
}

type Varyings = BTreeMap<u32, TypeInner>;

fn stage_outputs(shader: &CompiledShader) -> Result<Varyings, LinkError> {
    let ep = entry_point(shader)?;
    let mut out = Varyings::new();
    if let Some(result) = &ep.function.result {
        collect_locations(&shader.module, result.ty, result.binding.as_ref(), &mut out);
    }
    Ok(out)
}

fn stage_inputs(shader: &CompiledShader) -> Result<Varyings, LinkError> {
    let ep = entry_point(shader)?;
    let mut out = Varyings::new();
    for arg in &ep.function.arguments {
        collect_locations(&shader.module, arg.ty, arg.binding.as_ref(), &mut out);
    }
    Ok(out)
}

fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&Binding>,
    out: &mut Varyings,
) {
    match binding {
        Some(Binding::Location { location, .. }) => {
            out.insert(*location, module.types[ty].inner.clone());
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

/// A linked vertex + fragment program.
///
/// Binding slots are resolved once at link time; per-frame code never looks
/// uniforms up by name.
pub struct Program {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    interface: LinkedInterface,
    uniforms: BTreeMap<String, u32>,
}

impl Program {
    /// Links the two stages into a render pipeline targeting `surface_format`.
    ///
    /// Both stages are consumed. Their GPU modules only live for the duration of
    /// this call, whether or not linking succeeds. Device validation errors are
    /// captured in an error scope and returned as [`LinkError::Pipeline`].
    pub fn link(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        vertex: CompiledShader,
        fragment: CompiledShader,
    ) -> Result<Self, LinkError> {
        let interface = check_link(&vertex, &fragment)?;
        let vs_entry = entry_point(&vertex)?.name.clone();
        let fs_entry = entry_point(&fragment)?.name.clone();

        log::debug!(
            "linking {} + {} (transform={}, texture={}, sampler={})",
            vertex.path.display(),
            fragment.path.display(),
            interface.transform,
            interface.texture,
            interface.sampler
        );

        let mut uniforms = BTreeMap::new();
        reflect_bindings(&vertex.module, &mut uniforms);
        reflect_bindings(&fragment.module, &mut uniforms);

        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("spinquad vertex shader"),
            source: wgpu::ShaderSource::Naga(Cow::Owned(vertex.module)),
        });
        let fs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("spinquad fragment shader"),
            source: wgpu::ShaderSource::Naga(Cow::Owned(fragment.module)),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("spinquad bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: interface.transform,
                    visibility: ShaderKind::Vertex.wgpu_stage(),
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: interface.texture,
                    visibility: ShaderKind::Fragment.wgpu_stage(),
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: interface.sampler,
                    visibility: ShaderKind::Fragment.wgpu_stage(),
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("spinquad pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("spinquad pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &vs_module,
                entry_point: Some(vs_entry.as_str()),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &fs_module,
                entry_point: Some(fs_entry.as_str()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            // The second quad triangle winds clockwise; draw both faces.
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        if let Some(err) = pollster::block_on(scope.pop()) {
            return Err(LinkError::Pipeline(err.to_string()));
        }

        Ok(Self {
            pipeline,
            bind_group_layout,
            interface,
            uniforms,
        })
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn interface(&self) -> LinkedInterface {
        self.interface
    }

    /// Binding slot of a uniform resolved at link time.
    pub fn uniform_binding(&self, name: &str) -> Option<u32> {
        self.uniforms.get(name).copied()
    }
}
