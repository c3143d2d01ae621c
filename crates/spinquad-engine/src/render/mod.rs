//! GPU rendering subsystem.
//!
//! Conventions:
//! - geometry is in normalized device coordinates (+Y up)
//! - texture UV origin is the bottom-left corner (images are flipped on load)
//! - matrices are column-major, matching GLSL `mat4`

mod ctx;
pub mod mesh;
pub mod program;
pub mod quad;
pub mod shader;
pub mod texture;
pub mod transform;

pub use ctx::{RenderCtx, RenderTarget};
pub use quad::{QuadAssets, QuadRenderer};

/// Headless device on wgpu's noop backend: validation runs, nothing executes.
#[cfg(test)]
pub(crate) fn noop_device() -> (wgpu::Device, wgpu::Queue) {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::NOOP,
        backend_options: wgpu::BackendOptions {
            noop: wgpu::NoopBackendOptions { enable: true },
            ..Default::default()
        },
        ..Default::default()
    });
    pollster::block_on(async {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await
            .expect("noop adapter");
        adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("spinquad test device"),
                ..Default::default()
            })
            .await
            .expect("noop device")
    })
}
