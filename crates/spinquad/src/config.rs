//! Demo configuration.
//!
//! There is no config file and no command line; `DemoConfig::default()` is the
//! whole configuration. `RUST_LOG` and `WGPU_BACKEND` are read from the environment.

use std::path::PathBuf;

use spinquad_engine::device::GpuInit;
use spinquad_engine::logging::LoggingConfig;
use spinquad_engine::paint::Color;
use spinquad_engine::window::RuntimeConfig;
use winit::dpi::LogicalSize;

/// Asset locations, relative to the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    pub texture: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            vertex_shader: PathBuf::from("shaders/vertex.glsl"),
            fragment_shader: PathBuf::from("shaders/fragment.glsl"),
            texture: PathBuf::from("assets/test.png"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub logging: LoggingConfig,
    pub window: RuntimeConfig,
    pub gpu: GpuInit,
    pub assets: AssetPaths,
    pub clear_color: Color,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            window: RuntimeConfig {
                title: "spinquad".to_string(),
                initial_size: LogicalSize::new(1280.0, 720.0),
            },
            // Linear surface: the clear color is written as-is, like a plain GL framebuffer.
            gpu: GpuInit {
                prefer_srgb: false,
                ..GpuInit::default()
            },
            assets: AssetPaths::default(),
            clear_color: Color::CORNFLOWER_BLUE,
        }
    }
}
