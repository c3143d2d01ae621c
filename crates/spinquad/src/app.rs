use anyhow::Result;
use spinquad_engine::core::{App, AppControl, FrameCtx};
use spinquad_engine::paint::Color;
use spinquad_engine::render::transform::{SpinState, TransformUniform};
use spinquad_engine::render::{QuadAssets, QuadRenderer, RenderCtx};
use winit::dpi::PhysicalSize;

use crate::config::AssetPaths;

/// The demo: one textured quad spinning one degree per frame.
pub struct SpinQuadApp {
    assets: AssetPaths,
    clear_color: Color,
    spin: SpinState,
    renderer: Option<QuadRenderer>,
}

impl SpinQuadApp {
    pub fn new(assets: AssetPaths, clear_color: Color) -> Self {
        Self {
            assets,
            clear_color,
            spin: SpinState::new(),
            renderer: None,
        }
    }
}

impl App for SpinQuadApp {
    fn on_start(&mut self, ctx: &RenderCtx<'_>) -> Result<()> {
        let renderer = QuadRenderer::new(
            ctx,
            QuadAssets {
                vertex_shader: &self.assets.vertex_shader,
                fragment_shader: &self.assets.fragment_shader,
                texture: &self.assets.texture,
            },
        )?;

        let (w, h) = renderer.texture_size();
        log::debug!("texture bound: {w}x{h}");

        self.renderer = Some(renderer);
        Ok(())
    }

    fn on_resize(&mut self, size: PhysicalSize<u32>) {
        log::debug!("viewport now {}x{}", size.width, size.height);
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(renderer) = self.renderer.as_ref() else {
            return AppControl::Continue;
        };

        let angle = self.spin.tick();
        let transform = TransformUniform::for_angle(angle);
        log::trace!(
            "frame {} dt={:.4}s angle={angle}",
            ctx.time.frame_index,
            ctx.time.dt
        );

        ctx.render(self.clear_color, |rctx, target| {
            renderer.render(rctx, target, &transform);
        })
    }
}
