/// Straight-alpha RGBA color with `f32` channels in `[0, 1]`.
///
/// Only the clear color uses it; the quad is drawn without blending, so there is
/// nothing to premultiply.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Cornflower blue, the classic clear color.
    pub const CORNFLOWER_BLUE: Self = Self::rgba(0.392, 0.584, 0.929, 1.0);

    #[inline]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Converts to the `f64` color used by render-pass clear operations.
    #[inline]
    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wgpu_conversion_keeps_channels() {
        let c = Color::CORNFLOWER_BLUE.to_wgpu();
        assert!((c.r - 0.392).abs() < 1e-6);
        assert!((c.g - 0.584).abs() < 1e-6);
        assert!((c.b - 0.929).abs() < 1e-6);
        assert_eq!(c.a, 1.0);
    }
}
