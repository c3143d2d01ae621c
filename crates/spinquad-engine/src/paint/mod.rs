//! Color model shared between the app and renderers.

pub mod color;

pub use color::Color;
