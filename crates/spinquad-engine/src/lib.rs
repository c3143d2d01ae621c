//! spinquad engine crate.
//!
//! This crate owns the platform + GPU runtime pieces and the textured quad
//! renderer used by the `spinquad` binary.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod paint;
pub mod render;
