//! Window-bound GPU state: instance, surface, device and queue, plus per-frame
//! acquisition and the surface error policy.

mod context;
mod init;
mod surface;

pub use context::{Gpu, GpuFrame};
pub use init::GpuInit;
pub use surface::SurfaceErrorAction;
