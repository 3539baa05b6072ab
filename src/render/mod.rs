pub mod gpu;
pub mod shader;

pub use gpu::WgpuBackend;
