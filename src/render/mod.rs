//! Frame compositing on the CPU (`vello_cpu`).

/// Timeline-to-raster compositor.
pub mod compositor;
pub(crate) mod cpu;
/// Frame buffer type.
pub mod frame;
/// Draw-order planning.
pub mod plan;
