// Driver-side modules bridging winit/wgpu/egui to the simulation core.

pub mod input;
pub mod overlay;
