// Flocking simulation core: spatial index, steering rules, integration.
// The windowed driver in main.rs is the only consumer of the render stack;
// nothing under sim/ touches wgpu, winit or egui.

pub mod sim;
