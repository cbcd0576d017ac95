// Simulation core modules.
// Everything here is plain CPU code over glam vectors; the driver layer owns
// the window, the GPU and the clock.

pub mod boid;
pub mod config;
pub mod quadtree;
pub mod rules;
pub mod vec_ops;
pub mod world;

// Re-export commonly used items
pub use boid::Boid;
pub use config::SimConfig;
pub use quadtree::{Positioned, Quadtree, Rect};
pub use rules::{Rule, RuleKind};
pub use world::Simulation;
