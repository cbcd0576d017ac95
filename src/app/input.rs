// Input state tracking for the driver window.
// Abstracts winit events into a queryable snapshot so the event loop can ask
// "where is the cursor, in world units?" when a spawn click lands.

use glam::Vec2;
use winit::event::WindowEvent;

pub struct InputState {
    /// Cursor position in physical pixels.
    pub mouse_position: (f32, f32),
    /// Window size in physical pixels.
    pub window_size: (u32, u32),
}

impl InputState {
    pub fn new(window_size: (u32, u32)) -> Self {
        Self {
            mouse_position: (0.0, 0.0),
            window_size,
        }
    }

    /// Feed a winit WindowEvent into the input state.
    /// Call this once per event before the app's own event handling.
    pub fn process_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_position = (position.x as f32, position.y as f32);
            }
            WindowEvent::Resized(size) => {
                self.window_size = (size.width, size.height);
            }
            _ => {}
        }
    }

    /// Map the current cursor position to world coordinates given the world
    /// extent rendered across the full window.
    pub fn mouse_world(&self, world_extent: Vec2) -> Vec2 {
        let (width, height) = self.window_size;
        if width == 0 || height == 0 {
            return Vec2::ZERO;
        }
        Vec2::new(
            self.mouse_position.0 / width as f32 * world_extent.x,
            self.mouse_position.1 / height as f32 * world_extent.y,
        )
    }
}
