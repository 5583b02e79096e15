//! Vertical scroll camera.
//!
//! `camera_y` is the world-space Y shown at the top of the board. It only ever
//! moves upward (decreases): when the character rises above the threshold the
//! camera follows, but a falling character is left behind, which is how a run
//! ends.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollCamera {
    pub camera_y: f32,
    threshold: f32,
}

impl ScrollCamera {
    pub fn new(threshold: f32) -> Self {
        Self {
            camera_y: 0.0,
            threshold,
        }
    }

    /// Pin the character at the threshold if it rose above it. Returns the
    /// amount scrolled this call.
    pub fn follow(&mut self, character_world_y: f32) -> f32 {
        let view_y = character_world_y - self.camera_y;
        if view_y < self.threshold {
            let deficit = self.threshold - view_y;
            self.camera_y -= deficit;
            deficit
        } else {
            0.0
        }
    }

    /// World-space Y of the bottom edge of the board.
    pub fn trailing_edge(&self, viewport_height: f32) -> f32 {
        self.camera_y + viewport_height
    }

    pub fn reset(&mut self) {
        self.camera_y = 0.0;
    }
}
