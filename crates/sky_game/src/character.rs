//! The character and its kinematic integrator.
//!
//! Velocities are expressed per reference frame (1/60 s). Each step scales them
//! by `frame_factor = dt * 60` so the simulation runs at the same speed no
//! matter how often the host ticks.

use crate::config::{BoardConfig, CharacterConfig, PhysicsConfig};

pub const REFERENCE_FPS: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
pub struct StepInput {
    pub control_x: f32,
    pub tier_multiplier: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct Character {
    pub x: f32,
    /// Top edge in world space. Decreases while ascending.
    pub world_y: f32,
    pub width: f32,
    pub height: f32,
    pub velocity_x: f32,
    pub velocity_y: f32,
    pub facing: Facing,
}

impl Character {
    /// Start position: horizontally centred, standing just above the start platform.
    pub fn spawn(board: &BoardConfig, size: &CharacterConfig, launch_velocity: f32) -> Self {
        Self {
            x: board.width / 2.0 - size.width / 2.0,
            world_y: board.height * 7.0 / 8.0 - size.height,
            width: size.width,
            height: size.height,
            velocity_x: 0.0,
            velocity_y: launch_velocity,
            facing: Facing::Right,
        }
    }

    pub fn step(&mut self, input: StepInput, dt: f32, physics: &PhysicsConfig, board_width: f32) {
        let factor = frame_factor(dt);
        // A degenerate delta is a frame with no motion at all.
        if factor == 0.0 {
            return;
        }

        let control = if input.control_x.is_finite() {
            input.control_x
        } else {
            0.0
        };
        self.velocity_x = control;
        if control > 0.0 {
            self.facing = Facing::Right;
        } else if control < 0.0 {
            self.facing = Facing::Left;
        }

        self.x += self.velocity_x * factor;
        // Cylindrical world: leaving one edge re-enters at the other.
        if self.x > board_width {
            self.x = 0.0;
        } else if self.x < 0.0 {
            self.x = board_width;
        }

        let gravity = physics.gravity * input.tier_multiplier;
        self.velocity_y = (self.velocity_y + gravity * factor).min(physics.terminal_velocity * factor);
        self.world_y += self.velocity_y * factor;
    }

    /// Bounce off a platform. Only the collision resolver calls this.
    pub(crate) fn launch(&mut self, velocity_y: f32, platform_top: f32) {
        self.world_y = platform_top - self.height;
        self.velocity_y = velocity_y;
    }

    pub fn is_descending(&self) -> bool {
        self.velocity_y >= 0.0
    }

    pub fn view_y(&self, camera_y: f32) -> f32 {
        self.world_y - camera_y
    }
}

/// Converts elapsed seconds into 60 fps reference frames. Zero for any
/// non-finite or non-positive delta.
pub fn frame_factor(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 {
        dt * REFERENCE_FPS
    } else {
        0.0
    }
}
