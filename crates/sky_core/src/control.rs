//! Input abstraction: keyboard, touch buttons and device tilt normalised into a
//! single signed horizontal control value plus a discrete restart edge.
//!
//! Exactly one [`ControlSource`] is authoritative at a time. Listeners only ever
//! write into the router; the simulation reads a [`FrameInput`] snapshot once
//! per tick and never sees raw events.

use serde::Deserialize;

use crate::input::Key;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TiltConfig {
    /// Degrees either side of the calibrated zero that produce no motion.
    pub dead_zone_deg: f32,
    pub divisor_deg: f32,
    pub sensitivity: f32,
    /// Maximum magnitude of the control value produced by tilt.
    pub cap: f32,
}

impl Default for TiltConfig {
    fn default() -> Self {
        Self {
            dead_zone_deg: 5.0,
            divisor_deg: 10.0,
            sensitivity: 2.0,
            cap: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Magnitude produced by keyboard and touch buttons.
    pub move_speed: f32,
    pub tilt: TiltConfig,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            move_speed: 4.0,
            tilt: TiltConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KeyboardControl {
    value: f32,
}

impl KeyboardControl {
    pub fn press(&mut self, direction: f32, speed: f32) {
        self.value = direction.signum() * speed;
    }

    /// Only a release in the direction currently driving motion stops it.
    pub fn release(&mut self, direction: f32) {
        if (direction > 0.0 && self.value > 0.0) || (direction < 0.0 && self.value < 0.0) {
            self.value = 0.0;
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TouchControl {
    // (pointer id, direction), most recent press last
    held: Vec<(u64, f32)>,
    speed: f32,
}

impl TouchControl {
    pub fn new(speed: f32) -> Self {
        Self {
            held: Vec::new(),
            speed,
        }
    }

    pub fn press(&mut self, id: u64, direction: f32) {
        self.held.retain(|&(held_id, _)| held_id != id);
        self.held.push((id, direction.signum()));
    }

    pub fn release(&mut self, id: u64) {
        self.held.retain(|&(held_id, _)| held_id != id);
    }

    pub fn value(&self) -> f32 {
        self.held
            .last()
            .map_or(0.0, |&(_, direction)| direction * self.speed)
    }
}

/// Which on-screen button a touch at `board_x` presses: left half or right half.
pub fn touch_direction(board_x: f32, board_width: f32) -> f32 {
    if board_x < board_width * 0.5 {
        -1.0
    } else {
        1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TiltControl {
    config: TiltConfig,
    calibration: Option<f32>,
    value: f32,
}

impl TiltControl {
    pub fn new(config: TiltConfig) -> Self {
        Self {
            config,
            calibration: None,
            value: 0.0,
        }
    }

    /// Feed a gamma reading in degrees. The first reading becomes the zero reference.
    pub fn update(&mut self, gamma_deg: f32) {
        if !gamma_deg.is_finite() {
            return;
        }
        let zero = *self.calibration.get_or_insert(gamma_deg);
        let offset = gamma_deg - zero;
        self.value = if offset.abs() <= self.config.dead_zone_deg || self.config.divisor_deg == 0.0
        {
            0.0
        } else {
            (offset / self.config.divisor_deg * self.config.sensitivity)
                .clamp(-self.config.cap, self.config.cap)
        };
    }

    pub fn calibration(&self) -> Option<f32> {
        self.calibration
    }

    pub fn value(&self) -> f32 {
        self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Keyboard,
    Touch,
    Tilt,
}

impl ControlKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Keyboard => "keyboard",
            Self::Touch => "touch",
            Self::Tilt => "tilt",
        }
    }
}

impl std::fmt::Display for ControlKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlSource {
    Keyboard(KeyboardControl),
    Touch(TouchControl),
    Tilt(TiltControl),
}

impl ControlSource {
    pub fn value(&self) -> f32 {
        match self {
            Self::Keyboard(k) => k.value(),
            Self::Touch(t) => t.value(),
            Self::Tilt(t) => t.value(),
        }
    }

    pub fn kind(&self) -> ControlKind {
        match self {
            Self::Keyboard(_) => ControlKind::Keyboard,
            Self::Touch(_) => ControlKind::Touch,
            Self::Tilt(_) => ControlKind::Tilt,
        }
    }
}

/// Snapshot consumed by the simulation once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    pub control_x: f32,
    pub restart: bool,
}

pub struct InputRouter {
    config: ControlConfig,
    source: ControlSource,
    restart_requested: bool,
}

impl InputRouter {
    pub fn new(config: ControlConfig) -> Self {
        Self {
            config,
            source: ControlSource::Keyboard(KeyboardControl::default()),
            restart_requested: false,
        }
    }

    pub fn set_config(&mut self, config: ControlConfig) {
        self.config = config;
    }

    /// Forward a fresh (non-repeat) key press.
    pub fn key_pressed(&mut self, key: Key) {
        if key == Key::Space {
            self.restart_requested = true;
        }
        let Some(direction) = key.direction() else {
            return;
        };
        if !matches!(self.source, ControlSource::Keyboard(_)) {
            log::info!("Control source: {} -> keyboard", self.source.kind());
            self.source = ControlSource::Keyboard(KeyboardControl::default());
        }
        if let ControlSource::Keyboard(keyboard) = &mut self.source {
            keyboard.press(direction, self.config.move_speed);
        }
    }

    pub fn key_released(&mut self, key: Key) {
        let Some(direction) = key.direction() else {
            return;
        };
        if let ControlSource::Keyboard(keyboard) = &mut self.source {
            keyboard.release(direction);
        }
    }

    /// A touch (or desktop mouse press) at `board_x`. Any tap also raises the
    /// restart edge; the session ignores it unless the run is over.
    pub fn touch_pressed(&mut self, id: u64, board_x: f32, board_width: f32) {
        self.restart_requested = true;
        match &mut self.source {
            ControlSource::Tilt(_) => {}
            ControlSource::Touch(touch) => {
                touch.press(id, touch_direction(board_x, board_width));
            }
            ControlSource::Keyboard(_) => {
                log::info!("Control source: keyboard -> touch");
                let mut touch = TouchControl::new(self.config.move_speed);
                touch.press(id, touch_direction(board_x, board_width));
                self.source = ControlSource::Touch(touch);
            }
        }
    }

    pub fn touch_released(&mut self, id: u64) {
        if let ControlSource::Touch(touch) = &mut self.source {
            touch.release(id);
        }
    }

    /// Make tilt authoritative. Callers must only do this once orientation
    /// permission has been granted. Recalibrates on the next reading.
    pub fn enable_tilt(&mut self) {
        log::info!("Control source: {} -> tilt", self.source.kind());
        self.source = ControlSource::Tilt(TiltControl::new(self.config.tilt));
    }

    pub fn disable_tilt(&mut self) {
        if matches!(self.source, ControlSource::Tilt(_)) {
            log::info!("Control source: tilt -> keyboard");
            self.source = ControlSource::Keyboard(KeyboardControl::default());
        }
    }

    pub fn tilt_reading(&mut self, gamma_deg: f32) {
        if let ControlSource::Tilt(tilt) = &mut self.source {
            tilt.update(gamma_deg);
        }
    }

    pub fn active(&self) -> ControlKind {
        self.source.kind()
    }

    /// Raise the restart edge from outside the keyboard/touch path (the debug
    /// window). It is gated like any other restart.
    pub fn request_restart(&mut self) {
        self.restart_requested = true;
    }

    pub fn frame_input(&self) -> FrameInput {
        FrameInput {
            control_x: self.source.value(),
            restart: self.restart_requested,
        }
    }

    /// Clear the restart edge once a tick has consumed it.
    pub fn end_frame(&mut self) {
        self.restart_requested = false;
    }
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new(ControlConfig::default())
    }
}
