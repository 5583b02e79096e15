//! Raw input state: which keys and pointers are down, plus the keys pressed
//! this frame.
//!
//! `is_just_pressed(key)` is true only during the frame the press happened and
//! is cleared by `end_frame()` once the frame has consumed it. OS key
//! auto-repeat arrives as repeated presses of an already held key; `key_down`
//! reports those as not-new so the control layer sees one edge.
//!
//! Pointers (touches, and the mouse acting as a touch on desktop) are tracked
//! by id so a release is only forwarded for a pointer that went down on the
//! board.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    A,
    D,
    Space,
    Escape,
    F3,
    T,
}

impl Key {
    /// Horizontal direction this key steers in, if it is a movement key.
    pub fn direction(self) -> Option<f32> {
        match self {
            Key::Left | Key::A => Some(-1.0),
            Key::Right | Key::D => Some(1.0),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerId {
    Mouse,
    Touch(u64),
}

pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    pointers: HashSet<PointerId>,

    /// Last cursor position in window pixels; mouse presses carry no position.
    pub cursor_position: (f64, f64),
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            just_pressed: HashSet::new(),
            pointers: HashSet::new(),
            cursor_position: (0.0, 0.0),
        }
    }

    /// Returns true when this is a fresh press (not auto-repeat).
    pub fn key_down(&mut self, key: Key) -> bool {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
            true
        } else {
            false
        }
    }

    /// Returns true when the key was actually held.
    pub fn key_up(&mut self, key: Key) -> bool {
        self.held.remove(&key)
    }

    /// Returns true when the pointer was not already down.
    pub fn pointer_down(&mut self, id: PointerId) -> bool {
        self.pointers.insert(id)
    }

    pub fn pointer_up(&mut self, id: PointerId) -> bool {
        self.pointers.remove(&id)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}
