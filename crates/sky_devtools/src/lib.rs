pub mod overlay;

pub use overlay::{BoardArea, DebugStats, HudView, Overlay, OverlayActions};
