//! Tuning configuration loaded from JSON.
//!
//! Every field has a default, so a partial (or missing) file still yields a
//! playable game. The difficulty constants were tuned by trial; they live here
//! rather than as literals so they can be retuned without a rebuild.

use serde::Deserialize;
use sky_core::control::ControlConfig;
use sky_core::tier::TierTable;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::draw::SpriteImage;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct GameConfig {
    pub board: BoardConfig,
    pub character: CharacterConfig,
    pub physics: PhysicsConfig,
    pub level: LevelConfig,
    pub tiers: TierTable,
    pub controls: ControlConfig,
    pub images: ImageConfig,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct BoardConfig {
    pub width: f32,
    pub height: f32,
    /// View-space Y the camera pins the character to while ascending.
    pub camera_threshold: f32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: 360.0,
            height: 576.0,
            camera_threshold: 150.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct CharacterConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            width: 46.0,
            height: 46.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Per reference frame (1/60 s).
    pub gravity: f32,
    pub terminal_velocity: f32,
    /// Vertical velocity applied on every landing. Negative is upward.
    pub launch_velocity: f32,
    /// Each tier adds this much to the difficulty multiplier.
    pub tier_step: f32,
    pub max_frame_dt: f64,
    pub max_substep_dt: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.03,
            terminal_velocity: 8.0,
            launch_velocity: -2.5,
            tier_step: 0.2,
            max_frame_dt: 0.25,
            max_substep_dt: 1.0 / 30.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct LevelConfig {
    pub platform_width: f32,
    pub platform_height: f32,
    /// Distance of the start platform above the bottom of the board.
    pub start_platform_offset: f32,
    pub extra_platforms: usize,
    /// Distance of the first extra platform above the bottom of the board.
    pub first_extra_offset: f32,
    pub base_gap: f32,
    pub gap_score_factor: f32,
    /// Platforms spawn with `x` uniform in `[0, width * bound_fraction)`.
    pub bound_fraction: f32,
    pub seed: Option<u64>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            platform_width: 60.0,
            platform_height: 18.0,
            start_platform_offset: 50.0,
            extra_platforms: 6,
            first_extra_offset: 150.0,
            base_gap: 75.0,
            gap_score_factor: 0.2,
            bound_fraction: 0.75,
            seed: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ImageConfig {
    pub character_right: Option<String>,
    pub character_left: Option<String>,
    pub platform: Option<String>,
}

impl ImageConfig {
    pub fn path_for(&self, image: SpriteImage) -> Option<&str> {
        match image {
            SpriteImage::CharacterRight => self.character_right.as_deref(),
            SpriteImage::CharacterLeft => self.character_left.as_deref(),
            SpriteImage::Platform => self.platform.as_deref(),
        }
    }
}

pub struct ConfigWatcher {
    path: PathBuf,
    last_seen_modified: Option<SystemTime>,
}

impl ConfigWatcher {
    pub fn new(path: PathBuf) -> Self {
        let last_seen_modified = modified_time(&path);
        Self {
            path,
            last_seen_modified,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn should_reload(&mut self) -> bool {
        let current = modified_time(&self.path);
        match (self.last_seen_modified, current) {
            (Some(old), Some(now)) if now > old => {
                self.last_seen_modified = Some(now);
                true
            }
            (None, Some(now)) => {
                self.last_seen_modified = Some(now);
                true
            }
            _ => false,
        }
    }
}

pub fn load_config_from_path(path: &Path) -> Result<GameConfig, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
    let config: GameConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Load the config, falling back to defaults when the file is absent or bad.
pub fn load_config_or_default(path: &Path) -> GameConfig {
    if !path.exists() {
        log::warn!(
            "Config '{}' not found, using built-in tuning.",
            path.display()
        );
        return GameConfig::default();
    }
    match load_config_from_path(path) {
        Ok(config) => config,
        Err(err) => {
            log::error!("{err}. Using built-in tuning.");
            GameConfig::default()
        }
    }
}

/// Smallest sub-step accepted; bounds the sub-steps run per capped frame.
pub const MIN_SUBSTEP_DT: f64 = 0.001;

/// Highest platform gap a single bounce can clear: the apex of the launch
/// arc, `launch² / (2 · gravity)`, plus the overlap that still counts as a
/// landing.
pub fn jump_reach(config: &GameConfig) -> f32 {
    let launch = config.physics.launch_velocity;
    let apex = launch * launch / (2.0 * config.physics.gravity);
    apex + config.character.height + config.level.platform_height
}

pub fn validate_config(config: &GameConfig) -> Result<(), String> {
    let positive = [
        ("board.width", config.board.width),
        ("board.height", config.board.height),
        ("character.width", config.character.width),
        ("character.height", config.character.height),
        ("level.platform_width", config.level.platform_width),
        ("level.platform_height", config.level.platform_height),
        ("level.base_gap", config.level.base_gap),
        ("physics.gravity", config.physics.gravity),
        ("physics.terminal_velocity", config.physics.terminal_velocity),
    ];
    for (name, value) in positive {
        if !value.is_finite() || value <= 0.0 {
            return Err(format!(
                "Config validation failed: {name} must be > 0 (got {value})"
            ));
        }
    }
    let launch = config.physics.launch_velocity;
    if !launch.is_finite() || launch >= 0.0 {
        return Err("Config validation failed: physics.launch_velocity must be negative".to_string());
    }
    let (frame_dt, substep_dt) = (config.physics.max_frame_dt, config.physics.max_substep_dt);
    if !frame_dt.is_finite() || frame_dt <= 0.0 {
        return Err(format!(
            "Config validation failed: physics.max_frame_dt must be > 0 (got {frame_dt})"
        ));
    }
    if !substep_dt.is_finite() || substep_dt < MIN_SUBSTEP_DT {
        return Err(format!(
            "Config validation failed: physics.max_substep_dt must be >= {MIN_SUBSTEP_DT} (got {substep_dt})"
        ));
    }
    if substep_dt > frame_dt {
        return Err(
            "Config validation failed: physics.max_substep_dt exceeds physics.max_frame_dt"
                .to_string(),
        );
    }
    let fraction = config.level.bound_fraction;
    if fraction <= 0.0 || fraction > 1.0 || fraction.is_nan() {
        return Err(format!(
            "Config validation failed: level.bound_fraction must be in (0, 1] (got {fraction})"
        ));
    }
    let factor = config.level.gap_score_factor;
    if !factor.is_finite() || factor < 0.0 {
        return Err("Config validation failed: level.gap_score_factor must be >= 0".to_string());
    }
    let reach = jump_reach(config);
    if config.level.base_gap > reach {
        return Err(format!(
            "Config validation failed: level.base_gap {} is out of jump reach ({reach:.1})",
            config.level.base_gap
        ));
    }
    if config.level.platform_width > config.board.width {
        return Err("Config validation failed: platforms wider than the board".to_string());
    }
    if !(0.0..config.board.height).contains(&config.board.camera_threshold) {
        return Err("Config validation failed: camera_threshold outside the board".to_string());
    }
    Ok(())
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok()?.modified().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "sky_config_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn empty_object_yields_defaults() {
        let path = temp_file_path("empty");
        fs::write(&path, "{}").expect("write temp file");
        let config = load_config_from_path(&path).expect("empty config is valid");
        assert_eq!(config.board.width, 360.0);
        assert_eq!(config.level.extra_platforms, 6);
        assert_eq!(config.tiers.len(), 5);
        assert_eq!(config.controls.move_speed, 4.0);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let path = temp_file_path("partial");
        fs::write(
            &path,
            r#"{
              "physics": { "gravity": 0.05 },
              "level": { "seed": 42 },
              "images": { "platform": "assets/textures/platform.png" }
            }"#,
        )
        .expect("write temp file");
        let config = load_config_from_path(&path).expect("partial config is valid");
        assert_eq!(config.physics.gravity, 0.05);
        assert_eq!(config.physics.launch_velocity, -2.5);
        assert_eq!(config.level.seed, Some(42));
        assert_eq!(
            config.images.platform.as_deref(),
            Some("assets/textures/platform.png")
        );
        assert!(config.images.character_left.is_none());
        assert_eq!(
            config.images.path_for(SpriteImage::Platform),
            Some("assets/textures/platform.png")
        );
        assert_eq!(config.images.path_for(SpriteImage::CharacterRight), None);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_positive_launch_velocity() {
        let path = temp_file_path("launch");
        fs::write(&path, r#"{ "physics": { "launch_velocity": 2.5 } }"#).expect("write");
        let err = load_config_from_path(&path).expect_err("upward launch required");
        assert!(err.contains("launch_velocity"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_bad_bound_fraction() {
        let mut config = GameConfig::default();
        config.level.bound_fraction = 1.5;
        let err = validate_config(&config).expect_err("fraction > 1 should fail");
        assert!(err.contains("bound_fraction"));
    }

    #[test]
    fn rejects_negative_gap_factor() {
        let mut config = GameConfig::default();
        config.level.gap_score_factor = -0.1;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn default_gap_is_within_jump_reach() {
        let config = GameConfig::default();
        let reach = jump_reach(&config);
        assert!((reach - (2.5 * 2.5 / 0.06 + 46.0 + 18.0)).abs() < 1e-3);
        assert!(config.level.base_gap < reach);
    }

    #[test]
    fn rejects_unreachable_base_gap() {
        let mut config = GameConfig::default();
        config.level.base_gap = 400.0;
        let err = validate_config(&config).expect_err("gap beyond the jump arc");
        assert!(err.contains("out of jump reach"));

        // Weaker gravity raises the apex enough to clear the same gap.
        config.physics.gravity = 0.005;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_zero_gravity() {
        let mut config = GameConfig::default();
        config.physics.gravity = 0.0;
        let err = validate_config(&config).expect_err("gravity must pull down");
        assert!(err.contains("physics.gravity"));
    }

    #[test]
    fn rejects_non_finite_frame_deltas() {
        let mut config = GameConfig::default();
        config.physics.max_frame_dt = f64::NAN;
        let err = validate_config(&config).expect_err("NaN frame cap");
        assert!(err.contains("max_frame_dt"));

        let mut config = GameConfig::default();
        config.physics.max_substep_dt = f64::INFINITY;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_tiny_substep() {
        let mut config = GameConfig::default();
        config.physics.max_substep_dt = 1e-9;
        let err = validate_config(&config).expect_err("sub-step below 1 ms");
        assert!(err.contains("max_substep_dt"));

        config.physics.max_substep_dt = MIN_SUBSTEP_DT;
        assert!(validate_config(&config).is_ok());
        let (steps, _) = sky_core::time::substeps(config.physics.max_frame_dt, MIN_SUBSTEP_DT);
        assert!(steps <= 251);
    }

    #[test]
    fn rejects_substep_longer_than_frame_cap() {
        let mut config = GameConfig::default();
        config.physics.max_frame_dt = 0.02;
        config.physics.max_substep_dt = 0.05;
        let err = validate_config(&config).expect_err("sub-step above frame cap");
        assert!(err.contains("exceeds"));
    }

    #[test]
    fn image_sets_compare_by_path() {
        let shipped = GameConfig::default().images;
        let mut edited = shipped.clone();
        assert_eq!(shipped, edited);
        edited.platform = Some("assets/textures/cloud.png".to_string());
        assert_ne!(shipped, edited);
    }

    #[test]
    fn rejects_bad_tier_table() {
        let path = temp_file_path("tiers");
        fs::write(&path, r#"{ "tiers": [ { "score": 5 } ] }"#).expect("write");
        let err = load_config_from_path(&path).expect_err("tier table must start at 0");
        assert!(err.contains("first threshold must be 0"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/config/sky_jump.json");
        let config = load_config_from_path(&path).expect("shipped config is valid");
        let defaults = GameConfig::default();
        assert_eq!(config.board.width, defaults.board.width);
        assert_eq!(config.physics.launch_velocity, defaults.physics.launch_velocity);
        assert_eq!(config.level.base_gap, defaults.level.base_gap);
        assert_eq!(config.tiers.len(), defaults.tiers.len());
        assert!(config.level.seed.is_none());
        assert!(config.images.path_for(SpriteImage::CharacterLeft).is_some());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = temp_file_path("missing");
        let _ = fs::remove_file(&path);
        let config = load_config_or_default(&path);
        assert_eq!(config.board.height, 576.0);
    }

    #[test]
    fn watcher_detects_newly_created_file() {
        let path = temp_file_path("watcher_create");
        let _ = fs::remove_file(&path);

        let mut watcher = ConfigWatcher::new(path.clone());
        assert!(!watcher.should_reload(), "missing file should not reload");

        fs::write(&path, "{}").expect("write temp file");
        assert!(
            watcher.should_reload(),
            "creating file should trigger reload once"
        );
        assert!(
            !watcher.should_reload(),
            "without changes, second poll should not reload"
        );

        let _ = fs::remove_file(path);
    }
}
