//! Run state machine tying the simulation pieces together.
//!
//! A `GameSession` owns one run: the character, the platform window, the
//! scroll camera and the progression counters. The host calls `tick` once per
//! display frame with the elapsed time and a `FrameInput` snapshot, then asks
//! for a `DrawList` to render.

use std::collections::VecDeque;

use sky_core::control::FrameInput;
use sky_core::time::substeps;

use crate::camera::ScrollCamera;
use crate::character::{Character, Facing, StepInput};
use crate::collision::resolve_landing;
use crate::config::GameConfig;
use crate::draw::{DrawList, HudState, SpriteDraw, SpriteImage};
use crate::level::{LevelGenerator, Platform};
use crate::progression::Progression;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Playing,
    GameOver,
}

pub type ScoreCallback = Box<dyn FnMut(u32)>;

/// Host callbacks. Both receive the current score.
#[derive(Default)]
pub struct GameHooks {
    /// Called on every scoring event, and every frame while the run is over.
    pub on_score_update: Option<ScoreCallback>,
    /// Called once per run, on the frame the run ends.
    pub on_game_end: Option<ScoreCallback>,
}

pub struct GameSession {
    config: GameConfig,
    pending_config: Option<GameConfig>,
    character: Character,
    level: LevelGenerator,
    camera: ScrollCamera,
    progression: Progression,
    run_state: RunState,
    end_notified: bool,
    run_number: u64,
    hooks: GameHooks,
}

impl GameSession {
    pub fn new(config: GameConfig, seed: u64, hooks: GameHooks) -> Self {
        let character = Character::spawn(
            &config.board,
            &config.character,
            config.physics.launch_velocity,
        );
        let level = LevelGenerator::new(config.level, &config.board, seed);
        let camera = ScrollCamera::new(config.board.camera_threshold);
        let progression = Progression::new(config.tiers.clone(), config.physics.tier_step);
        log::info!(
            "New session: board {}x{}, {} platforms, seed {}",
            config.board.width,
            config.board.height,
            level.platforms().len(),
            seed
        );
        Self {
            config,
            pending_config: None,
            character,
            level,
            camera,
            progression,
            run_state: RunState::Playing,
            end_notified: false,
            run_number: 1,
            hooks,
        }
    }

    /// Stage a new configuration. It is applied when the next run starts so a
    /// run in progress keeps consistent tuning.
    pub fn queue_config(&mut self, config: GameConfig) {
        log::info!("Config change queued for next run");
        self.pending_config = Some(config);
    }

    /// Advance the session by `dt` seconds.
    pub fn tick(&mut self, dt: f64, input: FrameInput) -> RunState {
        if self.run_state == RunState::GameOver {
            if input.restart {
                self.reset();
                return self.run_state;
            }
            self.notify_game_over();
            return self.run_state;
        }

        let capped = if dt.is_finite() {
            dt.min(self.config.physics.max_frame_dt)
        } else {
            0.0
        };
        let (count, step_dt) = substeps(capped, self.config.physics.max_substep_dt);
        for _ in 0..count {
            self.step(step_dt as f32, input.control_x);
            if self.run_state == RunState::GameOver {
                break;
            }
        }

        if self.run_state == RunState::GameOver {
            self.notify_game_over();
        }
        self.run_state
    }

    fn step(&mut self, dt: f32, control_x: f32) {
        let multiplier = self.progression.multiplier();
        self.character.step(
            StepInput {
                control_x,
                tier_multiplier: multiplier,
            },
            dt,
            &self.config.physics,
            self.config.board.width,
        );

        let landing = resolve_landing(
            &mut self.character,
            self.level.platforms(),
            self.config.physics.launch_velocity,
        );
        if let Some(landing) = landing {
            log::trace!("Landed on platform #{}", landing.platform_index);
            if self.progression.credit_platform(landing.platform_id) {
                let score = self.progression.score();
                if let Some(cb) = self.hooks.on_score_update.as_mut() {
                    cb(score);
                }
            }
        }

        self.level.recycle(
            self.camera.camera_y,
            self.progression.score(),
            self.progression.multiplier(),
        );
        self.camera.follow(self.character.world_y);

        if self.character.world_y > self.camera.trailing_edge(self.config.board.height) {
            self.run_state = RunState::GameOver;
            log::info!(
                "Game over: score {}, {}",
                self.progression.score(),
                self.progression.table().label(self.progression.tier())
            );
        }
    }

    fn notify_game_over(&mut self) {
        let score = self.progression.score();
        if let Some(cb) = self.hooks.on_score_update.as_mut() {
            cb(score);
        }
        if !self.end_notified {
            self.end_notified = true;
            if let Some(cb) = self.hooks.on_game_end.as_mut() {
                cb(score);
            }
        }
    }

    /// Start a fresh run, applying any queued configuration first.
    pub fn reset(&mut self) {
        if let Some(config) = self.pending_config.take() {
            self.level.reconfigure(config.level, &config.board);
            self.camera = ScrollCamera::new(config.board.camera_threshold);
            self.config = config;
            log::info!("Applied queued config");
        }
        self.character = Character::spawn(
            &self.config.board,
            &self.config.character,
            self.config.physics.launch_velocity,
        );
        self.level.reset();
        self.camera.reset();
        self.progression
            .reset(self.config.tiers.clone(), self.config.physics.tier_step);
        self.run_state = RunState::Playing;
        self.end_notified = false;
        self.run_number += 1;
        log::info!("Run {} started", self.run_number);
    }

    /// Counts runs from 1. Hosts watch it to pick up per-run settings from
    /// `config()` once a queued config has been applied.
    pub fn run_number(&self) -> u64 {
        self.run_number
    }

    /// Describe the current frame in view space.
    pub fn draw_list(&self) -> DrawList {
        let board = &self.config.board;
        let camera_y = self.camera.camera_y;
        let mut sprites = Vec::with_capacity(self.level.platforms().len() + 2);

        for platform in self.level.platforms() {
            let y = platform.view_y(camera_y);
            if y < -platform.height || y > board.height {
                continue;
            }
            sprites.push(SpriteDraw {
                image: SpriteImage::Platform,
                x: platform.x,
                y,
                w: platform.width,
                h: platform.height,
            });
        }

        let c = &self.character;
        let image = match c.facing {
            Facing::Right => SpriteImage::CharacterRight,
            Facing::Left => SpriteImage::CharacterLeft,
        };
        let y = c.view_y(camera_y);
        sprites.push(SpriteDraw {
            image,
            x: c.x,
            y,
            w: c.width,
            h: c.height,
        });
        // Straddling the right edge: show the part that wrapped to the left.
        if c.x + c.width > board.width {
            sprites.push(SpriteDraw {
                image,
                x: c.x - board.width,
                y,
                w: c.width,
                h: c.height,
            });
        }

        let tier = self.progression.tier();
        let table = self.progression.table();
        DrawList {
            background: table.background(tier),
            sprites,
            hud: HudState {
                score: self.progression.score(),
                max_score: self.progression.max_score(),
                tier,
                tier_label: table.label(tier),
                game_over: self.run_state == RunState::GameOver,
            },
        }
    }

    pub fn camera_y(&self) -> f32 {
        self.camera.camera_y
    }

    pub fn platforms(&self) -> &VecDeque<Platform> {
        self.level.platforms()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }
}

#[cfg(test)]
impl GameSession {
    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn score(&self) -> u32 {
        self.progression.score()
    }

    pub fn max_score(&self) -> u32 {
        self.progression.max_score()
    }

    pub fn tier(&self) -> usize {
        self.progression.tier()
    }

    pub fn character(&self) -> &Character {
        &self.character
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const FRAME: f64 = 1.0 / 60.0;

    fn idle() -> FrameInput {
        FrameInput {
            control_x: 0.0,
            restart: false,
        }
    }

    fn restart() -> FrameInput {
        FrameInput {
            control_x: 0.0,
            restart: true,
        }
    }

    type Calls = Rc<RefCell<Vec<u32>>>;

    fn recording_hooks() -> (GameHooks, Calls, Calls) {
        let updates: Calls = Rc::default();
        let ends: Calls = Rc::default();
        let u = updates.clone();
        let e = ends.clone();
        let hooks = GameHooks {
            on_score_update: Some(Box::new(move |s| u.borrow_mut().push(s))),
            on_game_end: Some(Box::new(move |s| e.borrow_mut().push(s))),
        };
        (hooks, updates, ends)
    }

    /// Single platform at world y 550, centred.
    fn lone_platform_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.level.start_platform_offset = 26.0;
        config.level.extra_platforms = 0;
        config
    }

    /// Move the character off every platform so it falls out of view.
    fn drop_off_board(session: &mut GameSession) {
        session.character.x = 0.0;
        session.character.velocity_y = 1.0;
    }

    #[test]
    fn landing_on_platform_below_scores_and_relaunches() {
        let (hooks, updates, _) = recording_hooks();
        let mut session = GameSession::new(lone_platform_config(), 1, hooks);
        assert_eq!(session.platforms()[0].world_y, 550.0);
        session.character.world_y = 500.0;
        session.character.velocity_y = 5.0;

        session.tick(FRAME, idle());

        assert_eq!(session.score(), 1);
        assert_eq!(session.character().velocity_y, -2.5);
        assert_eq!(session.character().world_y, 550.0 - 46.0);
        assert_eq!(*updates.borrow(), vec![1]);
    }

    #[test]
    fn zero_dt_is_a_no_op() {
        let mut session = GameSession::new(GameConfig::default(), 1, GameHooks::default());
        let before = *session.character();
        session.tick(0.0, idle());
        session.tick(0.0, idle());
        session.tick(f64::NAN, idle());
        let after = *session.character();
        assert_eq!(before.x, after.x);
        assert_eq!(before.world_y, after.world_y);
        assert_eq!(before.velocity_y, after.velocity_y);
        assert_eq!(session.run_state(), RunState::Playing);
    }

    #[test]
    fn bouncing_on_one_platform_scores_once() {
        let (hooks, updates, _) = recording_hooks();
        let mut session = GameSession::new(lone_platform_config(), 1, hooks);
        for _ in 0..600 {
            session.tick(FRAME, idle());
        }
        assert_eq!(session.run_state(), RunState::Playing);
        assert_eq!(session.score(), 1);
        assert_eq!(*updates.borrow(), vec![1]);
    }

    #[test]
    fn game_end_fires_once_and_score_updates_every_frame() {
        let (hooks, updates, ends) = recording_hooks();
        let mut session = GameSession::new(lone_platform_config(), 1, hooks);
        drop_off_board(&mut session);

        let mut frames = 0;
        while session.tick(FRAME, idle()) == RunState::Playing {
            frames += 1;
            assert!(frames < 2000, "character never fell out of view");
        }
        assert!(session.character().world_y > session.camera_y() + 576.0);
        assert_eq!(*ends.borrow(), vec![0]);

        for _ in 0..10 {
            assert_eq!(session.tick(FRAME, idle()), RunState::GameOver);
        }
        assert_eq!(ends.borrow().len(), 1);
        // Transition frame plus ten frames while over.
        assert_eq!(updates.borrow().len(), 11);
        assert!(updates.borrow().iter().all(|&s| s == 0));
    }

    #[test]
    fn game_over_freezes_the_simulation() {
        let mut session = GameSession::new(lone_platform_config(), 1, GameHooks::default());
        drop_off_board(&mut session);
        while session.tick(FRAME, idle()) == RunState::Playing {}
        let y = session.character().world_y;
        session.tick(FRAME, idle());
        assert_eq!(session.character().world_y, y);
    }

    #[test]
    fn restart_while_playing_is_ignored() {
        let mut session = GameSession::new(GameConfig::default(), 1, GameHooks::default());
        for _ in 0..30 {
            session.tick(FRAME, idle());
        }
        let y = session.character().world_y;
        session.tick(0.0, restart());
        assert_eq!(session.run_state(), RunState::Playing);
        assert_eq!(session.character().world_y, y);
        assert_eq!(session.run_number(), 1);
    }

    #[test]
    fn restart_after_game_over_reinitialises_the_run() {
        let (hooks, _, ends) = recording_hooks();
        let mut session = GameSession::new(GameConfig::default(), 1, hooks);
        for _ in 0..200 {
            session.tick(FRAME, idle());
        }
        drop_off_board(&mut session);
        session.character.world_y = session.camera_y() + 600.0;
        assert_eq!(session.tick(FRAME, idle()), RunState::GameOver);

        assert_eq!(session.tick(FRAME, restart()), RunState::Playing);
        assert_eq!(session.score(), 0);
        assert_eq!(session.tier(), 0);
        assert_eq!(session.camera_y(), 0.0);
        assert_eq!(session.character().world_y, 576.0 * 7.0 / 8.0 - 46.0);
        assert_eq!(session.character().velocity_y, -2.5);
        assert_eq!(session.platforms().len(), 7);
        assert_eq!(session.platforms()[0].world_y, 526.0);

        // The next run gets its own end notification.
        drop_off_board(&mut session);
        session.character.world_y = 600.0;
        session.tick(FRAME, idle());
        assert_eq!(ends.borrow().len(), 2);
    }

    #[test]
    fn queued_config_applies_on_restart() {
        let mut session = GameSession::new(GameConfig::default(), 1, GameHooks::default());
        let mut queued = lone_platform_config();
        queued.controls.move_speed = 6.0;
        queued.physics.max_frame_dt = 0.1;
        session.queue_config(queued);
        assert_eq!(session.platforms().len(), 7);
        assert_eq!(session.run_number(), 1);

        // The running run keeps its tuning until it is over.
        session.character.world_y = 1000.0;
        session.tick(FRAME, idle());
        assert_eq!(session.config().controls.move_speed, 4.0);
        assert_eq!(session.config().physics.max_frame_dt, 0.25);

        session.tick(FRAME, restart());
        assert_eq!(session.run_number(), 2);
        assert_eq!(session.platforms().len(), 1);
        assert_eq!(session.platforms()[0].world_y, 550.0);
        assert_eq!(session.config().controls.move_speed, 6.0);
        assert_eq!(session.config().physics.max_frame_dt, 0.1);
    }

    #[test]
    fn long_frame_still_lands() {
        let mut session = GameSession::new(lone_platform_config(), 1, GameHooks::default());
        session.character.world_y = 500.0;
        session.character.velocity_y = 5.0;
        // A quarter second at 5 px/frame would be 75 px in one jump; substeps keep
        // it from passing through the 18 px platform.
        session.tick(0.25, idle());
        assert_eq!(session.score(), 1);
        assert_eq!(session.run_state(), RunState::Playing);
    }

    #[test]
    fn same_seed_same_run() {
        let run = |seed: u64| {
            let mut session = GameSession::new(GameConfig::default(), seed, GameHooks::default());
            let mut trace = Vec::new();
            for i in 0..900 {
                let control_x = if (i / 90) % 2 == 0 { 2.0 } else { -2.0 };
                session.tick(
                    FRAME,
                    FrameInput {
                        control_x,
                        restart: false,
                    },
                );
                trace.push((session.character().x, session.character().world_y));
            }
            (trace, session.score())
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn chasing_bot_keeps_invariants() {
        let mut session = GameSession::new(GameConfig::default(), 7, GameHooks::default());
        let mut last_camera = session.camera_y();
        let mut last_tier = session.tier();
        for _ in 0..5000 {
            // Steer toward the nearest platform below the character.
            let c = *session.character();
            let target = session
                .platforms()
                .iter()
                .filter(|p| p.world_y > c.world_y + c.height)
                .min_by(|a, b| a.world_y.total_cmp(&b.world_y))
                .map(|p| p.x + p.width / 2.0);
            let control_x = match target {
                Some(tx) if tx > c.x + c.width / 2.0 + 2.0 => 4.0,
                Some(tx) if tx < c.x + c.width / 2.0 - 2.0 => -4.0,
                _ => 0.0,
            };
            let state = session.tick(
                FRAME,
                FrameInput {
                    control_x,
                    restart: false,
                },
            );

            assert!(session.camera_y() <= last_camera);
            assert!(session.tier() >= last_tier);
            assert!(session.max_score() >= session.score());
            last_camera = session.camera_y();
            last_tier = session.tier();

            if state == RunState::GameOver {
                break;
            }
            let h = 576.0;
            let visible = session.platforms().iter().any(|p| {
                let y = p.view_y(session.camera_y());
                y >= -p.height && y <= h
            });
            assert!(visible, "no platform in view");
        }
        assert!(session.score() > 0);
    }

    #[test]
    fn draw_list_reflects_state() {
        let mut session = GameSession::new(GameConfig::default(), 1, GameHooks::default());
        let list = session.draw_list();
        assert_eq!(list.hud.score, 0);
        assert!(!list.hud.game_over);
        assert_eq!(list.hud.tier_label, "Tier 0 (sky)");
        let last = list.sprites.last().expect("character sprite");
        assert_eq!(last.image, SpriteImage::CharacterRight);
        assert!(list
            .sprites
            .iter()
            .filter(|s| s.image == SpriteImage::Platform)
            .all(|s| s.y >= -18.0 && s.y <= 576.0));

        session.character.facing = Facing::Left;
        session.character.x = 340.0;
        let list = session.draw_list();
        let characters: Vec<_> = list
            .sprites
            .iter()
            .filter(|s| s.image == SpriteImage::CharacterLeft)
            .collect();
        assert_eq!(characters.len(), 2);
        assert_eq!(characters[1].x, 340.0 - 360.0);
    }
}
