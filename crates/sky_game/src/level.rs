//! Procedural platform generation.
//!
//! The level is a rolling window of platforms held in a `VecDeque`, oldest
//! (lowest on screen) at the front. Platforms that fall below the camera's
//! trailing edge are dropped from the front and replaced by a new one above
//! the current topmost platform, so the working set stays a fixed size for the
//! whole run.
//!
//! Randomness comes from a seeded `ChaCha8Rng`: two generators built from the
//! same seed produce the same level.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::collision::Rect;
use crate::config::{BoardConfig, LevelConfig};

/// Identity derived from the world-space Y a platform was created at.
///
/// Platforms are always spawned strictly above the previous topmost one, so no
/// two platforms created in one run share an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlatformId(i64);

impl PlatformId {
    pub fn from_world_y(world_y: f32) -> Self {
        // Millipixel resolution; gaps are tens of pixels.
        Self((f64::from(world_y) * 1000.0).round() as i64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Platform {
    pub id: PlatformId,
    pub x: f32,
    pub world_y: f32,
    pub width: f32,
    pub height: f32,
}

impl Platform {
    pub fn new(x: f32, world_y: f32, width: f32, height: f32) -> Self {
        Self {
            id: PlatformId::from_world_y(world_y),
            x,
            world_y,
            width,
            height,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.world_y,
            w: self.width,
            h: self.height,
        }
    }

    pub fn view_y(&self, camera_y: f32) -> f32 {
        self.world_y - camera_y
    }
}

pub struct LevelGenerator {
    config: LevelConfig,
    board_width: f32,
    board_height: f32,
    rng: ChaCha8Rng,
    platforms: VecDeque<Platform>,
}

impl LevelGenerator {
    pub fn new(config: LevelConfig, board: &BoardConfig, seed: u64) -> Self {
        let mut generator = Self {
            config,
            board_width: board.width,
            board_height: board.height,
            rng: ChaCha8Rng::seed_from_u64(seed),
            platforms: VecDeque::with_capacity(config.extra_platforms + 1),
        };
        generator.place_initial();
        generator
    }

    /// Rebuild the starting layout. The random stream continues, so a new run
    /// gets a fresh layout.
    pub fn reset(&mut self) {
        self.place_initial();
    }

    /// Swap in new tuning; takes effect at the next `reset`.
    pub fn reconfigure(&mut self, config: LevelConfig, board: &BoardConfig) {
        self.config = config;
        self.board_width = board.width;
        self.board_height = board.height;
    }

    fn place_initial(&mut self) {
        self.platforms.clear();

        let start_y = self.board_height - self.config.start_platform_offset;
        self.platforms.push_back(Platform::new(
            self.board_width / 2.0 - self.config.platform_width / 2.0,
            start_y,
            self.config.platform_width,
            self.config.platform_height,
        ));

        for i in 0..self.config.extra_platforms {
            let world_y = self.board_height
                - self.config.base_gap * i as f32
                - self.config.first_extra_offset;
            let x = self.random_x();
            self.platforms.push_back(Platform::new(
                x,
                world_y,
                self.config.platform_width,
                self.config.platform_height,
            ));
        }
        log::debug!("Placed {} initial platforms", self.platforms.len());
    }

    /// `baseGap + score * factor * tierMultiplier`.
    pub fn next_gap(&self, score: u32, tier_multiplier: f32) -> f32 {
        self.config.base_gap + score as f32 * self.config.gap_score_factor * tier_multiplier
    }

    fn random_x(&mut self) -> f32 {
        let unit: f32 = self.rng.random();
        (unit * self.board_width * self.config.bound_fraction).floor()
    }

    fn spawn_above_top(&mut self, score: u32, tier_multiplier: f32) -> Platform {
        let gap = self.next_gap(score, tier_multiplier);
        let top_y = self.topmost().map_or(self.board_height, |p| p.world_y);
        let x = self.random_x();
        Platform::new(
            x,
            top_y - gap,
            self.config.platform_width,
            self.config.platform_height,
        )
    }

    /// Drop platforms below the trailing edge (`camera_y + board_height`) and
    /// append one new platform at the leading edge for each. Returns how many
    /// were recycled.
    pub fn recycle(&mut self, camera_y: f32, score: u32, tier_multiplier: f32) -> usize {
        let trailing_edge = camera_y + self.board_height;
        let mut recycled = 0;
        while self
            .platforms
            .front()
            .is_some_and(|p| p.world_y > trailing_edge)
        {
            let new_platform = self.spawn_above_top(score, tier_multiplier);
            if let Some(old) = self.platforms.pop_front() {
                log::trace!(
                    "Recycled platform at y={:.1}, new platform at y={:.1}",
                    old.world_y,
                    new_platform.world_y
                );
            }
            self.platforms.push_back(new_platform);
            recycled += 1;
        }
        recycled
    }

    pub fn platforms(&self) -> &VecDeque<Platform> {
        &self.platforms
    }

    pub fn topmost(&self) -> Option<&Platform> {
        self.platforms.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn generator(seed: u64) -> LevelGenerator {
        LevelGenerator::new(LevelConfig::default(), &BoardConfig::default(), seed)
    }

    #[test]
    fn initial_layout_matches_board() {
        let level = generator(1);
        let platforms = level.platforms();
        assert_eq!(platforms.len(), 7);
        assert_eq!(platforms[0].x, 150.0);
        assert_eq!(platforms[0].world_y, 526.0);
        assert_eq!(platforms[1].world_y, 426.0);
        assert_eq!(platforms[6].world_y, 576.0 - 75.0 * 5.0 - 150.0);
        for p in platforms.iter().skip(1) {
            assert!(p.x >= 0.0 && p.x < 270.0, "x {} out of bounds", p.x);
            assert_eq!(p.x, p.x.floor());
        }
    }

    #[test]
    fn same_seed_is_reproducible() {
        let mut a = generator(99);
        let mut b = generator(99);
        let xs = |l: &LevelGenerator| l.platforms().iter().map(|p| p.x).collect::<Vec<_>>();
        assert_eq!(xs(&a), xs(&b));

        a.recycle(-400.0, 10, 1.0);
        b.recycle(-400.0, 10, 1.0);
        assert_eq!(xs(&a), xs(&b));
    }

    #[test]
    fn different_seeds_differ() {
        let xs = |l: &LevelGenerator| l.platforms().iter().map(|p| p.x).collect::<Vec<_>>();
        assert_ne!(xs(&generator(1)), xs(&generator(2)));
    }

    #[test]
    fn gap_grows_with_score_and_tier() {
        let level = generator(1);
        assert_eq!(level.next_gap(0, 1.0), 75.0);
        assert!((level.next_gap(10, 1.0) - 77.0).abs() < 1e-4);
        assert!((level.next_gap(100, 1.4) - 103.0).abs() < 1e-4);
    }

    #[test]
    fn recycle_keeps_window_size_and_order() {
        let mut level = generator(5);
        let top_before = level.topmost().expect("non-empty").world_y;
        // Camera scrolled up so the start platform (y=526) and first extra (y=426)
        // are both below the trailing edge at -200 + 576 = 376.
        let recycled = level.recycle(-200.0, 0, 1.0);
        assert_eq!(recycled, 2);
        assert_eq!(level.platforms().len(), 7);
        let top_after = level.topmost().expect("non-empty").world_y;
        assert_eq!(top_after, top_before - 150.0);
        let ys: Vec<f32> = level.platforms().iter().map(|p| p.world_y).collect();
        assert!(ys.windows(2).all(|w| w[1] < w[0]), "front must be lowest");
    }

    #[test]
    fn nothing_to_recycle_at_start() {
        let mut level = generator(5);
        assert_eq!(level.recycle(0.0, 0, 1.0), 0);
    }

    #[test]
    fn ids_stay_unique_over_a_long_climb() {
        let mut level = generator(7);
        let mut seen = HashSet::new();
        for p in level.platforms() {
            assert!(seen.insert(p.id));
        }
        let mut camera_y = 0.0;
        for step in 0..500u32 {
            camera_y -= 40.0;
            level.recycle(camera_y, step, 1.0 + (step / 100) as f32 * 0.2);
            for p in level.platforms() {
                seen.insert(p.id);
            }
            let active: HashSet<_> = level.platforms().iter().map(|p| p.id).collect();
            assert_eq!(active.len(), level.platforms().len());
        }
        assert!(seen.len() > 50);
    }

    #[test]
    fn reset_restores_start_platform() {
        let mut level = generator(3);
        level.recycle(-2000.0, 50, 1.2);
        level.reset();
        assert_eq!(level.platforms().len(), 7);
        assert_eq!(level.platforms()[0].world_y, 526.0);
    }
}
