//! Score, max score, tier and the per-run set of credited platforms.

use std::collections::HashSet;

use sky_core::tier::{difficulty_multiplier, TierTable};

use crate::level::PlatformId;

#[derive(Debug, Clone)]
pub struct Progression {
    score: u32,
    max_score: u32,
    tier: usize,
    credited: HashSet<PlatformId>,
    table: TierTable,
    tier_step: f32,
}

impl Progression {
    pub fn new(table: TierTable, tier_step: f32) -> Self {
        Self {
            score: 0,
            max_score: 0,
            tier: 0,
            credited: HashSet::new(),
            table,
            tier_step,
        }
    }

    /// Award one point for `id` unless it was already credited this run.
    /// Returns true when the score changed.
    pub fn credit_platform(&mut self, id: PlatformId) -> bool {
        if !self.credited.insert(id) {
            return false;
        }
        self.score += 1;
        self.max_score = self.max_score.max(self.score);

        let tier = self.table.tier_for_score(self.score);
        if tier > self.tier {
            self.tier = tier;
            log::info!(
                "Score {} reached {} (difficulty x{:.1})",
                self.score,
                self.table.label(tier),
                self.multiplier()
            );
        }
        true
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn max_score(&self) -> u32 {
        self.max_score
    }

    pub fn tier(&self) -> usize {
        self.tier
    }

    pub fn multiplier(&self) -> f32 {
        difficulty_multiplier(self.tier, self.tier_step)
    }

    pub fn table(&self) -> &TierTable {
        &self.table
    }

    #[cfg(test)]
    pub fn is_credited(&self, id: PlatformId) -> bool {
        self.credited.contains(&id)
    }

    /// Start a new run, optionally with a retuned table.
    pub fn reset(&mut self, table: TierTable, tier_step: f32) {
        self.score = 0;
        self.max_score = 0;
        self.tier = 0;
        self.credited.clear();
        self.table = table;
        self.tier_step = tier_step;
    }
}
