//! Difficulty / background tiers selected by score thresholds.
//!
//! The table is ordered ascending by threshold and always starts at 0, so every
//! score maps to exactly one tier. Tiers only ever move forward within a run
//! because score itself never decreases.

use serde::Deserialize;

/// One entry of the threshold table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TierThreshold {
    pub score: u32,
    #[serde(default)]
    pub name: String,
    /// Linear RGB clear colour drawn behind the board while this tier is active.
    #[serde(default = "default_background")]
    pub background: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<TierThreshold>")]
pub struct TierTable {
    tiers: Vec<TierThreshold>,
}

impl TierTable {
    pub fn new(tiers: Vec<TierThreshold>) -> Result<Self, String> {
        if tiers.is_empty() {
            return Err("Tier table validation failed: table is empty".to_string());
        }
        if tiers[0].score != 0 {
            return Err(format!(
                "Tier table validation failed: first threshold must be 0, got {}",
                tiers[0].score
            ));
        }
        for pair in tiers.windows(2) {
            if pair[1].score <= pair[0].score {
                return Err(format!(
                    "Tier table validation failed: thresholds must ascend ({} then {})",
                    pair[0].score, pair[1].score
                ));
            }
        }
        Ok(Self { tiers })
    }

    /// Highest tier whose threshold is <= `score`, scanning from the top.
    pub fn tier_for_score(&self, score: u32) -> usize {
        self.tiers
            .iter()
            .rposition(|t| score >= t.score)
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn background(&self, tier: usize) -> [f32; 3] {
        self.tiers
            .get(tier)
            .or(self.tiers.last())
            .map_or(default_background(), |t| t.background)
    }

    pub fn label(&self, tier: usize) -> String {
        match self.tiers.get(tier) {
            Some(t) if !t.name.is_empty() => format!("Tier {} ({})", tier, t.name),
            _ => format!("Tier {}", tier),
        }
    }
}

impl TryFrom<Vec<TierThreshold>> for TierTable {
    type Error = String;

    fn try_from(tiers: Vec<TierThreshold>) -> Result<Self, Self::Error> {
        Self::new(tiers)
    }
}

impl Default for TierTable {
    fn default() -> Self {
        let entry = |score: u32, name: &str, background: [f32; 3]| TierThreshold {
            score,
            name: name.to_string(),
            background,
        };
        Self {
            tiers: vec![
                entry(0, "sky", [0.53, 0.81, 0.92]),
                entry(50, "high sky", [0.36, 0.62, 0.88]),
                entry(150, "night", [0.07, 0.09, 0.24]),
                entry(300, "space", [0.03, 0.02, 0.10]),
                entry(450, "deep space", [0.09, 0.02, 0.14]),
            ],
        }
    }
}

/// Gravity / gap scaling for a tier: `1 + tier * step`.
pub fn difficulty_multiplier(tier: usize, step: f32) -> f32 {
    1.0 + tier as f32 * step
}

const fn default_background() -> [f32; 3] {
    [0.53, 0.81, 0.92]
}
