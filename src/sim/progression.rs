//! Difficulty tables, scoring, orb economy, and the roguelite ramp
//!
//! Everything here is a pure function of its inputs (plus an explicit RNG),
//! so the tick loop and the tests share the same arithmetic.

use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::GameError;

/// Difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
    Extreme,
}

/// Per-tier tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyParams {
    /// Block fall speed (px per tick)
    pub block_speed: f32,
    /// Share of spawned blocks that get more than 1 HP
    pub high_hp_ratio: f32,
    /// Orb balance cap
    pub max_orbs: u32,
    /// Orb balance at session start
    pub initial_orbs: u32,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Normal,
        Difficulty::Hard,
        Difficulty::Extreme,
    ];

    pub fn params(self) -> DifficultyParams {
        match self {
            Difficulty::Easy => DifficultyParams {
                block_speed: 0.05,
                high_hp_ratio: 0.1,
                max_orbs: 200,
                initial_orbs: 100,
            },
            Difficulty::Normal => DifficultyParams {
                block_speed: 0.06,
                high_hp_ratio: 0.2,
                max_orbs: 200,
                initial_orbs: 70,
            },
            Difficulty::Hard => DifficultyParams {
                block_speed: 0.07,
                high_hp_ratio: 0.3,
                max_orbs: 200,
                initial_orbs: 50,
            },
            Difficulty::Extreme => DifficultyParams {
                block_speed: 0.08,
                high_hp_ratio: 0.4,
                max_orbs: 200,
                initial_orbs: 30,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
            Difficulty::Extreme => "extreme",
        }
    }

    /// Tier for a 0-based level, saturating at Extreme
    pub fn from_level(level: u32) -> Self {
        match level {
            0 => Difficulty::Easy,
            1 => Difficulty::Normal,
            2 => Difficulty::Hard,
            _ => Difficulty::Extreme,
        }
    }
}

impl FromStr for Difficulty {
    type Err = GameError;

    /// Case-insensitive tier id
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            "extreme" => Ok(Difficulty::Extreme),
            _ => Err(GameError::UnknownDifficulty(s.to_string())),
        }
    }
}

// --- Scoring / combo ---

/// Combo bonus percentage: +2% per 10 combo, +5% more per 100 combo
pub fn combo_bonus(combo: u32) -> u32 {
    (combo / 10) * 2 + (combo / 100) * 5
}

/// Score for destroying a block at the given bonus percentage
///
/// Integer form of `floor(max_hp * 100 * (1 + bonus / 100))`.
pub fn block_score(max_hp: u32, bonus_percent: u32) -> u64 {
    let base = max_hp as u64 * 100;
    base * (100 + bonus_percent as u64) / 100
}

// --- Orb economy ---

/// Chance that a destroyed block drops an orb
pub fn orb_drop_rate(ability_bonus: f32) -> f32 {
    ORB_BASE_DROP_RATE + ability_bonus
}

/// Add orbs without exceeding the cap; excess is discarded
pub fn add_orbs_capped(current: u32, amount: u32, max_orbs: u32) -> u32 {
    current.saturating_add(amount).min(max_orbs)
}

// --- Block spawning ---

/// Ticks between new rows so that row spacing is constant at any fall speed
pub fn spawn_interval(block_speed: f32) -> u32 {
    let row_distance = (BLOCK_HEIGHT + BLOCK_PADDING) as f64;
    (row_distance / block_speed as f64).floor().max(1.0) as u32
}

/// Base HP distribution: higher tiers are rarer
pub fn base_hp_from_roll(roll: f32, high_hp_ratio: f32) -> u32 {
    if roll < high_hp_ratio * 0.2 {
        5
    } else if roll < high_hp_ratio * 0.4 {
        4
    } else if roll < high_hp_ratio * 0.7 {
        3
    } else if roll < high_hp_ratio {
        2
    } else {
        1
    }
}

/// Spawn chance of an HP-20 block at a given multiplier
pub fn obsidian_chance(multiplier: f32) -> f32 {
    if multiplier < 5.0 {
        return 0.0;
    }
    ((multiplier - 5.0) / (10.0 - 5.0) * 0.20).min(0.20)
}

/// Spawn chance of an HP-10 block at a given multiplier
pub fn diamond_chance(multiplier: f32) -> f32 {
    if multiplier < 2.0 {
        return 0.0;
    }
    ((multiplier - 2.0) / (10.0 - 2.0) * 0.20).min(0.20)
}

/// Multiplier at which every ordinary block is HP 5
const ALL_RED_MULTIPLIER: f32 = 30.0;

/// Draw HP for one newly spawned block
///
/// `multiplier` is the roguelite extreme multiplier; pass 1.0 outside roguelite.
pub fn roll_block_hp<R: Rng>(rng: &mut R, high_hp_ratio: f32, multiplier: f32) -> u32 {
    let roll: f32 = rng.random();

    if multiplier <= 1.0 {
        return base_hp_from_roll(roll, high_hp_ratio);
    }

    if multiplier >= 5.0 && rng.random::<f32>() < obsidian_chance(multiplier) {
        return 20;
    }
    if multiplier >= 2.0 && rng.random::<f32>() < diamond_chance(multiplier) {
        return 10;
    }

    let red_ratio = ((multiplier - 1.0) / (ALL_RED_MULTIPLIER - 1.0)).min(1.0);
    if roll < red_ratio {
        5
    } else {
        let adjusted = (roll - red_ratio) / (1.0 - red_ratio);
        base_hp_from_roll(adjusted, high_hp_ratio)
    }
}

// --- Roguelite ramp ---

/// Seconds per tier during the opening ramp
const SECONDS_PER_TIER: u64 = 60;
/// Multiplier starts climbing from this many seconds
const MULTIPLIER_BASE_SECONDS: u64 = 180;
/// Seconds per +0.1 multiplier step
const MULTIPLIER_STEP_SECONDS: u64 = 5;
/// Multiplier ceiling, in tenths
const MULTIPLIER_CAP_TENTHS: u64 = 300;

/// Difficulty tier and extreme multiplier after `elapsed_ticks` of play
pub fn roguelite_ramp(elapsed_ticks: u64) -> (Difficulty, f32) {
    let seconds = elapsed_ticks / TICKS_PER_SECOND as u64;
    let minutes = seconds / SECONDS_PER_TIER;

    if minutes < 4 {
        return (Difficulty::from_level(minutes as u32), 1.0);
    }

    let increments = (seconds - MULTIPLIER_BASE_SECONDS) / MULTIPLIER_STEP_SECONDS;
    let tenths = (10 + increments).min(MULTIPLIER_CAP_TENTHS);
    (Difficulty::Extreme, tenths as f32 / 10.0)
}

// --- Draft thresholds ---

/// Fixed opening thresholds
pub const DRAFT_THRESHOLDS: [u64; 8] = [2000, 4000, 6000, 8000, 10000, 14000, 18000, 25000];

/// Score required to trigger draft number `index` (0-based)
pub fn draft_threshold(index: u32) -> u64 {
    let index = index as usize;
    if index < DRAFT_THRESHOLDS.len() {
        return DRAFT_THRESHOLDS[index];
    }

    let base = DRAFT_THRESHOLDS[DRAFT_THRESHOLDS.len() - 1];
    let extra = (index - DRAFT_THRESHOLDS.len()) as u64;
    let steps_to_100k = (100_000 - base).div_ceil(10_000);
    let steps_100k_to_200k = 4;

    if extra < steps_to_100k {
        base + (extra + 1) * 10_000
    } else if extra < steps_to_100k + steps_100k_to_200k {
        100_000 + (extra - steps_to_100k + 1) * 25_000
    } else {
        200_000 + (extra - steps_to_100k - steps_100k_to_200k + 1) * 50_000
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_combo_bonus() {
        assert_eq!(combo_bonus(0), 0);
        assert_eq!(combo_bonus(9), 0);
        assert_eq!(combo_bonus(10), 2);
        assert_eq!(combo_bonus(25), 4);
        assert_eq!(combo_bonus(100), 25);
    }

    #[test]
    fn test_block_score() {
        assert_eq!(block_score(3, 10), 330);
        assert_eq!(block_score(1, 0), 100);
        assert_eq!(block_score(5, 2), 510);
        assert_eq!(block_score(20, 25), 2500);
    }

    #[test]
    fn test_orb_cap() {
        assert_eq!(add_orbs_capped(195, 10, 200), 200);
        assert_eq!(add_orbs_capped(100, 10, 200), 110);
        assert_eq!(add_orbs_capped(200, 10, 200), 200);
    }

    #[test]
    fn test_spawn_interval_keeps_row_spacing() {
        for difficulty in Difficulty::ALL {
            let speed = difficulty.params().block_speed;
            let interval = spawn_interval(speed);
            let travelled = interval as f32 * speed;
            assert!((travelled - (BLOCK_HEIGHT + BLOCK_PADDING)).abs() < speed + 0.01);
        }
        assert_eq!(spawn_interval(1.0), 34);
        assert_eq!(spawn_interval(0.5), 68);
    }

    #[test]
    fn test_base_hp_distribution() {
        assert_eq!(base_hp_from_roll(0.0, 0.4), 5);
        assert_eq!(base_hp_from_roll(0.1, 0.4), 4);
        assert_eq!(base_hp_from_roll(0.2, 0.4), 3);
        assert_eq!(base_hp_from_roll(0.3, 0.4), 2);
        assert_eq!(base_hp_from_roll(0.5, 0.4), 1);
    }

    #[test]
    fn test_super_tier_chances() {
        assert_eq!(diamond_chance(1.9), 0.0);
        assert_eq!(diamond_chance(2.0), 0.0);
        assert!((diamond_chance(6.0) - 0.10).abs() < 1e-6);
        assert!((diamond_chance(10.0) - 0.20).abs() < 1e-6);
        assert!((diamond_chance(30.0) - 0.20).abs() < 1e-6);

        assert_eq!(obsidian_chance(4.9), 0.0);
        assert!((obsidian_chance(7.5) - 0.10).abs() < 1e-6);
        assert!((obsidian_chance(10.0) - 0.20).abs() < 1e-6);
    }

    #[test]
    fn test_roll_block_hp_ranges() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..500 {
            let hp = roll_block_hp(&mut rng, 0.2, 1.0);
            assert!((1..=5).contains(&hp));
        }
        for _ in 0..500 {
            let hp = roll_block_hp(&mut rng, 0.2, 12.0);
            assert!(matches!(hp, 1..=5 | 10 | 20));
        }
    }

    #[test]
    fn test_roll_block_hp_all_red_at_cap() {
        let mut rng = Pcg32::seed_from_u64(42);
        for _ in 0..200 {
            let hp = roll_block_hp(&mut rng, 0.1, 30.0);
            assert!(matches!(hp, 5 | 10 | 20));
        }
    }

    #[test]
    fn test_roguelite_ramp() {
        let tps = TICKS_PER_SECOND as u64;
        assert_eq!(roguelite_ramp(0), (Difficulty::Easy, 1.0));
        assert_eq!(roguelite_ramp(59 * tps), (Difficulty::Easy, 1.0));
        assert_eq!(roguelite_ramp(60 * tps), (Difficulty::Normal, 1.0));
        assert_eq!(roguelite_ramp(150 * tps), (Difficulty::Hard, 1.0));
        assert_eq!(roguelite_ramp(239 * tps), (Difficulty::Extreme, 1.0));

        // 240s: (240 - 180) / 5 = 12 steps
        let (tier, mult) = roguelite_ramp(240 * tps);
        assert_eq!(tier, Difficulty::Extreme);
        assert!((mult - 2.2).abs() < 1e-6);

        let (_, mult) = roguelite_ramp(244 * tps);
        assert!((mult - 2.2).abs() < 1e-6);
        let (_, mult) = roguelite_ramp(245 * tps);
        assert!((mult - 2.3).abs() < 1e-6);

        let (_, mult) = roguelite_ramp(10_000 * tps);
        assert_eq!(mult, 30.0);
    }

    #[test]
    fn test_draft_thresholds() {
        assert_eq!(draft_threshold(0), 2000);
        assert_eq!(draft_threshold(7), 25000);
        assert_eq!(draft_threshold(8), 35000);
        assert_eq!(draft_threshold(15), 105000);
        assert_eq!(draft_threshold(16), 125000);
        assert_eq!(draft_threshold(19), 200000);
        assert_eq!(draft_threshold(20), 250000);
        assert_eq!(draft_threshold(21), 300000);
    }

    #[test]
    fn test_draft_thresholds_increase() {
        let mut last = 0;
        for i in 0..40 {
            let t = draft_threshold(i);
            assert!(t > last, "threshold {} not increasing", i);
            last = t;
        }
    }

    #[test]
    fn test_difficulty_roundtrip_str() {
        for d in Difficulty::ALL {
            assert_eq!(d.as_str().parse::<Difficulty>().ok(), Some(d));
        }
        assert_eq!("EXTREME".parse::<Difficulty>().ok(), Some(Difficulty::Extreme));
        let err = "nightmare".parse::<Difficulty>().unwrap_err();
        assert!(matches!(err, GameError::UnknownDifficulty(ref id) if id == "nightmare"));
        assert_eq!(err.to_string(), "unknown difficulty 'nightmare'");
        assert_eq!(Difficulty::from_level(9), Difficulty::Extreme);
    }
}
