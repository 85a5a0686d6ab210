//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (one tick per frame)
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod draft;
pub mod effects;
pub mod progression;
pub mod schedule;
pub mod skills;
pub mod state;
pub mod tick;

pub use collision::{BlockHit, Rect};
pub use draft::{
    AbilityKind, DraftChoice, HeldSkill, RogueliteState, cancel_swap, choose_draft,
    choose_swap_slot, reroll_draft, skip_draft,
};
pub use effects::{Beam, Effects, Explosion, GravityWell, Shockwave};
pub use progression::Difficulty;
pub use schedule::{DeferredAction, Scheduler};
pub use skills::{SkillEffect, SkillKind, activate_skill, activate_slot, cancel_skill};
pub use state::{
    Ball, Block, CrackLevel, Enhancement, GameEvent, GameMode, GamePhase, GameState, Orb, Paddle,
    PauseReason, Player,
};
pub use tick::{TickInput, tick, trigger_game_over};
