//! Roguelite drafts: passive abilities, held skills, and the pick/skip/reroll flow
//!
//! A draft opens when the score crosses the next threshold. The game stays
//! paused until the player picks, skips, or finishes a skill swap. The offered
//! choices are kept on the state so closing and reopening the same draft never
//! changes them; only a reroll clears them.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::progression::{self, Difficulty};
use super::schedule::DeferredAction;
use super::skills::SkillKind;
use super::state::{GameEvent, GamePhase, GameState, PauseReason};
use crate::consts::*;

/// Passive upgrades offered in drafts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AbilityKind {
    OrbAbsorb,
    Heal1,
    Heal2,
    Heal3,
    BarWidth,
    OrbLimit,
    OrbDropRate,
    BallDamage,
}

impl AbilityKind {
    pub const ALL: [AbilityKind; 8] = [
        AbilityKind::OrbAbsorb,
        AbilityKind::Heal1,
        AbilityKind::Heal2,
        AbilityKind::Heal3,
        AbilityKind::BarWidth,
        AbilityKind::OrbLimit,
        AbilityKind::OrbDropRate,
        AbilityKind::BallDamage,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AbilityKind::OrbAbsorb => "Orb Magnet",
            AbilityKind::Heal1 => "Heal (S)",
            AbilityKind::Heal2 => "Heal (M)",
            AbilityKind::Heal3 => "Heal (L)",
            AbilityKind::BarWidth => "Wide Bar",
            AbilityKind::OrbLimit => "Orb Capacity",
            AbilityKind::OrbDropRate => "Orb Luck",
            AbilityKind::BallDamage => "Heavy Ball",
        }
    }

    pub fn max_level(&self) -> u8 {
        match self {
            AbilityKind::Heal1 | AbilityKind::Heal2 | AbilityKind::Heal3 => 1,
            AbilityKind::BallDamage => 3,
            _ => 5,
        }
    }

    /// HP restored on pick, for the instant heals
    pub fn heal_amount(&self) -> Option<i32> {
        match self {
            AbilityKind::Heal1 => Some(3),
            AbilityKind::Heal2 => Some(4),
            AbilityKind::Heal3 => Some(5),
            _ => None,
        }
    }
}

fn level_index(level: u8, len: usize) -> usize {
    (level.max(1) as usize - 1).min(len - 1)
}

/// Orb pull range as a multiple of paddle width
pub fn orb_absorb_factor(level: u8) -> f32 {
    const T: [f32; 5] = [3.0, 3.5, 4.0, 4.5, 6.0];
    T[level_index(level, T.len())]
}

pub fn bar_width_multiplier(level: u8) -> f32 {
    const T: [f32; 5] = [1.2, 1.4, 1.6, 1.8, 2.0];
    T[level_index(level, T.len())]
}

pub fn orb_limit(level: u8) -> u32 {
    const T: [u32; 5] = [250, 300, 350, 400, 500];
    T[level_index(level, T.len())]
}

pub fn orb_drop_bonus(level: u8) -> f32 {
    const T: [f32; 5] = [0.05, 0.10, 0.15, 0.20, 0.25];
    T[level_index(level, T.len())]
}

pub fn ball_damage(level: u8) -> u32 {
    const T: [u32; 3] = [2, 3, 4];
    T[level_index(level, T.len())]
}

/// A skill in one of the three roguelite slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldSkill {
    pub kind: SkillKind,
    pub level: u8,
}

/// One offered draft option, with the level it would upgrade from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftChoice {
    Ability { kind: AbilityKind, current_level: u8 },
    Skill { kind: SkillKind, current_level: u8 },
}

/// Roguelite-only session state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RogueliteState {
    /// Ticks spent running (paused time excluded)
    pub elapsed_ticks: u64,
    pub tier: Difficulty,
    pub extreme_multiplier: f32,
    pub abilities: BTreeMap<AbilityKind, u8>,
    /// At most three, in slot order
    pub skills: Vec<HeldSkill>,
    pub next_draft_index: u32,
    /// A draft is open (or waiting to reopen after a reroll)
    pub selecting: bool,
    /// Choices of the open draft; `None` until generated
    pub choices: Option<Vec<DraftChoice>>,
    /// Skill waiting for a slot to replace
    pub pending_swap: Option<SkillKind>,
}

impl Default for RogueliteState {
    fn default() -> Self {
        Self::new()
    }
}

impl RogueliteState {
    pub fn new() -> Self {
        Self {
            elapsed_ticks: 0,
            tier: Difficulty::Easy,
            extreme_multiplier: 1.0,
            abilities: BTreeMap::new(),
            skills: Vec::new(),
            next_draft_index: 0,
            selecting: false,
            choices: None,
            pending_swap: None,
        }
    }

    pub fn ability_level(&self, kind: AbilityKind) -> u8 {
        self.abilities.get(&kind).copied().unwrap_or(0)
    }

    /// Held level, 0 if not held
    pub fn held_level(&self, kind: SkillKind) -> u8 {
        self.skills
            .iter()
            .find(|s| s.kind == kind)
            .map(|s| s.level)
            .unwrap_or(0)
    }

    pub fn skill_kinds(&self) -> Vec<SkillKind> {
        self.skills.iter().map(|s| s.kind).collect()
    }

    /// Everything not yet at max level, abilities first
    fn available_choices(&self) -> Vec<DraftChoice> {
        let abilities = AbilityKind::ALL.into_iter().filter_map(|kind| {
            let current_level = self.ability_level(kind);
            (current_level < kind.max_level()).then_some(DraftChoice::Ability { kind, current_level })
        });
        let skills = SkillKind::ALL.into_iter().filter_map(|kind| {
            let current_level = self.held_level(kind);
            (current_level < kind.max_level()).then_some(DraftChoice::Skill { kind, current_level })
        });
        abilities.chain(skills).collect()
    }
}

// Ability-derived parameters. Outside roguelite every ability is absent and
// every skill is level 1.
impl GameState {
    fn ability_level(&self, kind: AbilityKind) -> u8 {
        self.roguelite.as_ref().map(|r| r.ability_level(kind)).unwrap_or(0)
    }

    /// Current orb cap
    pub fn max_orbs(&self) -> u32 {
        match self.ability_level(AbilityKind::OrbLimit) {
            0 => self.difficulty.params().max_orbs,
            level => orb_limit(level),
        }
    }

    pub fn orb_drop_bonus(&self) -> f32 {
        match self.ability_level(AbilityKind::OrbDropRate) {
            0 => 0.0,
            level => orb_drop_bonus(level),
        }
    }

    pub fn bar_width_multiplier(&self) -> f32 {
        match self.ability_level(AbilityKind::BarWidth) {
            0 => 1.0,
            level => bar_width_multiplier(level),
        }
    }

    /// Orb pull range factor; 0 disables absorption
    pub fn orb_absorb_factor(&self) -> f32 {
        match self.ability_level(AbilityKind::OrbAbsorb) {
            0 => 0.0,
            level => orb_absorb_factor(level),
        }
    }

    /// Base damage of a normal ball hit
    pub fn ball_damage(&self) -> u32 {
        match self.ability_level(AbilityKind::BallDamage) {
            0 => 1,
            level => ball_damage(level),
        }
    }

    pub fn skill_level(&self, kind: SkillKind) -> u8 {
        match &self.roguelite {
            Some(r) => r.held_level(kind).max(1),
            None => 1,
        }
    }
}

/// Open a draft if the score has reached the next threshold
pub fn check_draft_unlock(state: &mut GameState) -> bool {
    if !state.phase.is_running() {
        return false;
    }
    let Some(r) = &state.roguelite else {
        return false;
    };
    if r.selecting || state.player.score < progression::draft_threshold(r.next_draft_index) {
        return false;
    }

    open_draft(state);
    true
}

/// Pause for the current draft, generating choices only if none are kept
fn open_draft(state: &mut GameState) {
    let can_reroll = state.player.hp > REROLL_HP_COST;
    let Some(r) = state.roguelite.as_mut() else {
        return;
    };

    r.selecting = true;
    let choices = match &r.choices {
        Some(kept) => kept.clone(),
        None => {
            let mut pool = r.available_choices();
            pool.shuffle(&mut state.rng);
            pool.truncate(DRAFT_CHOICE_COUNT);
            r.choices = Some(pool.clone());
            pool
        }
    };

    log::info!(
        "Draft {} opened at score {}: {:?}",
        r.next_draft_index,
        state.player.score,
        choices
    );
    state.phase = GamePhase::Paused(PauseReason::Draft);
    state.emit(GameEvent::DraftOffered { choices, can_reroll });
}

/// Deferred reopen after a reroll; ignored if that draft is no longer open
pub(crate) fn reopen_draft(state: &mut GameState, draft_index: u32) -> bool {
    let still_open = state
        .roguelite
        .as_ref()
        .is_some_and(|r| r.selecting && r.next_draft_index == draft_index && r.pending_swap.is_none());
    if !still_open || state.phase != GamePhase::Paused(PauseReason::Draft) {
        return false;
    }
    open_draft(state);
    true
}

/// Whether a draft is open and not waiting on a swap
fn draft_accepting(state: &GameState) -> bool {
    state
        .roguelite
        .as_ref()
        .is_some_and(|r| r.selecting && r.pending_swap.is_none() && r.choices.is_some())
}

/// Take choice `index` of the open draft
pub fn choose_draft(state: &mut GameState, index: usize) -> bool {
    if !draft_accepting(state) {
        return false;
    }
    let Some(choice) = state
        .roguelite
        .as_ref()
        .and_then(|r| r.choices.as_ref())
        .and_then(|c| c.get(index).copied())
    else {
        return false;
    };

    match choice {
        DraftChoice::Ability { kind, .. } => {
            apply_ability(state, kind);
            finish_draft(state);
        }
        DraftChoice::Skill { kind, .. } => acquire_skill(state, kind),
    }
    true
}

fn apply_ability(state: &mut GameState, kind: AbilityKind) {
    let Some(r) = state.roguelite.as_mut() else {
        return;
    };
    let level = r.abilities.entry(kind).or_insert(0);
    *level = (*level + 1).min(kind.max_level());
    log::info!("Ability {:?} now level {}", kind, level);

    if let Some(amount) = kind.heal_amount() {
        state.player.hp = (state.player.hp + amount).min(state.player.max_hp);
        state.emit(GameEvent::HpChanged {
            hp: state.player.hp,
            max_hp: state.player.max_hp,
        });
    }
    if kind == AbilityKind::OrbLimit {
        state.emit_orbs();
    }
}

fn acquire_skill(state: &mut GameState, kind: SkillKind) {
    let Some(r) = state.roguelite.as_mut() else {
        return;
    };

    if let Some(held) = r.skills.iter_mut().find(|s| s.kind == kind) {
        held.level = (held.level + 1).min(kind.max_level());
    } else if r.skills.len() < MAX_HELD_SKILLS {
        r.skills.push(HeldSkill { kind, level: 1 });
    } else {
        r.pending_swap = Some(kind);
        let held = r.skills.clone();
        state.emit(GameEvent::SwapOffered { held, incoming: kind });
        return;
    }
    finish_draft(state);
}

/// Replace held skill `slot` with the skill waiting for a swap
pub fn choose_swap_slot(state: &mut GameState, slot: usize) -> bool {
    let Some(r) = state.roguelite.as_mut() else {
        return false;
    };
    let Some(incoming) = r.pending_swap else {
        return false;
    };
    if slot >= r.skills.len() {
        return false;
    }

    log::info!("Swapped {:?} for {:?}", r.skills[slot].kind, incoming);
    r.skills[slot] = HeldSkill {
        kind: incoming,
        level: 1,
    };
    r.pending_swap = None;
    state.emit(GameEvent::SwapClosed);
    finish_draft(state);
    true
}

/// Back out of a swap to the same draft choices
pub fn cancel_swap(state: &mut GameState) -> bool {
    let Some(r) = state.roguelite.as_mut() else {
        return false;
    };
    if r.pending_swap.take().is_none() {
        return false;
    }
    let selecting = r.selecting;
    state.emit(GameEvent::SwapClosed);
    if selecting {
        open_draft(state);
    }
    true
}

/// Close the draft with no pick; the draft index still advances
pub fn skip_draft(state: &mut GameState) -> bool {
    if !draft_accepting(state) {
        return false;
    }
    finish_draft(state);
    true
}

/// Spend HP to draw new choices; the draft reopens a few ticks later
pub fn reroll_draft(state: &mut GameState) -> bool {
    if !draft_accepting(state) || state.player.hp <= REROLL_HP_COST {
        return false;
    }

    state.player.hp -= REROLL_HP_COST;
    state.emit(GameEvent::HpChanged {
        hp: state.player.hp,
        max_hp: state.player.max_hp,
    });

    let Some(r) = state.roguelite.as_mut() else {
        return false;
    };
    r.choices = None;
    let draft_index = r.next_draft_index;
    state.emit(GameEvent::DraftClosed);

    let (clock, epoch) = (state.clock, state.epoch);
    state.scheduler.schedule(
        DeferredAction::ReopenDraft { draft_index },
        clock,
        DRAFT_REOPEN_DELAY_TICKS,
        epoch,
    );
    true
}

fn finish_draft(state: &mut GameState) {
    let Some(r) = state.roguelite.as_mut() else {
        return;
    };
    r.selecting = false;
    r.next_draft_index += 1;
    r.choices = None;
    r.pending_swap = None;
    let loadout = r.skill_kinds();

    if state.phase == GamePhase::Paused(PauseReason::Draft) {
        state.phase = GamePhase::Running;
    }
    state.emit(GameEvent::DraftClosed);
    state.emit(GameEvent::LoadoutChanged(loadout));
}
