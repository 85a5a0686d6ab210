//! Outbound collaborators: HUD notifications and drawing
//!
//! The core never reads anything back from these except through the explicit
//! draft/swap entry points on `Session`.

use crate::sim::draft::{DraftChoice, HeldSkill};
use crate::sim::progression::Difficulty;
use crate::sim::skills::SkillKind;
use crate::sim::state::{GameEvent, GameState};

/// HUD / overlay notifications. Every method defaults to a no-op.
#[allow(unused_variables)]
pub trait UiSink {
    fn update_hp(&mut self, hp: i32, max_hp: i32) {}
    fn update_score(&mut self, score: u64) {}
    fn update_orbs(&mut self, orbs: u32, max_orbs: u32) {}
    fn update_combo(&mut self, combo: u32, bonus: u32) {}
    fn flash_damage(&mut self) {}
    fn show_countdown(&mut self, seconds: u32) {}
    fn hide_countdown(&mut self) {}
    fn set_paused(&mut self, paused: bool) {}
    fn set_skill_armed(&mut self, skill: SkillKind, armed: bool) {}
    fn update_loadout(&mut self, skills: &[SkillKind]) {}
    fn update_difficulty(&mut self, tier: Difficulty, multiplier: f32) {}
    fn show_draft(&mut self, choices: &[DraftChoice], can_reroll: bool) {}
    fn hide_draft(&mut self) {}
    fn show_swap(&mut self, held: &[HeldSkill], incoming: SkillKind) {}
    fn hide_swap(&mut self) {}
    fn show_game_over(&mut self, score: u64, best: u64, new_record: bool) {}
}

/// Draws the current state; called once per frame in every phase
pub trait RenderSink {
    fn render(&mut self, state: &GameState);
}

/// Route one event to the matching notification
pub fn dispatch<U: UiSink + ?Sized>(ui: &mut U, event: &GameEvent) {
    match event {
        GameEvent::HpChanged { hp, max_hp } => ui.update_hp(*hp, *max_hp),
        GameEvent::ScoreChanged(score) => ui.update_score(*score),
        GameEvent::OrbsChanged { orbs, max_orbs } => ui.update_orbs(*orbs, *max_orbs),
        GameEvent::ComboChanged { combo, bonus } => ui.update_combo(*combo, *bonus),
        GameEvent::DamageFlash => ui.flash_damage(),
        GameEvent::CountdownShown(seconds) => ui.show_countdown(*seconds),
        GameEvent::CountdownHidden => ui.hide_countdown(),
        GameEvent::PauseChanged(paused) => ui.set_paused(*paused),
        GameEvent::SkillArmed { skill, armed } => ui.set_skill_armed(*skill, *armed),
        GameEvent::LoadoutChanged(skills) => ui.update_loadout(skills),
        GameEvent::DifficultyChanged { tier, multiplier } => ui.update_difficulty(*tier, *multiplier),
        GameEvent::DraftOffered { choices, can_reroll } => ui.show_draft(choices, *can_reroll),
        GameEvent::DraftClosed => ui.hide_draft(),
        GameEvent::SwapOffered { held, incoming } => ui.show_swap(held, *incoming),
        GameEvent::SwapClosed => ui.hide_swap(),
        GameEvent::GameOver {
            score,
            best,
            new_record,
        } => ui.show_game_over(*score, *best, *new_record),
    }
}

/// Headless UI: writes the interesting notifications to the log
#[derive(Debug, Default)]
pub struct LogUi;

impl UiSink for LogUi {
    fn flash_damage(&mut self) {
        log::debug!("Damage taken");
    }

    fn set_paused(&mut self, paused: bool) {
        log::info!("{}", if paused { "Paused" } else { "Resumed" });
    }

    fn update_difficulty(&mut self, tier: Difficulty, multiplier: f32) {
        log::info!("Difficulty now {} (x{:.1})", tier.as_str(), multiplier);
    }

    fn show_draft(&mut self, choices: &[DraftChoice], can_reroll: bool) {
        let names: Vec<String> = choices
            .iter()
            .map(|c| match c {
                DraftChoice::Ability { kind, current_level } => {
                    format!("{} Lv{}", kind.name(), current_level + 1)
                }
                DraftChoice::Skill { kind, current_level } => {
                    format!("{} Lv{}", kind.name(), current_level + 1)
                }
            })
            .collect();
        log::info!("Draft offered: [{}] reroll={}", names.join(", "), can_reroll);
    }

    fn show_swap(&mut self, held: &[HeldSkill], incoming: SkillKind) {
        log::info!("Swap offered: {} for one of {} held skills", incoming.name(), held.len());
    }

    fn show_game_over(&mut self, score: u64, best: u64, new_record: bool) {
        log::info!("Final score {} (best {}){}", score, best, if new_record { " NEW RECORD" } else { "" });
    }
}

/// Renderer that draws nothing
#[derive(Debug, Default)]
pub struct NullRenderer {
    /// Frames "drawn"
    pub frames: u64,
}

impl RenderSink for NullRenderer {
    fn render(&mut self, _state: &GameState) {
        self.frames += 1;
    }
}
