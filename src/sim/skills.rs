//! Orb-gated skills
//!
//! Every activation is a silent no-op when it can't apply (not enough orbs,
//! an arm already pending, wrong phase). The `bool` results exist for tests
//! and logging only.

use std::f32::consts::PI;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::effects::{Beam, Explosion, GravityWell};
use super::schedule::DeferredAction;
use super::state::{Ball, Block, Enhancement, GameEvent, GamePhase, GameState};
use crate::consts::*;
use crate::secs_to_ticks;

/// Skill identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkillKind {
    Penetrate,
    Explode,
    BarExplode,
    Clone,
    Beam,
    VPenetrate,
    HPenetrate,
    BarInvincible,
    Gravity,
}

impl SkillKind {
    pub const ALL: [SkillKind; 9] = [
        SkillKind::Penetrate,
        SkillKind::Explode,
        SkillKind::BarExplode,
        SkillKind::Clone,
        SkillKind::Beam,
        SkillKind::VPenetrate,
        SkillKind::HPenetrate,
        SkillKind::BarInvincible,
        SkillKind::Gravity,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            SkillKind::Penetrate => "penetrate",
            SkillKind::Explode => "explode",
            SkillKind::BarExplode => "barExplode",
            SkillKind::Clone => "clone",
            SkillKind::Beam => "beam",
            SkillKind::VPenetrate => "vPenetrate",
            SkillKind::HPenetrate => "hPenetrate",
            SkillKind::BarInvincible => "barInvincible",
            SkillKind::Gravity => "gravity",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SkillKind::Penetrate => "Penetrate",
            SkillKind::Explode => "Explode",
            SkillKind::BarExplode => "Bar Explode",
            SkillKind::Clone => "Clone",
            SkillKind::Beam => "Beam",
            SkillKind::VPenetrate => "Vertical Penetrate",
            SkillKind::HPenetrate => "Horizontal Penetrate",
            SkillKind::BarInvincible => "Bar Invincible",
            SkillKind::Gravity => "Gravity",
        }
    }

    /// Orb cost per activation
    pub fn cost(&self) -> u32 {
        match self {
            SkillKind::Penetrate => 20,
            SkillKind::Explode => 40,
            SkillKind::BarExplode => 100,
            SkillKind::Clone => 50,
            SkillKind::Beam => 100,
            SkillKind::VPenetrate => 30,
            SkillKind::HPenetrate => 50,
            SkillKind::BarInvincible => 30,
            SkillKind::Gravity => 70,
        }
    }

    pub fn max_level(&self) -> u8 {
        5
    }
}

/// Orbs returned when a pending arm is cancelled
pub fn cancel_refund(cost: u32) -> u32 {
    cost / 2
}

/// Resolved parameters of one skill at one level
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkillEffect {
    Penetrate { charges: u32 },
    Explode { radius_blocks: f32, count: u32 },
    BarExplode { rows: u32 },
    Clone { count: u32 },
    Beam { damage: u32, width_multiplier: f32 },
    VPenetrate { charges: u32 },
    HPenetrate { charges: u32 },
    BarInvincible { duration_ticks: u64, width_multiplier: f32 },
    Gravity { radius_blocks: f32, power: f32, duration_ticks: u32 },
}

const PENETRATE_CHARGES: [u32; 5] = [3, 5, 10, 15, 20];

/// Effect table lookup; levels outside 1..=5 clamp
pub fn skill_effect(kind: SkillKind, level: u8) -> SkillEffect {
    let i = (level.clamp(1, kind.max_level()) - 1) as usize;
    match kind {
        SkillKind::Penetrate => SkillEffect::Penetrate {
            charges: PENETRATE_CHARGES[i],
        },
        SkillKind::Explode => SkillEffect::Explode {
            radius_blocks: [3.0, 4.0, 5.0, 6.0, 6.0][i],
            count: if i == 4 { 2 } else { 1 },
        },
        SkillKind::BarExplode => SkillEffect::BarExplode {
            rows: [3, 4, 5, 6, 7][i],
        },
        SkillKind::Clone => SkillEffect::Clone {
            count: [1, 2, 5, 7, 10][i],
        },
        SkillKind::Beam => SkillEffect::Beam {
            damage: [2, 3, 4, 4, 4][i],
            width_multiplier: [1.0, 1.0, 1.0, 1.1, 1.3][i],
        },
        SkillKind::VPenetrate => SkillEffect::VPenetrate {
            charges: PENETRATE_CHARGES[i],
        },
        SkillKind::HPenetrate => SkillEffect::HPenetrate {
            charges: PENETRATE_CHARGES[i],
        },
        SkillKind::BarInvincible => SkillEffect::BarInvincible {
            duration_ticks: secs_to_ticks([3.0, 4.0, 5.0, 5.0, 5.0][i]),
            width_multiplier: [1.0, 1.0, 1.0, 1.5, 2.0][i],
        },
        SkillKind::Gravity => SkillEffect::Gravity {
            radius_blocks: [5.0, 7.0, 9.0, 11.0, 13.0][i],
            power: [1.0, 1.2, 1.4, 1.6, 1.8][i],
            duration_ticks: if i >= 3 {
                GRAVITY_DURATION_TICKS + TICKS_PER_SECOND * 5
            } else {
                GRAVITY_DURATION_TICKS
            },
        },
    }
}

/// Skill bound to a slot in the current mode
pub fn slot_skill(state: &GameState, slot: usize) -> Option<SkillKind> {
    match &state.roguelite {
        Some(r) => r.skills.get(slot).map(|h| h.kind),
        None => state.loadout.get(slot).copied(),
    }
}

/// Activate the skill in slot `slot` (0-based)
pub fn activate_slot(state: &mut GameState, slot: usize) -> bool {
    match slot_skill(state, slot) {
        Some(kind) => activate_skill(state, kind),
        None => false,
    }
}

/// Activate a skill by kind; only while running
pub fn activate_skill(state: &mut GameState, kind: SkillKind) -> bool {
    if !state.phase.is_running() {
        return false;
    }

    let level = state.skill_level(kind);
    let accepted = match skill_effect(kind, level) {
        SkillEffect::Penetrate { charges } => {
            arm_paddle(state, kind, Enhancement::Penetrate { charges })
        }
        SkillEffect::Explode { radius_blocks, count } => activate_explode(state, radius_blocks, count),
        SkillEffect::BarExplode { rows } => spend(state, kind) && {
            resolve_bar_explode(state, rows);
            true
        },
        SkillEffect::Clone { count } => spend(state, kind) && {
            spawn_clones(state, count);
            true
        },
        SkillEffect::Beam { damage, width_multiplier } => spend(state, kind) && {
            resolve_beam(state, damage, width_multiplier);
            true
        },
        SkillEffect::VPenetrate { charges } => spend(state, kind) && {
            redirect_penetrating(state, Vec2::new(0.0, -1.0), charges);
            true
        },
        SkillEffect::HPenetrate { charges } => spend(state, kind) && {
            redirect_penetrating(state, Vec2::new(1.0, 0.0), charges);
            true
        },
        SkillEffect::BarInvincible {
            duration_ticks,
            width_multiplier,
        } => activate_bar_invincible(state, duration_ticks, width_multiplier),
        SkillEffect::Gravity {
            radius_blocks,
            power,
            duration_ticks,
        } => activate_gravity(state, radius_blocks, power, duration_ticks),
    };

    if accepted {
        log::debug!("Skill {} (lv {}) activated, {} orbs left", kind.id(), level, state.player.orbs);
    }
    accepted
}

/// Drop a pending paddle arm, refund half its cost, and disarm exploding balls
pub fn cancel_skill(state: &mut GameState) -> bool {
    if matches!(state.phase, GamePhase::Idle | GamePhase::GameOver) {
        return false;
    }
    let Some(enhancement) = state.paddle.reset_enhance() else {
        return false;
    };

    let skill = enhancement.skill();
    state.add_orbs(cancel_refund(skill.cost()));
    for ball in &mut state.balls {
        ball.disarm_explode();
    }
    state.emit(GameEvent::SkillArmed { skill, armed: false });
    log::debug!("Skill {} cancelled", skill.id());
    true
}

fn spend(state: &mut GameState, kind: SkillKind) -> bool {
    state.try_spend_orbs(kind.cost())
}

fn arm_paddle(state: &mut GameState, kind: SkillKind, enhancement: Enhancement) -> bool {
    if state.paddle.is_enhanced() || !spend(state, kind) {
        return false;
    }
    state.paddle.enhance(enhancement);
    state.emit(GameEvent::SkillArmed {
        skill: kind,
        armed: true,
    });
    true
}

fn activate_explode(state: &mut GameState, radius_blocks: f32, count: u32) -> bool {
    // Balls already carrying a blast go off now; that blast was paid for on arming
    if !state.paddle.is_enhanced() && state.balls.iter().any(|b| b.explodable) {
        detonate_ready_balls(state);
        return true;
    }

    let radius = radius_blocks * state.block_width;
    arm_paddle(state, SkillKind::Explode, Enhancement::Explode { radius, count })
}

fn detonate_ready_balls(state: &mut GameState) {
    let blasts: Vec<(Vec2, f32)> = state
        .balls
        .iter_mut()
        .filter_map(|ball| ball.take_blast().map(|r| (ball.pos, r)))
        .collect();

    for (pos, radius) in blasts {
        resolve_explosion(state, pos, radius);
    }
}

fn redirect_penetrating(state: &mut GameState, dir: Vec2, charges: u32) {
    for ball in &mut state.balls {
        ball.vel = dir * ball.speed.abs();
        ball.enable_penetrate(charges);
    }
}

fn spawn_clones(state: &mut GameState, count: u32) {
    let half_height = state.height / 2.0;
    let sources: Vec<Ball> = state.balls.iter().filter(|b| !b.is_clone).cloned().collect();

    for source in &sources {
        let angle = source.vel.y.atan2(source.vel.x);
        for _ in 0..count {
            let spread = PI / 4.0 * (state.rng.random::<f32>() - 0.5);
            let id = state.next_entity_id();

            let mut clone = Ball::new(id, source.pos, source.radius);
            clone.is_clone = true;
            clone.speed = source.speed;
            clone.max_speed = source.max_speed;
            let a = angle + spread;
            clone.vel = Vec2::new(a.cos(), a.sin()) * clone.speed;
            if clone.vel.y > 0.0 && clone.pos.y > half_height {
                clone.vel.y = -clone.vel.y.abs();
            }
            state.balls.push(clone);
        }
    }
}

fn activate_bar_invincible(state: &mut GameState, duration_ticks: u64, width_multiplier: f32) -> bool {
    if state.player.invincible || !spend(state, SkillKind::BarInvincible) {
        return false;
    }

    state.player.invincible = true;
    state.paddle.invincible = true;
    if width_multiplier > 1.0 {
        state.paddle.size.x *= width_multiplier;
    }
    let (clock, epoch) = (state.clock, state.epoch);
    state
        .scheduler
        .schedule(DeferredAction::EndInvincibility, clock, duration_ticks, epoch);
    true
}

fn activate_gravity(state: &mut GameState, radius_blocks: f32, power: f32, duration_ticks: u32) -> bool {
    if state.balls.is_empty() || !spend(state, SkillKind::Gravity) {
        return false;
    }

    let radius = state.block_width * radius_blocks;
    let pull = GRAVITY_BASE_PULL * power;
    let positions: Vec<Vec2> = state.balls.iter().map(|b| b.pos).collect();
    for pos in positions {
        let id = state.next_entity_id();
        state
            .effects
            .gravity_wells
            .push(GravityWell::new(id, pos, radius, pull, duration_ticks));
    }
    true
}

/// Damage or destroy every live block matching `hit`, then score the kills
///
/// `damage: None` destroys regardless of HP.
fn strike_blocks(state: &mut GameState, hit: impl Fn(&Block) -> bool, damage: Option<u32>) -> usize {
    let mut destroyed = Vec::new();
    for block in state.blocks.iter_mut().rev() {
        if block.destroyed || !hit(block) {
            continue;
        }
        let killed = match damage {
            Some(amount) => block.take_damage(amount),
            None => block.destroy(),
        };
        if killed {
            destroyed.push(block.clone());
        }
    }

    state.blocks.retain(|b| !b.destroyed);
    state.on_blocks_destroyed(&destroyed);
    destroyed.len()
}

/// Blast at `center`: fixed damage to blocks whose centers lie within `radius`
pub fn resolve_explosion(state: &mut GameState, center: Vec2, radius: f32) -> usize {
    state.effects.explosions.push(Explosion::new(center, radius));
    strike_blocks(
        state,
        |b| b.center().distance(center) <= radius,
        Some(EXPLOSION_DAMAGE),
    )
}

/// Wipe a band of `rows` block rows directly above the paddle
pub fn resolve_bar_explode(state: &mut GameState, rows: u32) -> usize {
    let range = rows as f32 * (BLOCK_HEIGHT + BLOCK_PADDING);
    let bottom = state.paddle.pos.y;
    let top = bottom - range;

    let destroyed = strike_blocks(
        state,
        |b| {
            let r = b.bounds();
            r.bottom >= top && r.top <= bottom
        },
        None,
    );

    let effect_y = bottom - range / 2.0;
    const BLASTS: usize = 5;
    for i in 0..BLASTS {
        let x = state.width / (BLASTS as f32 + 1.0) * (i as f32 + 1.0);
        state
            .effects
            .explosions
            .push(Explosion::new(Vec2::new(x, effect_y), 80.0));
    }
    destroyed
}

/// Full-height column above the paddle dealing `damage` to every block it crosses
pub fn resolve_beam(state: &mut GameState, damage: u32, width_multiplier: f32) -> usize {
    let width = state.paddle.size.x * width_multiplier;
    let center_x = state.paddle.center_x();
    let band = Rect {
        left: center_x - width / 2.0,
        top: 0.0,
        right: center_x + width / 2.0,
        bottom: state.height,
    };

    let hits = strike_blocks(state, |b| band.intersects(&b.bounds()), Some(damage));
    let beam = Beam::new(center_x, 0.0, state.paddle.pos.y, width);
    state.effects.beams.push(beam);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::progression::Difficulty;
    use crate::sim::state::GameMode;

    fn running_state() -> GameState {
        let mut state = GameState::new(CANVAS_WIDTH, CANVAS_HEIGHT, 11);
        state.start_session(GameMode::Normal(Difficulty::Easy), &[]);
        state.phase = GamePhase::Running;
        state.blocks.clear();
        state.player.orbs = 200;
        state.drain_events();
        state
    }

    fn add_block(state: &mut GameState, x: f32, y: f32, hp: u32) {
        let id = state.next_entity_id();
        state
            .blocks
            .push(Block::new(id, Vec2::new(x, y), Vec2::new(40.0, BLOCK_HEIGHT), hp));
    }

    #[test]
    fn test_ids_roundtrip() {
        for kind in SkillKind::ALL {
            assert_eq!(SkillKind::from_id(kind.id()), Some(kind));
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.id()));
        }
    }

    #[test]
    fn test_effect_tables() {
        assert_eq!(skill_effect(SkillKind::Penetrate, 1), SkillEffect::Penetrate { charges: 3 });
        assert_eq!(skill_effect(SkillKind::Penetrate, 5), SkillEffect::Penetrate { charges: 20 });
        assert_eq!(
            skill_effect(SkillKind::Explode, 5),
            SkillEffect::Explode {
                radius_blocks: 6.0,
                count: 2
            }
        );
        assert_eq!(skill_effect(SkillKind::Clone, 0), SkillEffect::Clone { count: 1 });
        assert_eq!(skill_effect(SkillKind::Clone, 9), SkillEffect::Clone { count: 10 });
        assert_eq!(
            skill_effect(SkillKind::Gravity, 4),
            SkillEffect::Gravity {
                radius_blocks: 11.0,
                power: 1.6,
                duration_ticks: 900
            }
        );
        assert_eq!(
            skill_effect(SkillKind::BarInvincible, 1),
            SkillEffect::BarInvincible {
                duration_ticks: 180,
                width_multiplier: 1.0
            }
        );
    }

    #[test]
    fn test_penetrate_twice_charges_once() {
        let mut state = running_state();
        assert!(activate_skill(&mut state, SkillKind::Penetrate));
        assert_eq!(state.player.orbs, 180);
        assert!(!activate_skill(&mut state, SkillKind::Penetrate));
        assert_eq!(state.player.orbs, 180);
        assert_eq!(state.paddle.enhancement, Some(Enhancement::Penetrate { charges: 3 }));
    }

    #[test]
    fn test_insufficient_orbs_is_noop() {
        let mut state = running_state();
        state.player.orbs = 99;
        assert!(!activate_skill(&mut state, SkillKind::Beam));
        assert_eq!(state.player.orbs, 99);
        assert!(state.effects.beams.is_empty());
    }

    #[test]
    fn test_not_running_is_noop() {
        let mut state = running_state();
        state.phase = GamePhase::Paused(crate::sim::state::PauseReason::Player);
        assert!(!activate_skill(&mut state, SkillKind::Penetrate));
        assert_eq!(state.player.orbs, 200);
    }

    #[test]
    fn test_cancel_refunds_half() {
        assert_eq!(cancel_refund(100), 50);
        assert_eq!(cancel_refund(25), 12);

        let mut state = running_state();
        state.player.orbs = 100;
        activate_skill(&mut state, SkillKind::Explode);
        assert_eq!(state.player.orbs, 60);
        state.balls[0].enable_explode(90.0, 1);

        assert!(cancel_skill(&mut state));
        assert_eq!(state.player.orbs, 80);
        assert!(!state.paddle.is_enhanced());
        assert!(!state.balls[0].explodable);
        assert!(!cancel_skill(&mut state));
    }

    #[test]
    fn test_cancel_refund_respects_cap() {
        let mut state = running_state();
        activate_skill(&mut state, SkillKind::Explode);
        state.player.orbs = 195;
        cancel_skill(&mut state);
        assert_eq!(state.player.orbs, 200);
    }

    #[test]
    fn test_explode_ready_trigger_detonates_for_free() {
        let mut state = running_state();
        let pos = state.balls[0].pos;
        add_block(&mut state, pos.x - 20.0, pos.y - 80.0, 3);
        state.balls[0].enable_explode(150.0, 1);

        assert!(activate_skill(&mut state, SkillKind::Explode));
        assert_eq!(state.player.orbs, 200);
        assert!(!state.balls[0].explodable);
        assert!(state.blocks.is_empty());
        assert_eq!(state.effects.explosions.len(), 1);
    }

    #[test]
    fn test_explosion_radius_inclusive() {
        let mut state = running_state();
        add_block(&mut state, 100.0, 100.0, 4);
        let center = state.blocks[0].center();
        add_block(&mut state, 300.0, 100.0, 4);

        let destroyed = resolve_explosion(&mut state, center + Vec2::new(50.0, 0.0), 50.0);
        assert_eq!(destroyed, 1);
        assert_eq!(state.blocks.len(), 1);
        assert_eq!(state.player.combo, 1);
        assert_eq!(state.player.score, 400);
    }

    #[test]
    fn test_explosion_damages_without_destroying_tough_blocks() {
        let mut state = running_state();
        add_block(&mut state, 100.0, 100.0, 10);
        let center = state.blocks[0].center();
        assert_eq!(resolve_explosion(&mut state, center, 10.0), 0);
        assert_eq!(state.blocks[0].hp, 6);
    }

    #[test]
    fn test_bar_explode_ignores_hp() {
        let mut state = running_state();
        let paddle_y = state.paddle.pos.y;
        add_block(&mut state, 10.0, paddle_y - 60.0, 20);
        add_block(&mut state, 60.0, paddle_y - 3.0 * 34.0 - 30.0, 5);
        add_block(&mut state, 110.0, paddle_y - 200.0, 1);

        assert!(activate_skill(&mut state, SkillKind::BarExplode));
        // Second block's bottom sits exactly on the band's top edge
        assert_eq!(state.blocks.len(), 1);
        assert_eq!(state.blocks[0].max_hp, 1);
        assert_eq!(state.effects.explosions.len(), 5);
    }

    #[test]
    fn test_beam_hits_column_only() {
        let mut state = running_state();
        let cx = state.paddle.center_x();
        add_block(&mut state, cx - 10.0, 50.0, 5);
        add_block(&mut state, cx - 10.0, 200.0, 1);
        add_block(&mut state, 0.0, 50.0, 1);
        state.paddle.pos.x = 200.0;
        let cx = state.paddle.center_x();
        state.blocks[2].pos.x = cx + state.paddle.size.x / 2.0;

        assert!(activate_skill(&mut state, SkillKind::Beam));
        assert_eq!(state.blocks.len(), 2);
        assert_eq!(state.blocks.iter().find(|b| b.max_hp == 5).map(|b| b.hp), Some(3));
        assert!(state.blocks.iter().any(|b| b.pos.x == cx + 60.0));
        assert_eq!(state.effects.beams.len(), 1);
    }

    #[test]
    fn test_clone_spawns_from_normal_balls() {
        let mut state = running_state();
        state.balls[0].pos = Vec2::new(240.0, 600.0);
        state.balls[0].vel = Vec2::new(0.0, 5.0);
        assert!(activate_skill(&mut state, SkillKind::Clone));
        assert_eq!(state.balls.len(), 2);
        let clone = &state.balls[1];
        assert!(clone.is_clone);
        assert!(clone.vel.y < 0.0);
        assert_eq!(state.normal_ball_count(), 1);

        // Clones don't clone
        state.player.orbs = 200;
        activate_skill(&mut state, SkillKind::Clone);
        assert_eq!(state.balls.len(), 3);
    }

    #[test]
    fn test_vertical_penetrate() {
        let mut state = running_state();
        state.balls[0].vel = Vec2::new(3.0, 3.0);
        assert!(activate_skill(&mut state, SkillKind::VPenetrate));
        let ball = &state.balls[0];
        assert_eq!(ball.vel, Vec2::new(0.0, -ball.speed));
        assert!(ball.penetrating);
        assert_eq!(ball.penetrate_count, 3);
    }

    #[test]
    fn test_horizontal_penetrate() {
        let mut state = running_state();
        assert!(activate_skill(&mut state, SkillKind::HPenetrate));
        let ball = &state.balls[0];
        assert_eq!(ball.vel, Vec2::new(ball.speed, 0.0));
        assert!(ball.penetrating);
    }

    #[test]
    fn test_bar_invincible_blocks_stacking() {
        let mut state = running_state();
        assert!(activate_skill(&mut state, SkillKind::BarInvincible));
        assert!(state.player.invincible);
        assert!(state.paddle.invincible);
        assert!(state.scheduler.is_pending(DeferredAction::EndInvincibility));
        assert!(!activate_skill(&mut state, SkillKind::BarInvincible));
        assert_eq!(state.player.orbs, 170);
    }

    #[test]
    fn test_gravity_needs_balls() {
        let mut state = running_state();
        state.balls.clear();
        assert!(!activate_skill(&mut state, SkillKind::Gravity));
        assert_eq!(state.player.orbs, 200);

        let mut state = running_state();
        assert!(activate_skill(&mut state, SkillKind::Gravity));
        let well = &state.effects.gravity_wells[0];
        assert!((well.pull_strength - GRAVITY_BASE_PULL).abs() < 1e-6);
        assert!((well.radius - state.block_width * 5.0).abs() < 1e-4);
        assert_eq!(well.duration, GRAVITY_DURATION_TICKS);
    }

    #[test]
    fn test_activate_slot_uses_loadout() {
        let mut state = GameState::new(CANVAS_WIDTH, CANVAS_HEIGHT, 5);
        state.start_session(
            GameMode::Normal(Difficulty::Easy),
            &[SkillKind::Clone, SkillKind::Penetrate],
        );
        state.phase = GamePhase::Running;

        assert!(activate_slot(&mut state, 1));
        assert!(state.paddle.is_enhanced());
        assert!(!activate_slot(&mut state, 2));
    }
}
