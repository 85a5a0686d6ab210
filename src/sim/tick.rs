//! Fixed timestep simulation tick
//!
//! One call advances the session by exactly one frame. Order within a running
//! tick: difficulty ramp, paddle, balls, blocks, orbs, effects, row spawn,
//! game-over check, draft check.

use glam::Vec2;

use super::collision::{BlockHit, ball_block_collisions, ball_paddle_collision, ball_wall_collision, gravity_well_interaction};
use super::draft;
use super::effects::Shockwave;
use super::progression;
use super::schedule::DeferredAction;
use super::skills::{self, resolve_explosion};
use super::state::{Ball, GameEvent, GamePhase, GameState, PauseReason};
use crate::consts::*;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Held direction keys
    pub left: bool,
    pub right: bool,
    /// Absolute pointer x (mouse/touch); switches steering to the pointer
    pub pointer_x: Option<f32>,
    /// Pause toggle
    pub pause: bool,
    /// Activate the skill in this slot
    pub skill_slot: Option<usize>,
    /// Cancel a pending paddle arm
    pub cancel_skill: bool,
    /// Idle/demo mode - AI plays the game
    pub demo: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    state.clock += 1;

    let input = if input.demo {
        demo_input(state, input)
    } else {
        input.clone()
    };
    apply_input(state, &input);
    run_deferred(state);

    match state.phase {
        GamePhase::Idle => {}
        GamePhase::Countdown { ticks_left } => countdown(state, ticks_left),
        GamePhase::Running => update(state),
        // Transient effects keep animating; gameplay is frozen
        GamePhase::Paused(_) | GamePhase::GameOver => state.effects.update_cosmetic(),
    }
}

fn apply_input(state: &mut GameState, input: &TickInput) {
    if let Some(x) = input.pointer_x {
        state.control.pointer_x = x;
        state.control.use_pointer = true;
    }
    if input.left || input.right {
        state.control.use_pointer = false;
    }
    state.control.left = input.left;
    state.control.right = input.right;

    if input.pause {
        state.toggle_pause();
    }
    if let Some(slot) = input.skill_slot {
        skills::activate_slot(state, slot);
    }
    if input.cancel_skill {
        skills::cancel_skill(state);
    }
}

/// Fire due deferred actions, re-checking live state for each
fn run_deferred(state: &mut GameState) {
    for due in state.scheduler.take_due(state.clock) {
        if due.epoch != state.epoch {
            log::debug!("Dropped stale {:?} from session {}", due.action, due.epoch);
            continue;
        }

        match due.action {
            DeferredAction::RespawnBall => {
                let needed = state.normal_ball_count() == 0
                    && state.player.hp > 0
                    && state.phase != GamePhase::GameOver;
                if needed {
                    state.spawn_serve_ball();
                    log::debug!("Ball respawned");
                }
            }
            DeferredAction::EndInvincibility => {
                state.player.invincible = false;
                state.paddle.invincible = false;
            }
            DeferredAction::ReopenDraft { draft_index } => {
                draft::reopen_draft(state, draft_index);
            }
        }
    }
}

fn countdown(state: &mut GameState, ticks_left: u32) {
    let left = ticks_left.saturating_sub(1);
    if left == 0 {
        state.phase = GamePhase::Running;
        state.emit(GameEvent::CountdownHidden);
        return;
    }

    state.phase = GamePhase::Countdown { ticks_left: left };
    if left % TICKS_PER_SECOND == 0 {
        state.emit(GameEvent::CountdownShown(left / TICKS_PER_SECOND));
    }
}

fn update(state: &mut GameState) {
    update_ramp(state);
    update_paddle(state);
    update_balls(state);
    update_blocks(state);
    update_orbs(state);

    state.effects.update_cosmetic();
    state.effects.update_wells();

    spawn_blocks(state);
    check_game_over(state);
    draft::check_draft_unlock(state);
}

fn update_ramp(state: &mut GameState) {
    let Some(r) = state.roguelite.as_mut() else {
        return;
    };

    r.elapsed_ticks += 1;
    let (tier, multiplier) = progression::roguelite_ramp(r.elapsed_ticks);
    if tier == r.tier && multiplier == r.extreme_multiplier {
        return;
    }

    r.tier = tier;
    r.extreme_multiplier = multiplier;
    state.difficulty = tier;
    log::info!("Difficulty now {} x{:.1}", tier.as_str(), multiplier);
    state.emit(GameEvent::DifficultyChanged { tier, multiplier });
}

fn update_paddle(state: &mut GameState) {
    if !state.paddle.invincible {
        state.paddle.size.x = PADDLE_WIDTH * state.bar_width_multiplier();
    }

    let width = state.width;
    if state.control.use_pointer {
        state.paddle.move_to(state.control.pointer_x, width);
    } else {
        if state.control.left {
            state.paddle.move_left(width);
        }
        if state.control.right {
            state.paddle.move_right(width);
        }
    }
}

fn update_balls(state: &mut GameState) {
    let base_damage = state.ball_damage();
    let (width, height) = (state.width, state.height);

    let mut i = state.balls.len();
    while i > 0 {
        i -= 1;

        let ball = &mut state.balls[i];
        ball.update();
        if ball_wall_collision(ball, width) {
            ball.ignored_gravity_well = None;
        }

        if ball.pos.y > height + ball.radius {
            let lost = state.balls.remove(i);
            on_ball_lost(state, &lost);
            continue;
        }

        let armed = state.paddle.enhancement.map(|e| e.skill());
        if ball_paddle_collision(&mut state.balls[i], &mut state.paddle) {
            state.balls[i].ignored_gravity_well = None;
            if let Some(skill) = armed {
                state.emit(GameEvent::SkillArmed { skill, armed: false });
            }
        }

        let hits = ball_block_collisions(&mut state.balls[i], &mut state.blocks, base_damage);
        if !hits.is_empty() {
            if !state.balls[i].penetrating {
                state.balls[i].ignored_gravity_well = None;
            }
            resolve_block_hits(state, i, &hits);
        }

        gravity_well_interaction(&mut state.balls[i], &state.effects.gravity_wells);
    }
}

/// Score kills, leave shockwaves behind piercing hits, and set off armed blasts
fn resolve_block_hits(state: &mut GameState, ball_index: usize, hits: &[BlockHit]) {
    let mut destroyed = Vec::new();
    let mut blasts = Vec::new();

    for hit in hits {
        let block = &state.blocks[hit.index];
        if hit.destroyed {
            if hit.pierced {
                state.effects.shockwaves.push(Shockwave::new(block.center()));
            }
            destroyed.push(block.clone());
        }

        let ball = &mut state.balls[ball_index];
        if let Some(radius) = ball.take_blast() {
            blasts.push((ball.pos, radius));
        }
    }

    state.blocks.retain(|b| !b.destroyed);
    state.on_blocks_destroyed(&destroyed);

    for (pos, radius) in blasts {
        resolve_explosion(state, pos, radius);
    }
}

fn on_ball_lost(state: &mut GameState, ball: &Ball) {
    if ball.is_clone {
        return;
    }

    state.damage_player(1);
    if state.normal_ball_count() == 0 && state.player.hp > 0 {
        let (clock, epoch) = (state.clock, state.epoch);
        state
            .scheduler
            .schedule(DeferredAction::RespawnBall, clock, RESPAWN_DELAY_TICKS, epoch);
    }
}

/// Descend blocks and resolve paddle contact
fn update_blocks(state: &mut GameState) {
    let speed = state.difficulty.params().block_speed;
    let paddle = state.paddle.bounds();
    let invincible = state.player.invincible;

    let mut scored = Vec::new();
    let mut contact_damage = 0;
    for block in state.blocks.iter_mut().rev() {
        if block.destroyed {
            continue;
        }
        block.pos.y += speed;
        if !block.bounds().touches(&paddle) {
            continue;
        }

        if !invincible {
            contact_damage += block.hp as i32;
        }
        block.destroy();
        scored.push(block.clone());
    }

    state.blocks.retain(|b| !b.destroyed);
    // Damage breaks the combo before the crushed blocks count toward it
    if contact_damage > 0 {
        state.damage_player(contact_damage);
    }
    state.on_blocks_destroyed(&scored);
}

fn update_orbs(state: &mut GameState) {
    let absorb = state.orb_absorb_factor();
    let target = Vec2::new(state.paddle.center_x(), state.paddle.pos.y);
    let range = absorb * state.paddle.size.x;

    let mut collected = 0;
    for orb in &mut state.orbs {
        if absorb > 0.0 {
            orb.absorb_toward(target, range);
        }
        orb.update();
        if orb.check_collision_with_paddle(&state.paddle) {
            orb.collected = true;
            collected += orb.value;
        }
    }

    let height = state.height;
    state
        .orbs
        .retain(|o| !o.collected && o.pos.y - o.radius <= height);
    if collected > 0 {
        state.add_orbs(collected);
    }
}

fn spawn_blocks(state: &mut GameState) {
    let interval = progression::spawn_interval(state.difficulty.params().block_speed);
    state.block_spawn_timer += 1;
    if state.block_spawn_timer >= interval {
        state.block_spawn_timer = 0;
        state.spawn_block_row();
    }
}

/// End the run on zero HP; blocks at the bottom edge hurt first
fn check_game_over(state: &mut GameState) {
    if state.player.hp <= 0 {
        trigger_game_over(state);
        return;
    }

    let height = state.height;
    let mut i = state.blocks.len();
    while i > 0 {
        i -= 1;
        let block = &state.blocks[i];
        if block.destroyed || block.pos.y + block.size.y < height {
            continue;
        }

        let remaining = block.hp as i32;
        state.blocks.remove(i);
        state.damage_player(remaining);
        state.emit(GameEvent::DamageFlash);

        if state.player.hp <= 0 {
            trigger_game_over(state);
            return;
        }
    }
}

/// Enter the terminal phase and settle the high score for the active tier
pub fn trigger_game_over(state: &mut GameState) {
    if state.phase == GamePhase::GameOver {
        return;
    }
    state.phase = GamePhase::GameOver;

    let tier = state.difficulty;
    let score = state.player.score;
    let previous = state.high_scores.get(tier);
    let new_record = state.high_scores.record(tier, score);
    let best = score.max(previous);

    log::info!(
        "Game over: score {} on {} (best {}{})",
        score,
        tier.as_str(),
        best,
        if new_record { ", new record" } else { "" }
    );
    state.emit(GameEvent::GameOver {
        score,
        best,
        new_record,
    });
}

/// Autopilot: chase the most urgent ball and take the first draft option
fn demo_input(state: &mut GameState, input: &TickInput) -> TickInput {
    let mut input = input.clone();

    if state.phase == GamePhase::Paused(PauseReason::Draft) {
        let swapping = state.roguelite.as_ref().is_some_and(|r| r.pending_swap.is_some());
        if swapping {
            draft::choose_swap_slot(state, 0);
        } else if !draft::choose_draft(state, 0) {
            // Nothing left to offer
            draft::skip_draft(state);
        }
    }

    // Lowest ball heading down, else the lowest ball
    let target = state
        .balls
        .iter()
        .filter(|b| !b.is_clone && b.vel.y > 0.0)
        .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
        .or_else(|| state.balls.iter().max_by(|a, b| a.pos.y.total_cmp(&b.pos.y)));
    if let Some(ball) = target {
        input.pointer_x = Some(ball.pos.x);
    }

    // Spend orbs once they're about to overflow
    if state.phase.is_running() && state.player.orbs >= state.max_orbs() {
        input.skill_slot = Some(0);
    }

    input
}
