//! Game state and core simulation types
//!
//! The whole session lives in one `GameState` value owned by the host loop.
//! Nothing here is global; two states never share entities.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::draft::{DraftChoice, HeldSkill, RogueliteState};
use super::effects::Effects;
use super::progression::{self, Difficulty};
use super::schedule::Scheduler;
use super::skills::SkillKind;
use crate::consts::*;
use crate::highscores::HighScores;

/// How a block's damage shows on its face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrackLevel {
    None,
    Partial,
    Full,
}

/// A destructible block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: u32,
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    /// 1-20; selects the block's tier
    pub max_hp: u32,
    pub hp: u32,
    pub destroyed: bool,
}

impl Block {
    pub fn new(id: u32, pos: Vec2, size: Vec2, max_hp: u32) -> Self {
        let max_hp = max_hp.max(1);
        Self {
            id,
            pos,
            size,
            max_hp,
            hp: max_hp,
            destroyed: false,
        }
    }

    /// Apply damage; returns true only if this call destroyed the block
    pub fn take_damage(&mut self, amount: u32) -> bool {
        if self.destroyed {
            return false;
        }
        self.hp = self.hp.saturating_sub(amount);
        if self.hp == 0 {
            self.destroyed = true;
            return true;
        }
        false
    }

    /// Destroy regardless of remaining HP; returns true if it was alive
    pub fn destroy(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        self.hp = 0;
        self.destroyed = true;
        true
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_pos_size(self.pos, self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    pub fn hp_ratio(&self) -> f32 {
        self.hp as f32 / self.max_hp as f32
    }

    pub fn crack_level(&self) -> CrackLevel {
        let ratio = self.hp_ratio();
        if ratio <= 0.25 {
            CrackLevel::Full
        } else if ratio <= 0.5 {
            CrackLevel::Partial
        } else {
            CrackLevel::None
        }
    }
}

/// A ball entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Target speed used when the direction is rebuilt
    pub speed: f32,
    /// Hard cap on |vel|
    pub max_speed: f32,
    /// Passes through blocks, one-shotting each
    pub penetrating: bool,
    /// Remaining penetration charges
    pub penetrate_count: u32,
    pub max_penetrate_count: u32,
    /// Detonates on its next block hit
    pub explodable: bool,
    pub explode_timer: u32,
    pub explode_duration: u32,
    pub explode_radius: Option<f32>,
    pub explode_count: u32,
    /// Clones cost no HP when lost and deal half damage
    pub is_clone: bool,
    /// Gravity well this ball has reached the core of (by well id)
    pub ignored_gravity_well: Option<u32>,
}

impl Ball {
    pub fn new(id: u32, pos: Vec2, radius: f32) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::new(BALL_DEFAULT_SPEED, -BALL_DEFAULT_SPEED),
            radius,
            speed: BALL_DEFAULT_SPEED,
            max_speed: BALL_MAX_SPEED,
            penetrating: false,
            penetrate_count: 0,
            max_penetrate_count: 0,
            explodable: false,
            explode_timer: 0,
            explode_duration: EXPLODE_DURATION_TICKS,
            explode_radius: None,
            explode_count: 0,
            is_clone: false,
            ignored_gravity_well: None,
        }
    }

    /// Clamp speed, integrate, and run the explode arming timer
    pub fn update(&mut self) {
        self.clamp_speed();
        self.pos += self.vel;

        if self.explodable {
            self.explode_timer += 1;
            if self.explode_timer >= self.explode_duration {
                self.disarm_explode();
            }
        }
    }

    /// Uniformly rescale velocity so |vel| <= max_speed
    pub fn clamp_speed(&mut self) {
        let current = self.vel.length();
        if current > self.max_speed {
            self.vel *= self.max_speed / current;
        }
    }

    /// Rescale velocity to exactly `speed`, keeping direction
    pub fn normalize_speed(&mut self) {
        let current = self.vel.length();
        if current != 0.0 {
            self.vel = self.vel / current * self.speed;
        }
    }

    pub fn enable_penetrate(&mut self, charges: u32) {
        self.penetrating = charges > 0;
        self.max_penetrate_count = charges;
        self.penetrate_count = charges;
    }

    /// Spend one penetration charge
    pub fn use_penetrate(&mut self) {
        if !self.penetrating {
            return;
        }
        self.penetrate_count = self.penetrate_count.saturating_sub(1);
        if self.penetrate_count == 0 {
            self.penetrating = false;
        }
    }

    pub fn enable_explode(&mut self, radius: f32, count: u32) {
        self.explodable = true;
        self.explode_timer = 0;
        self.explode_radius = Some(radius);
        self.explode_count = count.max(1);
    }

    pub fn disarm_explode(&mut self) {
        self.explodable = false;
        self.explode_timer = 0;
        self.explode_count = 0;
    }

    /// Consume one blast; returns the blast radius if the ball was armed
    pub fn take_blast(&mut self) -> Option<f32> {
        if !self.explodable || self.explode_count == 0 {
            return None;
        }
        let radius = self.explode_radius.unwrap_or(DEFAULT_EXPLOSION_RADIUS);
        self.explode_count -= 1;
        if self.explode_count == 0 {
            self.disarm_explode();
        }
        Some(radius)
    }

    /// Damage this ball deals given the current base damage
    pub fn damage(&self, base: u32) -> u32 {
        if self.is_clone { base.div_ceil(2) } else { base }
    }

    pub fn apply_enhancement(&mut self, enhancement: Enhancement) {
        match enhancement {
            Enhancement::Penetrate { charges } => self.enable_penetrate(charges),
            Enhancement::Explode { radius, count } => self.enable_explode(radius, count),
        }
    }
}

/// One-shot effect armed on the paddle, applied to the next ball it touches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Enhancement {
    Penetrate { charges: u32 },
    Explode { radius: f32, count: u32 },
}

impl Enhancement {
    /// Skill that armed this enhancement
    pub fn skill(&self) -> SkillKind {
        match self {
            Enhancement::Penetrate { .. } => SkillKind::Penetrate,
            Enhancement::Explode { .. } => SkillKind::Explode,
        }
    }
}

/// The player's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    pub pos: Vec2,
    pub size: Vec2,
    /// Keyboard movement per tick
    pub speed: f32,
    /// Pending one-shot effect
    pub enhancement: Option<Enhancement>,
    pub invincible: bool,
}

impl Paddle {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            size,
            speed: PADDLE_SPEED,
            enhancement: None,
            invincible: false,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_pos_size(self.pos, self.size)
    }

    pub fn center_x(&self) -> f32 {
        self.pos.x + self.size.x / 2.0
    }

    pub fn move_left(&mut self, field_width: f32) {
        self.pos.x = (self.pos.x - self.speed).clamp(0.0, (field_width - self.size.x).max(0.0));
    }

    pub fn move_right(&mut self, field_width: f32) {
        self.pos.x = (self.pos.x + self.speed).clamp(0.0, (field_width - self.size.x).max(0.0));
    }

    /// Center the paddle on `target_x`
    pub fn move_to(&mut self, target_x: f32, field_width: f32) {
        let x = target_x - self.size.x / 2.0;
        self.pos.x = x.clamp(0.0, (field_width - self.size.x).max(0.0));
    }

    pub fn is_enhanced(&self) -> bool {
        self.enhancement.is_some()
    }

    pub fn enhance(&mut self, enhancement: Enhancement) {
        self.enhancement = Some(enhancement);
    }

    /// Consume the pending enhancement on ball contact
    pub fn take_enhance(&mut self) -> Option<Enhancement> {
        self.enhancement.take()
    }

    /// Clear the pending enhancement, returning it so its cost can be refunded
    pub fn reset_enhance(&mut self) -> Option<Enhancement> {
        self.enhancement.take()
    }
}

/// Falling currency pickup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Orb {
    pub pos: Vec2,
    pub radius: f32,
    pub speed: f32,
    pub value: u32,
    pub collected: bool,
}

impl Orb {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            radius: ORB_RADIUS,
            speed: ORB_FALL_SPEED,
            value: ORB_VALUE,
            collected: false,
        }
    }

    pub fn update(&mut self) {
        self.pos.y += self.speed;
    }

    /// Drift horizontally toward `target` when within `range`
    pub fn absorb_toward(&mut self, target: Vec2, range: f32) {
        let delta = target - self.pos;
        let distance = delta.length();
        if distance >= range || distance == 0.0 {
            return;
        }
        let pull = 0.05 * (1.0 - distance / range);
        self.pos.x += delta.x * pull;
    }

    /// Center x within the paddle, vertical extent touching it
    pub fn check_collision_with_paddle(&self, paddle: &Paddle) -> bool {
        let b = paddle.bounds();
        self.pos.x >= b.left
            && self.pos.x <= b.right
            && self.pos.y + self.radius >= b.top
            && self.pos.y - self.radius <= b.bottom
    }
}

/// Player/session counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// May dip below zero on the tick that ends the run
    pub hp: i32,
    pub max_hp: i32,
    pub score: u64,
    pub orbs: u32,
    pub combo: u32,
    /// Bonus percentage derived from combo
    pub combo_bonus: u32,
    pub invincible: bool,
}

impl Player {
    pub fn new(initial_orbs: u32) -> Self {
        Self {
            hp: PLAYER_MAX_HP,
            max_hp: PLAYER_MAX_HP,
            score: 0,
            orbs: initial_orbs,
            combo: 0,
            combo_bonus: 0,
            invincible: false,
        }
    }
}

/// Why play is suspended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PauseReason {
    /// Pause requested by the player
    Player,
    /// Roguelite draft is open
    Draft,
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No session running
    Idle,
    /// 3-2-1 before play starts
    Countdown { ticks_left: u32 },
    /// Active gameplay
    Running,
    Paused(PauseReason),
    /// Run ended; only an explicit restart leaves this state
    GameOver,
}

impl GamePhase {
    pub fn is_running(&self) -> bool {
        matches!(self, GamePhase::Running)
    }
}

/// Game mode for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    /// Fixed difficulty and a pre-chosen skill loadout
    Normal(Difficulty),
    /// Time-driven difficulty with drafted abilities and skills
    Roguelite,
}

/// Held/pointer input carried between ticks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlState {
    pub left: bool,
    pub right: bool,
    pub pointer_x: f32,
    /// Last input came from a pointer rather than the keyboard
    pub use_pointer: bool,
}

/// One-way notifications for the UI shell
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    HpChanged { hp: i32, max_hp: i32 },
    ScoreChanged(u64),
    OrbsChanged { orbs: u32, max_orbs: u32 },
    ComboChanged { combo: u32, bonus: u32 },
    DamageFlash,
    CountdownShown(u32),
    CountdownHidden,
    PauseChanged(bool),
    SkillArmed { skill: SkillKind, armed: bool },
    LoadoutChanged(Vec<SkillKind>),
    DifficultyChanged { tier: Difficulty, multiplier: f32 },
    DraftOffered { choices: Vec<DraftChoice>, can_reroll: bool },
    DraftClosed,
    SwapOffered { held: Vec<HeldSkill>, incoming: SkillKind },
    SwapClosed,
    GameOver { score: u64, best: u64, new_record: bool },
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    /// Play field size
    pub width: f32,
    pub height: f32,
    /// Derived from width and the column count
    pub block_width: f32,
    pub mode: GameMode,
    /// Tier currently in effect (moves over time in roguelite)
    pub difficulty: Difficulty,
    pub phase: GamePhase,
    pub player: Player,
    pub paddle: Paddle,
    pub balls: Vec<Ball>,
    pub blocks: Vec<Block>,
    pub orbs: Vec<Orb>,
    pub effects: Effects,
    /// Ticks since the last row spawned
    pub block_spawn_timer: u32,
    pub control: ControlState,
    /// Skills bound to slots 0..3
    pub loadout: Vec<SkillKind>,
    /// Present only in roguelite mode
    pub roguelite: Option<RogueliteState>,
    pub high_scores: HighScores,
    pub scheduler: Scheduler,
    /// Host ticks, advancing in every phase
    pub clock: u64,
    /// Bumped on every session (re)start; stale deferred actions compare against it
    pub epoch: u32,
    /// Pending UI notifications
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Create an idle state for a play field of the given size
    pub fn new(width: f32, height: f32, seed: u64) -> Self {
        let block_width = (width - BLOCK_PADDING * (BLOCK_COLS as f32 + 1.0)) / BLOCK_COLS as f32;
        let paddle = Paddle::new(
            Vec2::new((width - PADDLE_WIDTH) / 2.0, height - PADDLE_HEIGHT - PADDLE_BOTTOM_MARGIN),
            Vec2::new(PADDLE_WIDTH, PADDLE_HEIGHT),
        );

        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            width,
            height,
            block_width,
            mode: GameMode::Normal(Difficulty::Normal),
            difficulty: Difficulty::Normal,
            phase: GamePhase::Idle,
            player: Player::new(0),
            paddle,
            balls: Vec::new(),
            blocks: Vec::new(),
            orbs: Vec::new(),
            effects: Effects::default(),
            block_spawn_timer: 0,
            control: ControlState::default(),
            loadout: Vec::new(),
            roguelite: None,
            high_scores: HighScores::default(),
            scheduler: Scheduler::default(),
            clock: 0,
            epoch: 0,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all pending notifications
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Begin a fresh session: reset everything and start the countdown
    pub fn start_session(&mut self, mode: GameMode, loadout: &[SkillKind]) {
        self.epoch += 1;
        self.scheduler.clear();
        self.mode = mode;

        match mode {
            GameMode::Normal(difficulty) => {
                self.difficulty = difficulty;
                self.roguelite = None;
                self.loadout = normalize_loadout(loadout);
            }
            GameMode::Roguelite => {
                self.difficulty = Difficulty::Easy;
                self.roguelite = Some(RogueliteState::new());
                self.loadout = Vec::new();
            }
        }

        self.player = Player::new(self.difficulty.params().initial_orbs);
        self.balls.clear();
        self.blocks.clear();
        self.orbs.clear();
        self.effects.clear();
        self.block_spawn_timer = 0;
        self.control = ControlState::default();

        self.create_paddle();
        self.create_initial_blocks();
        self.spawn_serve_ball();

        self.phase = GamePhase::Countdown {
            ticks_left: COUNTDOWN_TICKS,
        };

        log::info!(
            "Session {} started: {:?}, {} blocks, loadout {:?}",
            self.epoch,
            mode,
            self.blocks.len(),
            self.loadout
        );

        self.emit(GameEvent::HpChanged {
            hp: self.player.hp,
            max_hp: self.player.max_hp,
        });
        self.emit(GameEvent::ScoreChanged(0));
        self.emit_orbs();
        self.emit(GameEvent::ComboChanged { combo: 0, bonus: 0 });
        self.emit(GameEvent::LoadoutChanged(self.loadout.clone()));
        self.emit(GameEvent::DifficultyChanged {
            tier: self.difficulty,
            multiplier: 1.0,
        });
        self.emit(GameEvent::CountdownShown(COUNTDOWN_TICKS / TICKS_PER_SECOND));
    }

    /// Start over with the same mode and loadout
    pub fn restart(&mut self) {
        let loadout = self.loadout.clone();
        self.start_session(self.mode, &loadout);
    }

    /// Leave the session; pending deferred actions are dropped
    pub fn return_to_idle(&mut self) {
        self.epoch += 1;
        self.scheduler.clear();
        self.phase = GamePhase::Idle;
    }

    /// Player-requested pause toggle
    pub fn toggle_pause(&mut self) {
        match self.phase {
            GamePhase::Running => {
                self.phase = GamePhase::Paused(PauseReason::Player);
                self.emit(GameEvent::PauseChanged(true));
            }
            GamePhase::Paused(PauseReason::Player) => {
                self.phase = GamePhase::Running;
                self.emit(GameEvent::PauseChanged(false));
            }
            _ => {}
        }
    }

    fn create_paddle(&mut self) {
        self.paddle = Paddle::new(
            Vec2::new(
                (self.width - PADDLE_WIDTH) / 2.0,
                self.height - PADDLE_HEIGHT - PADDLE_BOTTOM_MARGIN,
            ),
            Vec2::new(PADDLE_WIDTH, PADDLE_HEIGHT),
        );
    }

    /// Replace all balls with a fresh serve from the paddle
    pub fn spawn_serve_ball(&mut self) {
        let id = self.next_entity_id();
        let pos = Vec2::new(self.paddle.center_x(), self.paddle.pos.y - 15.0);
        let mut ball = Ball::new(id, pos, SERVE_BALL_RADIUS);

        let jitter = self.rng.random_range(-SERVE_ANGLE_JITTER..SERVE_ANGLE_JITTER);
        let angle = -std::f32::consts::FRAC_PI_2 + jitter;
        ball.speed = SERVE_BALL_SPEED;
        ball.vel = Vec2::new(angle.cos(), angle.sin()) * SERVE_BALL_SPEED;

        self.balls = vec![ball];
    }

    /// Number of balls whose loss costs HP
    pub fn normal_ball_count(&self) -> usize {
        self.balls.iter().filter(|b| !b.is_clone).count()
    }

    fn column_x(&self, col: usize) -> f32 {
        BLOCK_PADDING + col as f32 * (self.block_width + BLOCK_PADDING)
    }

    fn create_initial_blocks(&mut self) {
        let ratio = self.difficulty.params().high_hp_ratio;
        for row in 0..BLOCK_ROWS {
            for col in 0..BLOCK_COLS {
                let pos = Vec2::new(
                    self.column_x(col),
                    BLOCK_PADDING + row as f32 * (BLOCK_HEIGHT + BLOCK_PADDING),
                );
                let roll: f32 = self.rng.random();
                let hp = progression::base_hp_from_roll(roll, ratio);
                let id = self.next_entity_id();
                self.blocks
                    .push(Block::new(id, pos, Vec2::new(self.block_width, BLOCK_HEIGHT), hp));
            }
        }
    }

    /// Spawn a full-width row just above the visible field
    pub fn spawn_block_row(&mut self) {
        let ratio = self.difficulty.params().high_hp_ratio;
        let multiplier = self.extreme_multiplier();
        for col in 0..BLOCK_COLS {
            let pos = Vec2::new(self.column_x(col), -BLOCK_HEIGHT);
            let hp = progression::roll_block_hp(&mut self.rng, ratio, multiplier);
            let id = self.next_entity_id();
            self.blocks
                .push(Block::new(id, pos, Vec2::new(self.block_width, BLOCK_HEIGHT), hp));
        }
    }

    /// Roguelite extreme multiplier, 1.0 otherwise
    pub fn extreme_multiplier(&self) -> f32 {
        self.roguelite
            .as_ref()
            .map(|r| r.extreme_multiplier)
            .unwrap_or(1.0)
    }

    /// Scoring, combo, and orb drop for one destroyed block
    pub fn on_block_destroyed(&mut self, block: &Block) {
        self.player.combo += 1;
        self.player.combo_bonus = progression::combo_bonus(self.player.combo);
        self.player.score += progression::block_score(block.max_hp, self.player.combo_bonus);

        self.emit(GameEvent::ComboChanged {
            combo: self.player.combo,
            bonus: self.player.combo_bonus,
        });
        self.emit(GameEvent::ScoreChanged(self.player.score));

        let drop_rate = progression::orb_drop_rate(self.orb_drop_bonus());
        if self.rng.random::<f32>() < drop_rate {
            self.orbs.push(Orb::new(block.center()));
        }
    }

    /// Score every block in the list, in order
    pub fn on_blocks_destroyed(&mut self, blocks: &[Block]) {
        for block in blocks {
            self.on_block_destroyed(block);
        }
    }

    pub fn reset_combo(&mut self) {
        self.player.combo = 0;
        self.player.combo_bonus = 0;
        self.emit(GameEvent::ComboChanged { combo: 0, bonus: 0 });
    }

    /// Subtract HP and break the combo
    pub fn damage_player(&mut self, amount: i32) {
        self.player.hp -= amount;
        self.reset_combo();
        self.emit(GameEvent::HpChanged {
            hp: self.player.hp,
            max_hp: self.player.max_hp,
        });
    }

    /// Add orbs up to the current cap
    pub fn add_orbs(&mut self, amount: u32) {
        self.player.orbs = progression::add_orbs_capped(self.player.orbs, amount, self.max_orbs());
        self.emit_orbs();
    }

    /// Deduct `cost` if affordable
    pub fn try_spend_orbs(&mut self, cost: u32) -> bool {
        if self.player.orbs < cost {
            return false;
        }
        self.player.orbs -= cost;
        self.emit_orbs();
        true
    }

    pub(crate) fn emit_orbs(&mut self) {
        let max_orbs = self.max_orbs();
        self.emit(GameEvent::OrbsChanged {
            orbs: self.player.orbs,
            max_orbs,
        });
    }
}

/// Drop duplicates and keep at most three skills
pub fn normalize_loadout(loadout: &[SkillKind]) -> Vec<SkillKind> {
    let mut out: Vec<SkillKind> = Vec::with_capacity(MAX_HELD_SKILLS);
    for &skill in loadout {
        if out.len() == MAX_HELD_SKILLS {
            break;
        }
        if !out.contains(&skill) {
            out.push(skill);
        }
    }
    out
}
