//! Swift Orbit - a descending-block breakout game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, collisions, skills, progression)
//! - `session`: Host loop that drives the simulation once per frame
//! - `ui`: Outbound notification and render collaborator traits
//! - `highscores`: Per-difficulty records and their persistence
//! - `settings`: Runtime configuration

pub mod error;
pub mod highscores;
pub mod session;
pub mod settings;
pub mod sim;
pub mod ui;

pub use error::{GameError, GameResult};
pub use highscores::{HighScoreStore, HighScores, JsonFileStore, MemoryStore};
pub use session::Session;
pub use settings::{ModeSetting, Settings};

/// Game configuration constants
pub mod consts {
    /// Simulation rate: one tick per rendered frame
    pub const TICKS_PER_SECOND: u32 = 60;
    /// Fixed simulation timestep in seconds
    pub const SIM_DT: f32 = 1.0 / TICKS_PER_SECOND as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Default play field
    pub const CANVAS_WIDTH: f32 = 480.0;
    pub const CANVAS_HEIGHT: f32 = 720.0;

    /// Block grid
    pub const BLOCK_ROWS: usize = 5;
    pub const BLOCK_COLS: usize = 10;
    pub const BLOCK_HEIGHT: f32 = 30.0;
    pub const BLOCK_PADDING: f32 = 4.0;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 120.0;
    pub const PADDLE_HEIGHT: f32 = 15.0;
    pub const PADDLE_BOTTOM_MARGIN: f32 = 20.0;
    pub const PADDLE_SPEED: f32 = 10.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 8.0;
    pub const BALL_DEFAULT_SPEED: f32 = 4.8;
    /// Hard cap on velocity magnitude, applied before every integration step
    pub const BALL_MAX_SPEED: f32 = 4.2;
    /// Served ball (fresh round or respawn)
    pub const SERVE_BALL_RADIUS: f32 = 10.0;
    pub const SERVE_BALL_SPEED: f32 = 7.0;
    /// Serve angle jitter around straight up (radians)
    pub const SERVE_ANGLE_JITTER: f32 = 0.2;
    /// Ticks an explode-armed ball stays armed without hitting anything
    pub const EXPLODE_DURATION_TICKS: u32 = 300;

    /// Paddle bounce: offset ratio -0.5..0.5 maps to +-0.35 pi
    pub const PADDLE_BOUNCE_SPREAD: f32 = std::f32::consts::PI * 0.7;
    /// Fraction of block height treated as an edge for horizontal hits
    pub const BLOCK_EDGE_ZONE: f32 = 0.15;
    /// Vertical kick (times ball speed) after an edge hit
    pub const BLOCK_EDGE_KICK: f32 = 0.3;

    /// Orb pickups
    pub const ORB_RADIUS: f32 = 10.0;
    pub const ORB_FALL_SPEED: f32 = 3.0;
    pub const ORB_VALUE: u32 = 10;
    pub const ORB_BASE_DROP_RATE: f32 = 0.3;

    /// Player
    pub const PLAYER_MAX_HP: i32 = 10;

    /// 3-2-1 countdown before play
    pub const COUNTDOWN_TICKS: u32 = 3 * TICKS_PER_SECOND;
    /// Delay before a lost ball is replaced (~500 ms)
    pub const RESPAWN_DELAY_TICKS: u64 = 30;
    /// Delay between closing and reopening a rerolled draft (~100 ms)
    pub const DRAFT_REOPEN_DELAY_TICKS: u64 = 6;

    /// Explosions
    pub const EXPLOSION_DAMAGE: u32 = 4;
    pub const DEFAULT_EXPLOSION_RADIUS: f32 = 150.0;

    /// Gravity wells
    pub const GRAVITY_CORE_RADIUS: f32 = 15.0;
    pub const GRAVITY_BASE_PULL: f32 = 0.30;
    pub const GRAVITY_DURATION_TICKS: u32 = 600;

    /// Roguelite
    pub const MAX_HELD_SKILLS: usize = 3;
    pub const DRAFT_CHOICE_COUNT: usize = 3;
    pub const REROLL_HP_COST: i32 = 5;
}

/// Convert seconds of game time to ticks
#[inline]
pub fn secs_to_ticks(secs: f32) -> u64 {
    (secs * consts::TICKS_PER_SECOND as f32).round() as u64
}
