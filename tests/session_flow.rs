//! End-to-end session tests through the public `Session` API.
//!
//! Everything runs headless: an in-memory high-score store, a UI sink that
//! records what it was told, and the null renderer.

use glam::Vec2;
use swift_orbit::consts::{COUNTDOWN_TICKS, DRAFT_REOPEN_DELAY_TICKS, RESPAWN_DELAY_TICKS};
use swift_orbit::highscores::{HighScores, MemoryStore};
use swift_orbit::settings::Settings;
use swift_orbit::sim::{Difficulty, DraftChoice, GameMode, GamePhase, PauseReason, TickInput};
use swift_orbit::ui::{NullRenderer, UiSink};
use swift_orbit::Session;

// ── Helpers ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct RecordingUi {
    hp: Vec<i32>,
    combos: Vec<u32>,
    countdown: Vec<u32>,
    countdown_hidden: usize,
    drafts: Vec<(Vec<DraftChoice>, bool)>,
    drafts_closed: usize,
    game_over: Option<(u64, u64, bool)>,
}

impl UiSink for RecordingUi {
    fn update_hp(&mut self, hp: i32, _max_hp: i32) {
        self.hp.push(hp);
    }

    fn update_combo(&mut self, combo: u32, _bonus: u32) {
        self.combos.push(combo);
    }

    fn show_countdown(&mut self, seconds: u32) {
        self.countdown.push(seconds);
    }

    fn hide_countdown(&mut self) {
        self.countdown_hidden += 1;
    }

    fn show_draft(&mut self, choices: &[DraftChoice], can_reroll: bool) {
        self.drafts.push((choices.to_vec(), can_reroll));
    }

    fn hide_draft(&mut self) {
        self.drafts_closed += 1;
    }

    fn show_game_over(&mut self, score: u64, best: u64, new_record: bool) {
        self.game_over = Some((score, best, new_record));
    }
}

type TestSession = Session<MemoryStore, RecordingUi, NullRenderer>;

fn session_with(store: MemoryStore) -> TestSession {
    let settings = Settings {
        seed: Some(2024),
        ..Settings::default()
    };
    Session::new(&settings, store, RecordingUi::default(), NullRenderer::default())
}

fn run_frames(session: &mut TestSession, n: u64) {
    for _ in 0..n {
        session.frame(&TickInput::default());
    }
}

/// Start a session and sit through the 3-2-1
fn started(mode: GameMode, store: MemoryStore) -> TestSession {
    let mut session = session_with(store);
    session.start(mode, &[]);
    run_frames(&mut session, COUNTDOWN_TICKS as u64);
    assert_eq!(session.state.phase, GamePhase::Running);
    session
}

/// Push the only ball off the bottom of the field
fn drop_ball(session: &mut TestSession) {
    let below = session.state.height + 50.0;
    let ball = &mut session.state.balls[0];
    ball.pos = Vec2::new(240.0, below);
    ball.vel = Vec2::new(0.0, 4.0);
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn countdown_runs_three_two_one() {
    let session = started(GameMode::Normal(Difficulty::Easy), MemoryStore::default());
    assert_eq!(session.ui().countdown, vec![3, 2, 1]);
    assert_eq!(session.ui().countdown_hidden, 1);
    // One render per frame, countdown included
    assert_eq!(session.renderer().frames, COUNTDOWN_TICKS as u64);
}

#[test]
fn lost_ball_costs_hp_and_respawns_later() {
    let mut session = started(GameMode::Normal(Difficulty::Easy), MemoryStore::default());
    session.state.player.combo = 12;

    drop_ball(&mut session);
    run_frames(&mut session, 1);

    assert_eq!(session.state.player.hp, 9);
    assert_eq!(session.state.player.combo, 0);
    assert_eq!(session.ui().hp.last(), Some(&9));
    assert_eq!(session.ui().combos.last(), Some(&0));
    assert!(session.state.balls.is_empty());

    run_frames(&mut session, RESPAWN_DELAY_TICKS - 1);
    assert!(session.state.balls.is_empty());

    run_frames(&mut session, 1);
    assert_eq!(session.state.balls.len(), 1);
    assert!(!session.state.balls[0].is_clone);
}

#[test]
fn new_record_is_saved_once() {
    let store = MemoryStore::with_scores(HighScores {
        easy: 100,
        ..HighScores::default()
    });
    let mut session = started(GameMode::Normal(Difficulty::Easy), store);
    assert_eq!(session.state.high_scores.easy, 100);

    session.state.player.hp = 1;
    session.state.player.score = 500;
    drop_ball(&mut session);
    run_frames(&mut session, 1);

    assert_eq!(session.state.phase, GamePhase::GameOver);
    assert_eq!(session.ui().game_over, Some((500, 500, true)));
    assert_eq!(session.store().saves, 1);
    assert_eq!(session.store().scores.easy, 500);

    // Game over is terminal: more frames neither respawn nor re-save
    run_frames(&mut session, RESPAWN_DELAY_TICKS + 5);
    assert_eq!(session.state.phase, GamePhase::GameOver);
    assert!(session.state.balls.is_empty());
    assert_eq!(session.store().saves, 1);
}

#[test]
fn score_below_record_is_not_saved() {
    let store = MemoryStore::with_scores(HighScores {
        hard: 9000,
        ..HighScores::default()
    });
    let mut session = started(GameMode::Normal(Difficulty::Hard), store);

    session.state.player.hp = 1;
    session.state.player.score = 800;
    drop_ball(&mut session);
    run_frames(&mut session, 1);

    assert_eq!(session.ui().game_over, Some((800, 9000, false)));
    assert_eq!(session.store().saves, 0);
}

#[test]
fn restart_after_game_over_starts_fresh() {
    let mut session = started(GameMode::Normal(Difficulty::Normal), MemoryStore::default());
    session.state.player.hp = 1;
    drop_ball(&mut session);
    run_frames(&mut session, 1);
    assert_eq!(session.state.phase, GamePhase::GameOver);

    session.restart();
    assert!(matches!(session.state.phase, GamePhase::Countdown { .. }));
    assert_eq!(session.state.player.hp, 10);
    assert_eq!(session.state.player.score, 0);
    assert_eq!(session.state.balls.len(), 1);
}

#[test]
fn roguelite_draft_pick_and_reroll() {
    let mut session = started(GameMode::Roguelite, MemoryStore::default());
    assert!(session.state.loadout.is_empty());

    session.state.player.score = 2000;
    run_frames(&mut session, 1);
    assert_eq!(session.state.phase, GamePhase::Paused(PauseReason::Draft));
    assert_eq!(session.ui().drafts.len(), 1);
    let (first, can_reroll) = session.ui().drafts[0].clone();
    assert_eq!(first.len(), 3);
    assert!(can_reroll);

    // Frames while the draft is open change nothing
    run_frames(&mut session, 10);
    assert_eq!(session.ui().drafts.len(), 1);

    assert!(session.reroll_draft());
    assert_eq!(session.state.player.hp, 5);
    assert_eq!(session.ui().drafts_closed, 1);
    // A second reroll is refused until the draft reopens
    assert!(!session.reroll_draft());

    run_frames(&mut session, DRAFT_REOPEN_DELAY_TICKS);
    assert_eq!(session.ui().drafts.len(), 2);
    let (_, can_reroll) = session.ui().drafts[1].clone();
    assert!(!can_reroll);

    assert!(session.choose_draft(0));
    assert_eq!(session.state.phase, GamePhase::Running);
    let roguelite = session.state.roguelite.as_ref().unwrap();
    assert_eq!(roguelite.next_draft_index, 1);
    assert!(!roguelite.selecting);
}
