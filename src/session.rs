//! Host loop around the simulation
//!
//! A `Session` owns the game state plus its three collaborators: high-score
//! storage, the HUD sink and the renderer. Wall-clock frame time goes in,
//! fixed ticks come out, and every frame ends with exactly one render.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::highscores::{HighScoreStore, HighScores};
use crate::settings::Settings;
use crate::sim::draft;
use crate::sim::skills::{self, SkillKind};
use crate::sim::state::{GameEvent, GameMode, GameState};
use crate::sim::tick::{TickInput, tick};
use crate::ui::{RenderSink, UiSink, dispatch};

/// Longest frame time fed into the accumulator
const MAX_FRAME_DT: f32 = 0.1;

pub struct Session<S, U, R> {
    pub state: GameState,
    /// Held input applied on every substep of `advance`
    pub input: TickInput,
    store: S,
    ui: U,
    renderer: R,
    accumulator: f32,
}

impl<S: HighScoreStore, U: UiSink, R: RenderSink> Session<S, U, R> {
    pub fn new(settings: &Settings, store: S, ui: U, renderer: R) -> Self {
        let seed = settings.seed.unwrap_or_else(clock_seed);
        log::info!("Session seed {}", seed);

        Self {
            state: GameState::new(settings.width, settings.height, seed),
            input: TickInput::default(),
            store,
            ui,
            renderer,
            accumulator: 0.0,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Start a session; high scores are reloaded first
    pub fn start(&mut self, mode: GameMode, loadout: &[SkillKind]) {
        self.state.high_scores = self.load_high_scores();
        self.reset_timing();
        self.state.start_session(mode, loadout);
        self.flush_events();
    }

    /// Same mode and loadout as the last session
    pub fn restart(&mut self) {
        self.state.high_scores = self.load_high_scores();
        self.reset_timing();
        self.state.restart();
        self.flush_events();
    }

    pub fn return_to_idle(&mut self) {
        self.reset_timing();
        self.state.return_to_idle();
        self.flush_events();
    }

    /// Run exactly one tick with `input`, then render
    pub fn frame(&mut self, input: &TickInput) {
        self.step(input);
        self.renderer.render(&self.state);
    }

    /// Feed wall-clock time; runs as many fixed ticks as fit (at most
    /// `MAX_SUBSTEPS`) and renders once. Returns the ticks run.
    pub fn advance(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = self.input.clone();
            self.step(&input);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.input.pause = false;
            self.input.skill_slot = None;
            self.input.cancel_skill = false;
        }

        self.renderer.render(&self.state);
        substeps
    }

    pub fn activate_skill(&mut self, slot: usize) -> bool {
        let accepted = skills::activate_slot(&mut self.state, slot);
        self.flush_events();
        accepted
    }

    pub fn cancel_skill(&mut self) -> bool {
        let cancelled = skills::cancel_skill(&mut self.state);
        self.flush_events();
        cancelled
    }

    pub fn toggle_pause(&mut self) {
        self.state.toggle_pause();
        self.flush_events();
    }

    /// Draft overlay callback: take choice `index`
    pub fn choose_draft(&mut self, index: usize) -> bool {
        let taken = draft::choose_draft(&mut self.state, index);
        self.flush_events();
        taken
    }

    /// Swap overlay callback: replace held skill `slot`
    pub fn choose_swap_slot(&mut self, slot: usize) -> bool {
        let swapped = draft::choose_swap_slot(&mut self.state, slot);
        self.flush_events();
        swapped
    }

    pub fn cancel_swap(&mut self) -> bool {
        let cancelled = draft::cancel_swap(&mut self.state);
        self.flush_events();
        cancelled
    }

    pub fn skip_draft(&mut self) -> bool {
        let skipped = draft::skip_draft(&mut self.state);
        self.flush_events();
        skipped
    }

    pub fn reroll_draft(&mut self) -> bool {
        let rerolled = draft::reroll_draft(&mut self.state);
        self.flush_events();
        rerolled
    }

    fn step(&mut self, input: &TickInput) {
        tick(&mut self.state, input);
        self.flush_events();
    }

    fn reset_timing(&mut self) {
        self.accumulator = 0.0;
        self.input = TickInput::default();
    }

    /// Persist new records, then hand every pending event to the UI
    fn flush_events(&mut self) {
        for event in self.state.drain_events() {
            if let GameEvent::GameOver { new_record: true, .. } = event {
                self.save_high_scores();
            }
            dispatch(&mut self.ui, &event);
        }
    }

    fn load_high_scores(&mut self) -> HighScores {
        match self.store.load() {
            Ok(scores) => scores,
            Err(e) => {
                log::warn!("Failed to load high scores: {}", e);
                HighScores::default()
            }
        }
    }

    fn save_high_scores(&mut self) {
        let scores = self.state.high_scores;
        if let Err(e) = self.store.save(&scores) {
            log::warn!("Failed to save high scores: {}", e);
        }
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::COUNTDOWN_TICKS;
    use crate::error::{GameError, GameResult};
    use crate::highscores::MemoryStore;
    use crate::sim::progression::Difficulty;
    use crate::sim::state::GamePhase;
    use crate::ui::{LogUi, NullRenderer};

    fn session() -> Session<MemoryStore, LogUi, NullRenderer> {
        let settings = Settings {
            seed: Some(11),
            ..Settings::default()
        };
        Session::new(&settings, MemoryStore::default(), LogUi, NullRenderer::default())
    }

    struct BrokenStore;

    impl HighScoreStore for BrokenStore {
        fn load(&mut self) -> GameResult<HighScores> {
            Err(GameError::Io {
                path: "scores.json".into(),
                source: std::io::Error::other("disk gone"),
            })
        }

        fn save(&mut self, _scores: &HighScores) -> GameResult<()> {
            Err(GameError::Io {
                path: "scores.json".into(),
                source: std::io::Error::other("disk gone"),
            })
        }
    }

    #[test]
    fn test_advance_caps_substeps() {
        let mut s = session();
        s.start(GameMode::Normal(Difficulty::Easy), &[]);

        // A long hitch is clamped and then capped
        let ran = s.advance(1.0);
        assert_eq!(ran, MAX_SUBSTEPS);
        assert_eq!(s.state.clock, MAX_SUBSTEPS as u64);
        assert_eq!(s.renderer().frames, 1);
    }

    #[test]
    fn test_advance_accumulates_partial_frames() {
        let mut s = session();
        s.start(GameMode::Normal(Difficulty::Easy), &[]);

        assert_eq!(s.advance(SIM_DT * 0.6), 0);
        assert_eq!(s.advance(SIM_DT * 0.6), 1);
        // Render happens even when no tick ran
        assert_eq!(s.renderer().frames, 2);
    }

    #[test]
    fn test_one_shot_inputs_cleared() {
        let mut s = session();
        s.start(GameMode::Normal(Difficulty::Easy), &[]);
        for _ in 0..COUNTDOWN_TICKS {
            s.frame(&TickInput::default());
        }
        assert_eq!(s.state.phase, GamePhase::Running);

        s.input.pause = true;
        s.advance(SIM_DT * 2.5);
        // Toggled once, not once per substep
        assert!(matches!(s.state.phase, GamePhase::Paused(_)));
        assert!(!s.input.pause);
    }

    #[test]
    fn test_frame_renders_in_every_phase() {
        let mut s = session();
        s.frame(&TickInput::default());
        assert_eq!(s.state.phase, GamePhase::Idle);
        assert_eq!(s.renderer().frames, 1);
    }

    #[test]
    fn test_broken_store_is_not_fatal() {
        let settings = Settings {
            seed: Some(5),
            ..Settings::default()
        };
        let mut s = Session::new(&settings, BrokenStore, LogUi, NullRenderer::default());
        s.start(GameMode::Normal(Difficulty::Hard), &[]);
        assert_eq!(s.state.high_scores, HighScores::default());

        s.state.phase = GamePhase::Running;
        s.state.player.score = 300;
        s.state.player.hp = 0;
        s.frame(&TickInput::default());
        assert_eq!(s.state.phase, GamePhase::GameOver);
        assert_eq!(s.state.high_scores.get(Difficulty::Hard), 300);
    }

    #[test]
    fn test_restart_reloads_scores() {
        let mut s = session();
        s.start(GameMode::Normal(Difficulty::Normal), &[]);
        s.state.high_scores = HighScores::default();
        s.state.high_scores.record(Difficulty::Normal, 1);

        s.restart();
        // Store still holds zeros; the in-memory tweak is replaced
        assert_eq!(s.state.high_scores, HighScores::default());
        assert!(matches!(s.state.phase, GamePhase::Countdown { .. }));
    }
}
