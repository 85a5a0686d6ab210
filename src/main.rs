//! Swift Orbit entry point
//!
//! Headless runner: loads settings, then lets the autopilot play for a fixed
//! number of frames. Usage: `swift-orbit [settings.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::path::Path;

    use swift_orbit::highscores::{HighScoreStore, JsonFileStore, MemoryStore};
    use swift_orbit::settings::Settings;

    env_logger::init();
    log::info!("Swift Orbit (headless) starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load_or_default(Path::new(&path)),
        None => {
            log::info!("Using default settings");
            Settings::default()
        }
    };

    match settings.high_score_path.clone() {
        Some(path) => run(&settings, JsonFileStore::new(path)),
        None => run(&settings, MemoryStore::default()),
    }

    fn run<S: HighScoreStore>(settings: &Settings, store: S) {
        use swift_orbit::Session;
        use swift_orbit::sim::{GamePhase, TickInput};
        use swift_orbit::ui::{LogUi, NullRenderer};

        let mut session = Session::new(settings, store, LogUi, NullRenderer::default());
        session.start(settings.mode.game_mode(), settings.mode.loadout());

        let input = TickInput {
            demo: true,
            ..TickInput::default()
        };
        let mut games = 1;
        for _ in 0..settings.demo_frames {
            if session.state.phase == GamePhase::GameOver {
                games += 1;
                session.restart();
            }
            session.frame(&input);
        }

        let state = &session.state;
        log::info!(
            "Demo finished after {} frames, {} game(s): score {}, hp {}, tier {}",
            settings.demo_frames,
            games,
            state.player.score,
            state.player.hp,
            state.difficulty.as_str()
        );
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser shell drives `Session` directly; nothing to do here
}
