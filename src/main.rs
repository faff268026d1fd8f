//! Cosmo Pong entry point
//!
//! Handles platform-specific initialization and hosts the simulation loop.
//! On the web the JS renderer/UI drives [`web::WebGame::frame`] from
//! requestAnimationFrame; on native a headless AI-vs-AI demo exercises the
//! full match loop.

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::prelude::*;

    use cosmo_pong::sim::{GameEvent, MatchState, TickInput, tick};
    use cosmo_pong::{GameConfig, MatchHistory, MatchRecord};

    /// What the renderer/UI gets back from every frame call
    #[derive(serde::Serialize)]
    struct FramePacket<'a> {
        state: &'a MatchState,
        events: &'a [GameEvent],
    }

    /// Host bridge owning the match; the JS side renders, plays audio, and
    /// feeds input
    #[wasm_bindgen]
    pub struct WebGame {
        state: MatchState,
        config: GameConfig,
        history: MatchHistory,
        input: TickInput,
        last_time_ms: f64,
    }

    #[wasm_bindgen]
    impl WebGame {
        #[wasm_bindgen(constructor)]
        pub fn new() -> WebGame {
            console_error_panic_hook::set_once();
            let _ = console_log::init_with_level(log::Level::Info);

            let config = GameConfig::load().sanitized();
            let seed = js_sys::Date::now() as u64;
            log::info!("WebGame created with seed {seed}");

            WebGame {
                state: MatchState::new(seed, &config),
                config,
                history: MatchHistory::load(),
                input: TickInput::default(),
                last_time_ms: 0.0,
            }
        }

        /// One-shot commands from the UI layer; consumed by the next frame
        pub fn start(&mut self) {
            self.input.start = true;
        }

        pub fn toggle_pause(&mut self) {
            self.input.pause = true;
        }

        pub fn to_menu(&mut self) {
            self.input.to_menu = true;
        }

        /// Replace the config from the settings panel; bad JSON keeps the
        /// current config
        pub fn set_config(&mut self, json: &str) -> bool {
            match serde_json::from_str::<GameConfig>(json) {
                Ok(cfg) => {
                    self.config = cfg.sanitized();
                    self.config.save();
                    true
                }
                Err(err) => {
                    log::warn!("rejected config update: {err}");
                    false
                }
            }
        }

        /// Advance the simulation to `now_ms` and return the frame packet
        /// (state snapshot + events) as JSON
        pub fn frame(&mut self, now_ms: f64, left_axis: f32, right_axis: f32) -> String {
            let dt = ((now_ms - self.last_time_ms) / 1000.0) as f32;
            self.last_time_ms = now_ms;
            self.input.left_axis = left_axis;
            self.input.right_axis = right_axis;

            tick(&mut self.state, &self.input, &self.config, dt);
            self.input.start = false;
            self.input.pause = false;
            self.input.to_menu = false;

            let events = self.state.drain_events();
            if events
                .iter()
                .any(|e| matches!(e, GameEvent::MatchFinished { .. }))
            {
                if let Some(record) = MatchRecord::from_state(&self.state, js_sys::Date::now()) {
                    self.history.record(record);
                    self.history.save();
                }
            }

            let packet = FramePacket {
                state: &self.state,
                events: &events,
            };
            serde_json::to_string(&packet).unwrap_or_else(|_| "{}".into())
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use cosmo_pong::sim::{GameEvent, MatchPhase, MatchState, TickInput, tick};
    use cosmo_pong::{GameConfig, MatchHistory, MatchRecord};

    env_logger::init();
    log::info!("Cosmo Pong (native) starting headless AI demo...");

    let config = GameConfig {
        left_is_ai: true,
        right_is_ai: true,
        left_difficulty: 0.9,
        right_difficulty: 0.6,
        ..GameConfig::load()
    }
    .sanitized();

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0x5eed);
    let mut state = MatchState::new(seed, &config);

    const DT: f32 = 1.0 / 120.0;
    // Bail out after 30 simulated minutes in case two AIs stonewall forever
    const MAX_TICKS: u64 = 120 * 60 * 30;

    let mut input = TickInput {
        start: true,
        ..Default::default()
    };
    let mut ticks: u64 = 0;
    while state.phase != MatchPhase::Finished && ticks < MAX_TICKS {
        tick(&mut state, &input, &config, DT);
        input.start = false;
        ticks += 1;

        for event in state.drain_events() {
            match event {
                GameEvent::ScoreChanged { side, score } => {
                    log::info!("score: {side:?} {score}")
                }
                GameEvent::PowerUpActivated { side, kind } => {
                    log::info!("{side:?} activated {kind:?}")
                }
                GameEvent::MatchFinished { winner } => log::info!("winner: {winner:?}"),
                _ => {}
            }
        }
    }

    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as f64)
        .unwrap_or(0.0);
    if let Some(record) = MatchRecord::from_state(&state, timestamp) {
        println!(
            "final: left {} - {} right in {:.1}s simulated",
            record.left_score, record.right_score, record.duration_secs
        );
        let mut history = MatchHistory::load();
        history.record(record);
        history.save();
    } else {
        log::warn!("demo stopped after {ticks} ticks without a winner");
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is the WebGame bridge; this satisfies the compiler
}
