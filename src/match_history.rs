//! Match result history
//!
//! The core reports a finished match once; the host persists it here.
//! Stored in LocalStorage on web builds, keeps the most recent results.

use serde::{Deserialize, Serialize};

use crate::sim::{MatchState, Side};

/// Maximum number of results to keep
pub const MAX_MATCH_HISTORY: usize = 25;

/// One finished match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub winner: Side,
    pub left_score: u32,
    pub right_score: u32,
    /// Simulated match length in seconds (pauses excluded)
    pub duration_secs: f32,
    /// Unix timestamp (ms) when the match ended, supplied by the host
    pub timestamp: f64,
}

impl MatchRecord {
    /// Build a record from a finished match; `None` while the match is
    /// still undecided
    pub fn from_state(state: &MatchState, timestamp: f64) -> Option<Self> {
        let winner = state.winner?;
        Some(Self {
            winner,
            left_score: state.paddle(Side::Left).score,
            right_score: state.paddle(Side::Right).score,
            duration_secs: state.now - state.match_started_at,
            timestamp,
        })
    }
}

/// Rolling log of recent results, newest first
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MatchHistory {
    pub entries: Vec<MatchRecord>,
}

impl MatchHistory {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "cosmo_pong_matches";

    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Prepend a result, trimming to the retention window
    pub fn record(&mut self, record: MatchRecord) {
        self.entries.insert(0, record);
        self.entries.truncate(MAX_MATCH_HISTORY);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total wins recorded for a side
    pub fn wins_for(&self, side: Side) -> usize {
        self.entries.iter().filter(|r| r.winner == side).count()
    }

    /// Load history from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(history) = serde_json::from_str::<MatchHistory>(&json) {
                    log::info!("Loaded {} match records", history.entries.len());
                    return history;
                }
            }
        }

        log::info!("No match history found, starting fresh");
        Self::new()
    }

    /// Save history to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Match history saved ({} entries)", self.entries.len());
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(winner: Side) -> MatchRecord {
        MatchRecord {
            winner,
            left_score: 5,
            right_score: 3,
            duration_secs: 74.2,
            timestamp: 1_700_000_000_000.0,
        }
    }

    #[test]
    fn record_prepends_and_trims() {
        let mut history = MatchHistory::new();
        for _ in 0..MAX_MATCH_HISTORY + 5 {
            history.record(record(Side::Left));
        }
        assert_eq!(history.entries.len(), MAX_MATCH_HISTORY);
    }

    #[test]
    fn wins_are_counted_per_side() {
        let mut history = MatchHistory::new();
        history.record(record(Side::Left));
        history.record(record(Side::Left));
        history.record(record(Side::Right));
        assert_eq!(history.wins_for(Side::Left), 2);
        assert_eq!(history.wins_for(Side::Right), 1);
    }

    #[test]
    fn from_state_requires_a_decided_match() {
        let config = crate::GameConfig::default();
        let mut state = MatchState::new(1, &config);
        assert!(MatchRecord::from_state(&state, 0.0).is_none());

        state.paddle_mut(Side::Right).score = 5;
        state.winner = Some(Side::Right);
        let record = MatchRecord::from_state(&state, 123.0).unwrap();
        assert_eq!(record.winner, Side::Right);
        assert_eq!(record.right_score, 5);
    }

    #[test]
    fn history_round_trips_through_json() {
        let mut history = MatchHistory::new();
        history.record(record(Side::Right));
        let json = serde_json::to_string(&history).unwrap();
        let back: MatchHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entries.len(), 1);
        assert_eq!(back.wins_for(Side::Right), 1);
    }
}
