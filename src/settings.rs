//! Deployment and player settings
//!
//! Persisted separately from the high score, as JSON under its own key.

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, StorageError};
use crate::scores::DEFAULT_TOP_LIMIT;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Services ===
    /// Score API root; scores live under `{api_base_url}/scores`
    pub api_base_url: String,
    /// SignalR hub endpoint for live ranking pushes (ws:// or wss://)
    pub ranking_hub_url: String,
    /// Connect to the live ranking hub at startup
    pub live_ranking: bool,

    // === Leaderboard ===
    /// Rows requested for the top-scores view
    pub leaderboard_size: usize,

    // === Player ===
    /// Name pre-filled in the name entry field
    pub last_player_name: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            ranking_hub_url: "ws://localhost:5000/rankingHub".to_string(),
            live_ranking: true,
            leaderboard_size: DEFAULT_TOP_LIMIT,
            last_player_name: None,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "flappy_fish_settings";

    /// Load settings, falling back to defaults when missing or unreadable
    pub fn load<S: KeyValueStore>(storage: &S) -> Self {
        match storage.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring malformed settings: {}", e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Could not read settings: {}", e),
        }

        log::info!("Using default settings");
        Self::default()
    }

    pub fn save<S: KeyValueStore>(&self, storage: &mut S) -> Result<(), StorageError> {
        let json = serde_json::to_string(self).map_err(|e| StorageError::Write {
            key: Self::STORAGE_KEY.to_string(),
            reason: e.to_string(),
        })?;
        storage.set(Self::STORAGE_KEY, &json)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Leaderboard size clamped to something a panel can show
    pub fn effective_leaderboard_size(&self) -> usize {
        self.leaderboard_size.clamp(1, 100)
    }
}
