//! Player preferences
//!
//! Persisted in LocalStorage, separately from any game in progress.

use serde::{Deserialize, Serialize};

use crate::consts::STARTING_HEARTS;

/// Avatars the player can pick from
pub const AVATARS: [&str; 6] = ["🐻", "🐰", "🦊", "🐼", "🐸", "🐯"];

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Chosen avatar (one of `AVATARS`)
    pub avatar: String,
    /// Skip the pointer wobble
    pub reduced_motion: bool,
    /// Auto-stop after this long (0 = player stops the wheel)
    pub spin_duration_ms: f64,
    /// Minimum full turns before auto-stop
    pub revolutions: f64,
    /// Hearts at the start of a game
    pub starting_hearts: u32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            avatar: AVATARS[0].to_string(),
            reduced_motion: false,
            spin_duration_ms: 0.0,
            revolutions: 3.0,
            starting_hearts: STARTING_HEARTS,
        }
    }
}

impl Preferences {
    /// Select an avatar; unknown avatars are ignored
    pub fn set_avatar(&mut self, avatar: &str) -> bool {
        if AVATARS.contains(&avatar) {
            self.avatar = avatar.to_string();
            true
        } else {
            log::warn!("Ignoring unknown avatar {:?}", avatar);
            false
        }
    }

    /// Switch to the next avatar, wrapping around
    pub fn cycle_avatar(&mut self) -> &str {
        let next = AVATARS
            .iter()
            .position(|a| *a == self.avatar)
            .map_or(0, |i| (i + 1) % AVATARS.len());
        self.set_avatar(AVATARS[next]);
        &self.avatar
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "allergy_wheel_prefs";

    /// Load preferences from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(prefs) = serde_json::from_str(&json) {
                    log::info!("Loaded preferences from LocalStorage");
                    return prefs;
                }
            }
        }

        log::info!("Using default preferences");
        Self::default()
    }

    /// Save preferences to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Preferences saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
