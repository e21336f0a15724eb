use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::game::GameKind;
use crate::palette::ActiveColor;
use crate::session::PlayerProfile;
use crate::settings::SettingsRecord;

const DEFAULT_GROWTH_SECS: f64 = 2.0;

/// serde_json writes non-finite floats as `null`; read those back as the
/// default instead of rejecting the whole file.
fn growth_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(DEFAULT_GROWTH_SECS))
}

/// Persisted defaults: who is playing and the last settings used per game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub player_name: String,
    pub player_email: String,
    pub hunt_secs: u32,
    pub hunt_color: ActiveColor,
    pub growing_secs: u32,
    #[serde(deserialize_with = "growth_or_default")]
    pub growing_growth_secs: f64,
    pub growing_color: ActiveColor,
    pub stroop_secs: u32,
    pub monte_cards: u32,
    pub monte_rounds: u32,
    pub monte_shuffles: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player_name: "Player".to_string(),
            player_email: "player@localhost".to_string(),
            hunt_secs: 30,
            hunt_color: ActiveColor::Gradient,
            growing_secs: 30,
            growing_growth_secs: DEFAULT_GROWTH_SECS,
            growing_color: ActiveColor::Gradient,
            stroop_secs: 30,
            monte_cards: 3,
            monte_rounds: 10,
            monte_shuffles: 5,
        }
    }
}

impl Config {
    pub fn profile(&self) -> PlayerProfile {
        PlayerProfile::new(&self.player_name, &self.player_email)
    }

    /// Starting settings for `game`, pre-filled from the stored defaults.
    pub fn settings_for(&self, game: GameKind) -> SettingsRecord {
        match game {
            GameKind::ItemHunt => SettingsRecord::ItemHunt {
                duration_secs: self.hunt_secs.to_string(),
                color: self.hunt_color,
            },
            GameKind::GrowingHunt => SettingsRecord::GrowingHunt {
                duration_secs: self.growing_secs.to_string(),
                growth_secs: self.growing_growth_secs.to_string(),
                color: self.growing_color,
            },
            GameKind::Stroop => SettingsRecord::Stroop {
                duration_secs: self.stroop_secs.to_string(),
            },
            GameKind::Monte => SettingsRecord::Monte {
                card_count: self.monte_cards.to_string(),
                round_count: self.monte_rounds.to_string(),
                shuffle_count: self.monte_shuffles.to_string(),
            },
        }
    }

    /// Remember settings that were actually played with. Invalid records are
    /// ignored so a typo never ends up as the next default.
    pub fn remember(&mut self, record: &SettingsRecord) {
        use crate::settings::GameSettings;

        let Ok(settings) = record.validate() else {
            return;
        };
        match settings {
            GameSettings::ItemHunt {
                duration_secs,
                color,
            } => {
                self.hunt_secs = duration_secs;
                self.hunt_color = color;
            }
            GameSettings::GrowingHunt {
                duration_secs,
                growth_secs,
                color,
            } => {
                self.growing_secs = duration_secs;
                self.growing_growth_secs = growth_secs;
                self.growing_color = color;
            }
            GameSettings::Stroop { duration_secs } => self.stroop_secs = duration_secs,
            GameSettings::Monte {
                card_count,
                round_count,
                shuffle_count,
            } => {
                self.monte_cards = card_count;
                self.monte_rounds = round_count;
                self.monte_shuffles = shuffle_count;
            }
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|e| {
                log::warn!("ignoring unreadable config {}: {e}", self.path.display());
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn missing_or_corrupt_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());

        std::fs::write(&path, b"{ not json").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, br#"{"player_name":"Ann","stroop_secs":45}"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.player_name, "Ann");
        assert_eq!(cfg.stroop_secs, 45);
        assert_eq!(cfg.monte_cards, 3);
    }

    #[test]
    fn non_finite_growth_does_not_wipe_profile() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let mut cfg = Config {
            player_email: "ann@example.com".to_string(),
            growing_growth_secs: f64::NAN,
            ..Config::default()
        };
        cfg.remember(&SettingsRecord::Stroop {
            duration_secs: "20".to_string(),
        });
        store.save(&cfg).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.player_email, "ann@example.com");
        assert_eq!(loaded.stroop_secs, 20);
        assert_eq!(loaded.growing_growth_secs, 2.0);
    }

    #[test]
    fn settings_follow_config() {
        let cfg = Config {
            monte_cards: 4,
            ..Config::default()
        };
        assert_eq!(
            cfg.settings_for(GameKind::Monte),
            SettingsRecord::Monte {
                card_count: "4".into(),
                round_count: "10".into(),
                shuffle_count: "5".into(),
            }
        );
        for game in GameKind::ALL {
            assert!(cfg.settings_for(game).is_valid());
        }
    }

    #[test]
    fn remember_keeps_valid_settings_only() {
        let mut cfg = Config::default();
        cfg.remember(&SettingsRecord::Stroop {
            duration_secs: "12".into(),
        });
        assert_eq!(cfg.stroop_secs, 12);

        cfg.remember(&SettingsRecord::Stroop {
            duration_secs: "oops".into(),
        });
        assert_eq!(cfg.stroop_secs, 12);
    }
}
