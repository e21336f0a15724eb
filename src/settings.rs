use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::game::GameKind;
use crate::palette::ActiveColor;

/// Flat `name -> number` map sent to the results store for both settings and
/// metrics.
pub type ReportMap = BTreeMap<String, f64>;

/// Cards are picked with the digit keys, so a round holds at most nine.
pub const MAX_CARDS: u32 = 9;

/// Settings exactly as the player typed them. Editable only while the
/// session is idle; [`SettingsRecord::validate`] gates the start action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "kebab-case")]
pub enum SettingsRecord {
    ItemHunt {
        duration_secs: String,
        color: ActiveColor,
    },
    GrowingHunt {
        duration_secs: String,
        growth_secs: String,
        color: ActiveColor,
    },
    Stroop {
        duration_secs: String,
    },
    Monte {
        card_count: String,
        round_count: String,
        shuffle_count: String,
    },
}

/// Settings after validation, with every field at its numeric type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameSettings {
    ItemHunt {
        duration_secs: u32,
        color: ActiveColor,
    },
    GrowingHunt {
        duration_secs: u32,
        growth_secs: f64,
        color: ActiveColor,
    },
    Stroop {
        duration_secs: u32,
    },
    Monte {
        card_count: u32,
        round_count: u32,
        shuffle_count: u32,
    },
}

/// Mutable handle on one editable field of a [`SettingsRecord`].
pub enum FieldMut<'a> {
    Text(&'a mut String),
    Color(&'a mut ActiveColor),
}

impl SettingsRecord {
    pub fn defaults(game: GameKind) -> Self {
        match game {
            GameKind::ItemHunt => SettingsRecord::ItemHunt {
                duration_secs: "30".into(),
                color: ActiveColor::Gradient,
            },
            GameKind::GrowingHunt => SettingsRecord::GrowingHunt {
                duration_secs: "30".into(),
                growth_secs: "2".into(),
                color: ActiveColor::Gradient,
            },
            GameKind::Stroop => SettingsRecord::Stroop {
                duration_secs: "30".into(),
            },
            GameKind::Monte => SettingsRecord::Monte {
                card_count: "3".into(),
                round_count: "10".into(),
                shuffle_count: "5".into(),
            },
        }
    }

    pub fn game(&self) -> GameKind {
        match self {
            SettingsRecord::ItemHunt { .. } => GameKind::ItemHunt,
            SettingsRecord::GrowingHunt { .. } => GameKind::GrowingHunt,
            SettingsRecord::Stroop { .. } => GameKind::Stroop,
            SettingsRecord::Monte { .. } => GameKind::Monte,
        }
    }

    pub fn validate(&self) -> Result<GameSettings, ConfigError> {
        Ok(match self {
            SettingsRecord::ItemHunt {
                duration_secs,
                color,
            } => GameSettings::ItemHunt {
                duration_secs: parse_int("duration", duration_secs, 1, None)?,
                color: *color,
            },
            SettingsRecord::GrowingHunt {
                duration_secs,
                growth_secs,
                color,
            } => GameSettings::GrowingHunt {
                duration_secs: parse_int("duration", duration_secs, 1, None)?,
                growth_secs: parse_finite("growth time", growth_secs, 0.0)?,
                color: *color,
            },
            SettingsRecord::Stroop { duration_secs } => GameSettings::Stroop {
                duration_secs: parse_int("duration", duration_secs, 1, None)?,
            },
            SettingsRecord::Monte {
                card_count,
                round_count,
                shuffle_count,
            } => GameSettings::Monte {
                card_count: parse_int("cards", card_count, 1, Some(MAX_CARDS))?,
                round_count: parse_int("rounds", round_count, 1, None)?,
                shuffle_count: parse_int("shuffles", shuffle_count, 0, None)?,
            },
        })
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn field_labels(&self) -> &'static [&'static str] {
        match self {
            SettingsRecord::ItemHunt { .. } => &["Game time (s)", "Active color"],
            SettingsRecord::GrowingHunt { .. } => {
                &["Game time (s)", "Growth time (s)", "Active color"]
            }
            SettingsRecord::Stroop { .. } => &["Game time (s)"],
            SettingsRecord::Monte { .. } => &["Cards", "Rounds", "Shuffles"],
        }
    }

    pub fn field_mut(&mut self, idx: usize) -> Option<FieldMut<'_>> {
        match (self, idx) {
            (SettingsRecord::ItemHunt { duration_secs, .. }, 0) => {
                Some(FieldMut::Text(duration_secs))
            }
            (SettingsRecord::ItemHunt { color, .. }, 1) => Some(FieldMut::Color(color)),
            (SettingsRecord::GrowingHunt { duration_secs, .. }, 0) => {
                Some(FieldMut::Text(duration_secs))
            }
            (SettingsRecord::GrowingHunt { growth_secs, .. }, 1) => {
                Some(FieldMut::Text(growth_secs))
            }
            (SettingsRecord::GrowingHunt { color, .. }, 2) => Some(FieldMut::Color(color)),
            (SettingsRecord::Stroop { duration_secs }, 0) => Some(FieldMut::Text(duration_secs)),
            (SettingsRecord::Monte { card_count, .. }, 0) => Some(FieldMut::Text(card_count)),
            (SettingsRecord::Monte { round_count, .. }, 1) => Some(FieldMut::Text(round_count)),
            (SettingsRecord::Monte { shuffle_count, .. }, 2) => Some(FieldMut::Text(shuffle_count)),
            _ => None,
        }
    }

    pub fn field_display(&self, idx: usize) -> Option<String> {
        let mut copy = self.clone();
        copy.field_mut(idx).map(|field| match field {
            FieldMut::Text(text) => text.clone(),
            FieldMut::Color(color) => color.to_string(),
        })
    }
}

impl GameSettings {
    pub fn game(&self) -> GameKind {
        match self {
            GameSettings::ItemHunt { .. } => GameKind::ItemHunt,
            GameSettings::GrowingHunt { .. } => GameKind::GrowingHunt,
            GameSettings::Stroop { .. } => GameKind::Stroop,
            GameSettings::Monte { .. } => GameKind::Monte,
        }
    }

    /// Length of the timed active phase. Monte is paced by rounds instead.
    pub fn duration_ms(&self) -> Option<i64> {
        match self {
            GameSettings::ItemHunt { duration_secs, .. }
            | GameSettings::GrowingHunt { duration_secs, .. }
            | GameSettings::Stroop { duration_secs } => Some(i64::from(*duration_secs) * 1000),
            GameSettings::Monte { .. } => None,
        }
    }

    pub fn to_report_map(&self) -> ReportMap {
        let entries: Vec<(&str, f64)> = match *self {
            GameSettings::ItemHunt {
                duration_secs,
                color,
            } => vec![
                ("Setting1", f64::from(duration_secs)),
                ("Setting2", color.code()),
            ],
            GameSettings::GrowingHunt {
                duration_secs,
                growth_secs,
                color,
            } => vec![
                ("Setting1", f64::from(duration_secs)),
                ("Setting2", color.code()),
                ("Setting3", growth_secs),
            ],
            GameSettings::Stroop { duration_secs } => {
                vec![("Setting1", f64::from(duration_secs))]
            }
            GameSettings::Monte {
                card_count,
                round_count,
                shuffle_count,
            } => vec![
                ("Setting1", f64::from(card_count)),
                ("Setting2", f64::from(round_count)),
                ("Setting3", f64::from(shuffle_count)),
            ],
        };
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }
}

fn parse_int(
    field: &'static str,
    raw: &str,
    min: u32,
    max: Option<u32>,
) -> Result<u32, ConfigError> {
    let trimmed = raw.trim();
    let not_int = || ConfigError::NotAnInteger {
        field,
        value: raw.to_string(),
    };

    // "30" and "30.0" are both whole numbers, "30.5" and "30s" are not
    let value = match trimmed.parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            let f = trimmed.parse::<f64>().map_err(|_| not_int())?;
            if !f.is_finite() || f.fract() != 0.0 || f.abs() > i64::MAX as f64 {
                return Err(not_int());
            }
            f as i64
        }
    };

    if value < i64::from(min) {
        return Err(ConfigError::BelowMinimum {
            field,
            value: value as f64,
            min: f64::from(min),
        });
    }
    if let Some(max) = max {
        if value > i64::from(max) {
            return Err(ConfigError::AboveMaximum {
                field,
                value: value as f64,
                max: f64::from(max),
            });
        }
    }
    u32::try_from(value).map_err(|_| not_int())
}

fn parse_finite(field: &'static str, raw: &str, min: f64) -> Result<f64, ConfigError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ConfigError::NotAFiniteNumber {
            field,
            value: raw.to_string(),
        })?;

    if value < min {
        return Err(ConfigError::BelowMinimum { field, value, min });
    }
    Ok(value)
}
