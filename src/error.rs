use thiserror::Error;

use crate::session::Phase;

/// Problems detected before any phase transition happens. The session stays
/// in (or falls back to) Idle when one of these is raised.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field}: '{value}' is not a whole number")]
    NotAnInteger { field: &'static str, value: String },

    #[error("{field}: '{value}' is not a finite number")]
    NotAFiniteNumber { field: &'static str, value: String },

    #[error("{field}: {value} is below the minimum of {min}")]
    BelowMinimum {
        field: &'static str,
        value: f64,
        min: f64,
    },

    #[error("{field}: {value} is above the maximum of {max}")]
    AboveMaximum {
        field: &'static str,
        value: f64,
        max: f64,
    },

    #[error("tick interval must be positive, got {0}ms")]
    NonPositiveTickInterval(i64),

    #[error("duration must not be negative, got {0}ms")]
    NegativeDuration(i64),

    #[error("cannot pick from an empty pool")]
    EmptyPool,

    #[error("cannot exclude index {exclude} from a pool of {pool_size}")]
    UnsatisfiableExclusion { pool_size: usize, exclude: usize },

    #[error("{attempts} draws from a pool of {pool_size} all hit excluded index {exclude}")]
    ResamplingExhausted {
        pool_size: usize,
        exclude: usize,
        attempts: usize,
    },

    #[error("palette of {palette} colors cannot fill {buttons} buttons")]
    PaletteTooSmall { palette: usize, buttons: usize },

    #[error("{got} settings do not belong to {expected}")]
    SettingsMismatch {
        expected: &'static str,
        got: &'static str,
    },
}

/// Failures talking to the results store. Never fatal to gameplay.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("results database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("results encoding error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("could not prepare results storage: {0}")]
    Io(#[from] std::io::Error),

    #[error("results store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("'{action}' is not allowed while {phase}")]
    IllegalTransition { phase: Phase, action: &'static str },
}
