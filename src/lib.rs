//! Game sessions, round generators, scoring and result storage for the
//! quickdraw mini-games. The terminal front end lives in the binary.
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod game;
pub mod palette;
pub mod results;
pub mod round;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod settings;
pub mod target;
pub mod timer;

pub use error::{ConfigError, SessionError, StoreError};
pub use game::GameKind;
pub use session::{GameSession, Outcome, Phase, PlayerProfile, SessionEvent};
