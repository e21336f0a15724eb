use ratatui::Frame;

use quickdraw::Phase;

use crate::{
    ui::{render_countdown, render_leaderboard, render_play, render_setup, render_summary},
    App, AppState,
};

/// A UI Screen boundary: responsible for rendering one state of the app
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Settings form shown between runs
pub struct SetupScreen;

impl Screen for SetupScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_setup(app, f);
    }
}

pub struct CountdownScreen;

impl Screen for CountdownScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_countdown(app, f);
    }
}

/// The board while a run is active
pub struct PlayScreen;

impl Screen for PlayScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_play(app, f);
    }
}

pub struct SummaryScreen;

impl Screen for SummaryScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_summary(app, f);
    }
}

pub struct LeaderboardScreen;

impl Screen for LeaderboardScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_leaderboard(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(app: &App) -> Box<dyn Screen> {
    match (app.state, app.session.phase()) {
        (AppState::Leaderboard, _) => Box::new(LeaderboardScreen),
        (AppState::Game, Phase::Idle) => Box::new(SetupScreen),
        (AppState::Game, Phase::Countdown) => Box::new(CountdownScreen),
        (AppState::Game, Phase::Active) => Box::new(PlayScreen),
        (AppState::Game, Phase::Finished) => Box::new(SummaryScreen),
    }
}
