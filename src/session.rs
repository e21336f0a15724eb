use std::fmt;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SessionError};
use crate::game::GameKind;
use crate::results::{best_metric, ResultsStore};
use crate::round::{generator_for, PauseOutcome, Round, RoundGenerator, SHUFFLE_PAUSE_MS};
use crate::scoring::{BestMetric, Metric};
use crate::settings::{GameSettings, SettingsRecord};
use crate::timer::{CountdownTimer, TimerSignal};

/// Length of the "get ready" countdown before the first round.
pub const COUNTDOWN_MS: i64 = 3000;

/// Resolution of every timer a session drives.
pub const TICK_INTERVAL_MS: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    Countdown,
    Active,
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Countdown => "counting down",
            Phase::Active => "active",
            Phase::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// Who is playing. The email doubles as the id results are filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl PlayerProfile {
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            id: email.to_string(),
            name: name.to_string(),
            email: email.to_string(),
        }
    }
}

/// Everything that can move a session forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Start,
    Tick,
    /// The player picked the element at this board position.
    Tap(usize),
    BeginShuffle,
    NextRound,
    End,
    Return,
}

/// What a dispatched event did, for the front-end to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Unchanged,
    Entered(Phase),
    Hit,
    Miss,
    Shuffled,
}

/// One player's run at one game: phases, timers, score and the current round.
///
/// All state changes go through [`GameSession::dispatch`]. Timers only move
/// when the session is ticked, so a session that is dropped or sent back to
/// idle has nothing left that could fire against it.
pub struct GameSession {
    profile: PlayerProfile,
    settings: SettingsRecord,
    /// Validated copy of `settings` taken when the session was started.
    running: Option<GameSettings>,
    phase: Phase,
    score: u32,
    error_count: u32,
    round: Option<Round>,
    round_index: u32,
    round_elapsed_ms: i64,
    active_elapsed_ms: i64,
    /// Countdown while counting down, game duration while active.
    timer: CountdownTimer,
    shuffle_pause: CountdownTimer,
    generator: Option<Box<dyn RoundGenerator>>,
    metric: Option<Metric>,
    best: BestMetric,
    store: Rc<dyn ResultsStore>,
    rng: StdRng,
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("player", &self.profile.id)
            .field("game", &self.game())
            .field("phase", &self.phase)
            .field("score", &self.score)
            .field("error_count", &self.error_count)
            .field("round_index", &self.round_index)
            .finish()
    }
}

impl GameSession {
    pub fn new(
        profile: PlayerProfile,
        settings: SettingsRecord,
        store: Rc<dyn ResultsStore>,
    ) -> Self {
        Self::with_rng(profile, settings, store, StdRng::from_entropy())
    }

    /// Deterministic session: the same seed and inputs replay the same rounds.
    pub fn with_seed(
        profile: PlayerProfile,
        settings: SettingsRecord,
        store: Rc<dyn ResultsStore>,
        seed: u64,
    ) -> Self {
        Self::with_rng(profile, settings, store, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        profile: PlayerProfile,
        settings: SettingsRecord,
        store: Rc<dyn ResultsStore>,
        rng: StdRng,
    ) -> Self {
        let best = best_metric(store.as_ref(), &profile.id, settings.game());
        Self {
            profile,
            settings,
            running: None,
            phase: Phase::Idle,
            score: 0,
            error_count: 0,
            round: None,
            round_index: 0,
            round_elapsed_ms: 0,
            active_elapsed_ms: 0,
            timer: CountdownTimer::new(),
            shuffle_pause: CountdownTimer::new(),
            generator: None,
            metric: None,
            best,
            store,
            rng,
        }
    }

    pub fn dispatch(&mut self, event: SessionEvent) -> Result<Outcome, SessionError> {
        match event {
            SessionEvent::Start => self.start(),
            SessionEvent::Tick => self.tick(),
            SessionEvent::Tap(idx) => self.tap(idx),
            SessionEvent::BeginShuffle => self.begin_shuffle(),
            SessionEvent::NextRound => self.next_round(),
            SessionEvent::End => self.end(),
            SessionEvent::Return => self.return_to_idle(),
        }
    }

    /// Idle/Finished -> Countdown. Invalid settings leave the phase alone.
    pub fn start(&mut self) -> Result<Outcome, SessionError> {
        if !matches!(self.phase, Phase::Idle | Phase::Finished) {
            return Err(self.illegal("start"));
        }
        let settings = self.settings.validate()?;
        self.timer.start(COUNTDOWN_MS, TICK_INTERVAL_MS)?;
        self.running = Some(settings);
        self.generator = Some(generator_for(&settings));
        self.metric = None;
        Ok(self.enter(Phase::Countdown))
    }

    pub fn tick(&mut self) -> Result<Outcome, SessionError> {
        match self.phase {
            Phase::Countdown => match self.timer.tick() {
                TimerSignal::Completed => self.begin_active(),
                _ => Ok(Outcome::Unchanged),
            },
            Phase::Active => self.tick_active(),
            Phase::Idle | Phase::Finished => Ok(Outcome::Unchanged),
        }
    }

    /// Score a pick. Taps outside the active phase, off the board or on
    /// inactive circles are ignored.
    pub fn tap(&mut self, idx: usize) -> Result<Outcome, SessionError> {
        if self.phase != Phase::Active {
            return Ok(Outcome::Unchanged);
        }
        let verdict = match self.round.as_mut() {
            Some(Round::Target(round)) => round.is_active(idx).then_some(true),
            Some(Round::ColorWord(round)) => round.is_correct(idx),
            Some(Round::Reveal(round)) => round.pick(idx),
            None => None,
        };
        let holds_round = self
            .generator
            .as_ref()
            .is_some_and(|g| g.holds_resolved_round());

        match verdict {
            None => Ok(Outcome::Unchanged),
            Some(true) => {
                self.score += 1;
                if !holds_round {
                    self.advance_round()?;
                }
                Ok(Outcome::Hit)
            }
            Some(false) => {
                self.error_count += 1;
                Ok(Outcome::Miss)
            }
        }
    }

    /// Turn the face-up cards over and start shuffling them.
    pub fn begin_shuffle(&mut self) -> Result<Outcome, SessionError> {
        if self.phase != Phase::Active {
            return Err(self.illegal("shuffle"));
        }
        let Some(Round::Reveal(round)) = self.round.as_mut() else {
            return Ok(Outcome::Unchanged);
        };
        if !round.begin_shuffle(&mut self.rng) {
            return Ok(Outcome::Unchanged);
        }
        if round.history.is_empty() {
            // zero shuffles: straight to choosing
            return Ok(Outcome::Shuffled);
        }
        self.shuffle_pause.start(SHUFFLE_PAUSE_MS, TICK_INTERVAL_MS)?;
        Ok(Outcome::Shuffled)
    }

    /// Move past a resolved card round, finishing after the last one.
    pub fn next_round(&mut self) -> Result<Outcome, SessionError> {
        if self.phase != Phase::Active {
            return Err(self.illegal("next round"));
        }
        let resolved = matches!(&self.round, Some(Round::Reveal(r)) if r.is_resolved());
        if !resolved {
            return Ok(Outcome::Unchanged);
        }
        let last_round = match self.running {
            Some(GameSettings::Monte { round_count, .. }) => self.round_index >= round_count,
            _ => false,
        };
        if last_round {
            Ok(self.finish())
        } else {
            self.advance_round()?;
            Ok(Outcome::Unchanged)
        }
    }

    /// Abort a run in progress. Nothing is reported.
    pub fn end(&mut self) -> Result<Outcome, SessionError> {
        if !matches!(self.phase, Phase::Countdown | Phase::Active) {
            return Err(self.illegal("end"));
        }
        self.stop_timers();
        self.round = None;
        log::debug!(
            "{} abandoned {} with score {}",
            self.profile.id,
            self.game(),
            self.score
        );
        Ok(self.enter(Phase::Idle))
    }

    pub fn return_to_idle(&mut self) -> Result<Outcome, SessionError> {
        if self.phase != Phase::Finished {
            return Err(self.illegal("return"));
        }
        Ok(self.enter(Phase::Idle))
    }

    /// Settings can only be changed between runs.
    pub fn settings_mut(&mut self) -> Result<&mut SettingsRecord, SessionError> {
        if self.phase != Phase::Idle {
            return Err(self.illegal("edit settings"));
        }
        Ok(&mut self.settings)
    }

    pub fn replace_settings(&mut self, settings: SettingsRecord) -> Result<(), SessionError> {
        if settings.game() != self.game() {
            return Err(ConfigError::SettingsMismatch {
                expected: self.game().title(),
                got: settings.game().title(),
            }
            .into());
        }
        *self.settings_mut()? = settings;
        Ok(())
    }

    /// Ask the results store again for this player's best.
    pub fn refresh_best(&mut self) -> BestMetric {
        self.best = best_metric(self.store.as_ref(), &self.profile.id, self.game());
        self.best
    }

    pub fn can_start(&self) -> bool {
        matches!(self.phase, Phase::Idle | Phase::Finished) && self.settings.is_valid()
    }

    pub fn game(&self) -> GameKind {
        self.settings.game()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn profile(&self) -> &PlayerProfile {
        &self.profile
    }

    pub fn settings(&self) -> &SettingsRecord {
        &self.settings
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    /// 1-based index of the round on the board, 0 before the first.
    pub fn round_index(&self) -> u32 {
        self.round_index
    }

    /// Planned number of rounds, for games paced by rounds.
    pub fn round_count(&self) -> Option<u32> {
        match self.running? {
            GameSettings::Monte { round_count, .. } => Some(round_count),
            _ => None,
        }
    }

    pub fn round_elapsed_ms(&self) -> i64 {
        self.round_elapsed_ms
    }

    pub fn active_elapsed_ms(&self) -> i64 {
        self.active_elapsed_ms
    }

    /// The countdown while counting down, the game clock while active.
    pub fn timer(&self) -> &CountdownTimer {
        &self.timer
    }

    pub fn metric(&self) -> Option<&Metric> {
        self.metric.as_ref()
    }

    pub fn best(&self) -> BestMetric {
        self.best
    }

    fn illegal(&self, action: &'static str) -> SessionError {
        SessionError::IllegalTransition {
            phase: self.phase,
            action,
        }
    }

    fn enter(&mut self, phase: Phase) -> Outcome {
        log::debug!("{} session: {} -> {}", self.game(), self.phase, phase);
        self.phase = phase;
        Outcome::Entered(phase)
    }

    fn stop_timers(&mut self) {
        self.timer.stop();
        self.shuffle_pause.stop();
    }

    /// Countdown -> Active: fresh score and the first round.
    fn begin_active(&mut self) -> Result<Outcome, SessionError> {
        self.score = 0;
        self.error_count = 0;
        self.round_index = 0;
        self.active_elapsed_ms = 0;
        if let Some(generator) = self.generator.as_mut() {
            generator.reset();
        }

        if let Err(e) = self.advance_round() {
            self.stop_timers();
            self.enter(Phase::Idle);
            return Err(e);
        }

        match self.running.and_then(|s| s.duration_ms()) {
            Some(duration_ms) => self.timer.start(duration_ms, TICK_INTERVAL_MS)?,
            None => self.timer.stop(),
        }
        Ok(self.enter(Phase::Active))
    }

    fn tick_active(&mut self) -> Result<Outcome, SessionError> {
        self.active_elapsed_ms += TICK_INTERVAL_MS;
        self.round_elapsed_ms += TICK_INTERVAL_MS;

        // the game clock wins over whatever the round is doing
        if self.timer.tick() == TimerSignal::Completed {
            return Ok(self.finish());
        }

        if self.shuffle_pause.tick() == TimerSignal::Completed {
            if let Some(Round::Reveal(round)) = self.round.as_mut() {
                if round.pause_elapsed(&mut self.rng) == Some(PauseOutcome::Reshuffled) {
                    self.shuffle_pause.start(SHUFFLE_PAUSE_MS, TICK_INTERVAL_MS)?;
                    return Ok(Outcome::Shuffled);
                }
            }
        }
        Ok(Outcome::Unchanged)
    }

    fn advance_round(&mut self) -> Result<(), SessionError> {
        let generator = self
            .generator
            .as_mut()
            .ok_or(SessionError::IllegalTransition {
                phase: self.phase,
                action: "generate a round",
            })?;
        let round = generator.next_round(&mut self.rng)?;
        self.round = Some(round);
        self.round_index += 1;
        self.round_elapsed_ms = 0;
        self.shuffle_pause.stop();
        Ok(())
    }

    /// Active -> Finished: compute the metric once and report it.
    fn finish(&mut self) -> Outcome {
        self.stop_timers();
        self.round = None;

        let Some(settings) = self.running else {
            return self.enter(Phase::Idle);
        };
        let metric = Metric::compute(&settings, self.score, self.error_count);
        self.report(&settings, &metric);
        self.metric = Some(metric);
        self.refresh_best();
        self.enter(Phase::Finished)
    }

    fn report(&self, settings: &GameSettings, metric: &Metric) {
        let game = self.game();
        match self.store.submit_result(
            &self.profile.id,
            game.id(),
            &settings.to_report_map(),
            &metric.to_report_map(),
        ) {
            Ok(()) => log::info!(
                "{} finished {}: score {}, errors {}, {} {}",
                self.profile.id,
                game,
                metric.score,
                metric.error_count,
                game.derived_label(),
                metric.derived_display()
            ),
            Err(e) => log::warn!("dropping {game} result for {}: {e}", self.profile.id),
        }
    }
}
