use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum GameEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait GameEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<GameEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                // key releases would count as a second tap on some terminals
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    tx.send(GameEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => tx.send(GameEvent::Resize),
                Ok(_) => Ok(()),
                Err(e) => {
                    log::error!("terminal input closed: {e}");
                    break;
                }
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GameEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<GameEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<GameEvent>) -> Self {
        Self { rx }
    }
}

impl GameEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Hands out one event at a time, interleaving `Tick` on a fixed schedule.
///
/// Ticks are due at fixed instants rather than after a quiet interval, so a
/// player hammering keys cannot stall the game clock. A runner that fell
/// behind emits the missed ticks back to back.
pub struct Runner<E: GameEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    next_tick: Instant,
}

impl<E: GameEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        let next_tick = Instant::now() + ticker.interval();
        Self {
            event_source,
            ticker,
            next_tick,
        }
    }

    /// Blocks until the next event or the next due tick, whichever is first
    pub fn step(&mut self) -> GameEvent {
        let now = Instant::now();
        if now >= self.next_tick {
            return self.take_tick();
        }

        match self.event_source.recv_timeout(self.next_tick - now) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => self.take_tick(),
            Err(RecvTimeoutError::Disconnected) => {
                // nothing more will arrive; keep the clock honest
                std::thread::sleep(self.next_tick.saturating_duration_since(Instant::now()));
                self.take_tick()
            }
        }
    }

    fn take_tick(&mut self) -> GameEvent {
        self.next_tick += self.ticker.interval();
        GameEvent::Tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::sync::mpsc;

    fn key(c: char) -> GameEvent {
        GameEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let mut runner = Runner::new(es, ticker);

        match runner.step() {
            GameEvent::Tick => {}
            other => panic!("expected Tick on timeout, got {other:?}"),
        }
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(GameEvent::Resize).unwrap();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(50));
        let mut runner = Runner::new(es, ticker);

        match runner.step() {
            GameEvent::Resize => {}
            other => panic!("expected Resize event, got {other:?}"),
        }
    }

    #[test]
    fn ticks_keep_coming_under_a_key_flood() {
        let (tx, rx) = mpsc::channel();
        for _ in 0..10_000 {
            tx.send(key('a')).unwrap();
        }
        let es = TestEventSource::new(rx);
        let mut runner = Runner::new(es, FixedTicker::new(Duration::from_millis(5)));

        let started = Instant::now();
        let mut ticks = 0;
        while started.elapsed() < Duration::from_millis(100) {
            if let GameEvent::Tick = runner.step() {
                ticks += 1;
            }
        }
        assert!(ticks >= 5, "only {ticks} ticks while keys were queued");
    }

    #[test]
    fn disconnected_source_still_ticks() {
        let (tx, rx) = mpsc::channel::<GameEvent>();
        drop(tx);
        let mut runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );
        for _ in 0..3 {
            assert!(matches!(runner.step(), GameEvent::Tick));
        }
    }
}
