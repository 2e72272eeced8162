//! Event loop plumbing. Terminal input is read on its own thread and merged
//! with a fixed tick, which is what polls a running challenge's deadline.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

use crate::TICK_RATE_MS;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    /// No input arrived within one tick.
    Tick,
    /// The input side hung up and nothing more will arrive.
    Closed,
}

/// Hands out one event at a time, ticking at a fixed cadence while idle.
#[derive(Debug)]
pub struct Runner {
    events: Receiver<AppEvent>,
    tick_rate: Duration,
}

impl Runner {
    /// Reads key presses and resizes from the terminal.
    pub fn terminal() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || forward_terminal_events(&tx));
        Self::from_channel(rx)
    }

    /// Events are fed by whoever holds the sender. Ticks every `TICK_RATE_MS`.
    pub fn from_channel(events: Receiver<AppEvent>) -> Self {
        Self {
            events,
            tick_rate: Duration::from_millis(TICK_RATE_MS),
        }
    }

    pub fn with_tick_rate(mut self, tick_rate: Duration) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    pub fn tick_rate(&self) -> Duration {
        self.tick_rate
    }

    /// Waits at most one tick. Buffered input is drained before `Closed` is reported.
    pub fn next_event(&self) -> AppEvent {
        match self.events.recv_timeout(self.tick_rate) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => AppEvent::Tick,
            Err(RecvTimeoutError::Disconnected) => AppEvent::Closed,
        }
    }
}

fn forward_terminal_events(tx: &Sender<AppEvent>) {
    loop {
        let event = match event::read() {
            Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => AppEvent::Key(key),
            Ok(Event::Resize(..)) => AppEvent::Resize,
            Ok(_) => continue,
            Err(err) => {
                tracing::warn!(error = %err, "terminal input stopped");
                return;
            }
        };
        if tx.send(event).is_err() {
            return;
        }
    }
}
