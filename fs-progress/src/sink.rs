use std::cell::Cell;
use std::rc::Rc;

use indicatif::ProgressBar;

/// Receiver of byte counts reported by a
/// [`ProgressReader`](crate::ProgressReader).
pub trait ProgressSink {
    /// Total number of bytes expected.
    fn set_length(&self, total: u64);

    /// Absolute position, reported after a seek.
    fn set_position(&self, position: u64);

    /// Bytes handed out by a read.
    fn inc(&self, delta: u64);

    /// Redraw request.
    fn tick(&self);

    /// No more updates will follow.
    fn close(&self);
}

impl ProgressSink for ProgressBar {
    fn set_length(&self, total: u64) {
        ProgressBar::set_length(self, total)
    }

    fn set_position(&self, position: u64) {
        ProgressBar::set_position(self, position)
    }

    fn inc(&self, delta: u64) {
        ProgressBar::inc(self, delta)
    }

    fn tick(&self) {
        ProgressBar::tick(self)
    }

    fn close(&self) {
        // keep the bar where reading stopped
        ProgressBar::abandon(self)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterState {
    pub length: u64,
    pub position: u64,
    pub ticks: u64,
    pub closed: bool,
}

/// Sink that only records what it is told.
///
/// Clones share their state, so one clone can be handed to a reader
/// while another one is inspected.
#[derive(Debug, Clone, Default)]
pub struct Counter(Rc<Cell<CounterState>>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CounterState {
        self.0.get()
    }

    pub fn position(&self) -> u64 {
        self.state().position
    }

    pub fn length(&self) -> u64 {
        self.state().length
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    fn update(&self, f: impl FnOnce(&mut CounterState)) {
        let mut state = self.0.get();
        f(&mut state);
        self.0.set(state);
    }
}

impl ProgressSink for Counter {
    fn set_length(&self, total: u64) {
        self.update(|state| state.length = total)
    }

    fn set_position(&self, position: u64) {
        self.update(|state| state.position = position)
    }

    fn inc(&self, delta: u64) {
        self.update(|state| state.position += delta)
    }

    fn tick(&self) {
        self.update(|state| state.ticks += 1)
    }

    fn close(&self) {
        self.update(|state| state.closed = true)
    }
}
