//! Cancelable debounce timer.
//!
//! One `Debouncer` per logical operation (value commit, lookup search, key
//! recording). Starting it again while armed pushes the deadline out and
//! invalidates earlier tickets, so there is never more than one pending
//! firing. Time is passed in by the caller, which keeps tests deterministic.
//! Async callers can await [`Debouncer::timer`] and then check the ticket
//! with [`Debouncer::is_current`].

use std::time::{Duration, Instant};

/// Identifies one arming of a debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTicket(u64);

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
    generation: u64,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
            generation: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm (or re-arm) the timer to fire `delay` after `now`.
    pub fn start(&mut self, now: Instant) -> DebounceTicket {
        self.generation += 1;
        self.deadline = Some(now + self.delay);
        DebounceTicket(self.generation)
    }

    /// Same as `start`; reads better at call sites that expect a pending timer.
    pub fn restart(&mut self, now: Instant) -> DebounceTicket {
        self.start(now)
    }

    /// Disarm. Outstanding tickets become stale.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True if `ticket` is from the latest arming and the timer is still armed.
    pub fn is_current(&self, ticket: DebounceTicket) -> bool {
        self.deadline.is_some() && ticket.0 == self.generation
    }

    /// Time left until the deadline, if armed.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }

    /// If armed and the deadline has passed, disarm and return true.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Timer future for the full delay.
    pub fn timer(&self) -> smol::Timer {
        smol::Timer::after(self.delay)
    }

    /// Sleep the full delay, then report whether `ticket` is still current.
    pub async fn wait(&self, ticket: DebounceTicket) -> bool {
        self.timer().await;
        self.is_current(ticket)
    }
}
