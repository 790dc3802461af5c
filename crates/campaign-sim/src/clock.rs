//! Simulation clock.
//!
//! The tick counter is the only temporal state the driver keeps. Autosave
//! scheduling is derived from it, never stored alongside.

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// Tick counter for one campaign session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimClock {
    /// Number of completed ticks.
    tick: u64,
}

impl SimClock {
    /// A clock at tick 0.
    pub const fn new() -> Self {
        Self { tick: 0 }
    }

    /// A clock resumed at a given tick.
    pub const fn from_tick(tick: u64) -> Self {
        Self { tick }
    }

    /// Advance by one tick and return the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] at `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// The current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Whether the current tick is a multiple of `interval`. An interval of
    /// zero is never due.
    pub fn is_due(&self, interval: u64) -> bool {
        self.tick != 0 && self.tick.checked_rem(interval) == Some(0)
    }
}
