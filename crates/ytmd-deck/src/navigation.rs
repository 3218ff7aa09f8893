//! Dial rotation → skip commands.
//!
//! Raw rotation deltas arrive far faster than a track change can complete.
//! They are summed between ticks and at most one skip is issued per tick,
//! followed by a cooldown of `COOLDOWN_TICKS` ticks.

/// Ticks after a skip during which no further skip is issued.
pub const COOLDOWN_TICKS: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationAccumulator {
    accumulated: i64,
    cooldown: u8,
}

impl NavigationAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rotate(&mut self, delta: i64) {
        self.accumulated = self.accumulated.saturating_add(delta);
    }

    /// Advance one tick; returns the skip to issue, if any.
    pub fn tick(&mut self) -> Option<Skip> {
        if self.cooldown == 0 {
            if self.accumulated == 0 {
                return None;
            }
            let skip = if self.accumulated > 0 {
                Skip::Forward
            } else {
                Skip::Backward
            };
            self.accumulated = 0;
            self.cooldown = COOLDOWN_TICKS;
            return Some(skip);
        }

        self.cooldown -= 1;
        None
    }

    pub fn accumulated(&self) -> i64 {
        self.accumulated
    }

    pub fn cooldown(&self) -> u8 {
        self.cooldown
    }
}
