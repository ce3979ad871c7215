//! Time sources for the edge loop
//!
//! The detector and alarm never read a clock themselves. Every state
//! transition takes `now` as a parameter, and the device driver pulls it from
//! a [`TimeSource`] once per tick. Firmware wraps its hardware timer; tests
//! and simulations drive a [`FixedTime`] by hand.

/// Milliseconds since boot
pub type Timestamp = u64;

/// Millisecond clock read once per tick
pub trait TimeSource {
    /// Current time; must never decrease between calls
    fn now(&self) -> Timestamp;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedTime {
    at: Timestamp,
}

impl FixedTime {
    /// Clock stopped at `at`
    pub fn new(at: Timestamp) -> Self {
        Self { at }
    }

    /// Step forward; saturates instead of wrapping
    pub fn advance(&mut self, ms: u64) {
        self.at = self.at.saturating_add(ms);
    }

    /// Jump to `at`; ignored if that would move the clock backwards
    pub fn set(&mut self, at: Timestamp) {
        self.at = self.at.max(at);
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.at
    }
}

/// Milliseconds since construction, from `std::time::Instant`
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTime {
    boot: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicTime {
    /// Clock reading zero now
    pub fn new() -> Self {
        Self {
            boot: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for MonotonicTime {
    fn now(&self) -> Timestamp {
        u64::try_from(self.boot.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
