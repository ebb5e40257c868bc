use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    /// Not armed: nothing happened.
    Idle,
    Running(u32),
    /// Reached zero on this tick. Reported once; the countdown is disarmed afterwards.
    Expired,
}

/// A seconds countdown advanced by an external clock, one `tick` per second.
///
/// `on_expire` is an `FnOnce`, so it runs at most once no matter how often
/// the countdown is ticked, re-armed or disarmed.
pub struct Countdown {
    total_seconds: u32,
    remaining: u32,
    armed: bool,
    expired: bool,
    on_expire: Option<Box<dyn FnOnce() + Send>>,
}

impl Countdown {
    pub fn new(total_seconds: u32) -> Self {
        Self {
            total_seconds,
            remaining: total_seconds,
            armed: false,
            expired: false,
            on_expire: None,
        }
    }

    pub fn with_on_expire(total_seconds: u32, on_expire: impl FnOnce() + Send + 'static) -> Self {
        Self {
            on_expire: Some(Box::new(on_expire)),
            ..Self::new(total_seconds)
        }
    }

    /// Starts ticking. Has no effect once expired.
    pub fn arm(&mut self) {
        if !self.expired {
            self.armed = true;
        }
    }

    /// Stops ticking. Safe to call at any time, including after expiry.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    pub fn tick(&mut self) -> CountdownTick {
        if !self.armed {
            return CountdownTick::Idle;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return CountdownTick::Running(self.remaining);
        }

        self.armed = false;
        self.expired = true;
        if let Some(on_expire) = self.on_expire.take() {
            on_expire();
        }
        CountdownTick::Expired
    }

    /// Applies `seconds` ticks and returns the most significant outcome.
    pub fn advance(&mut self, seconds: u32) -> CountdownTick {
        let mut last = CountdownTick::Idle;
        for _ in 0..seconds {
            match self.tick() {
                CountdownTick::Idle => break,
                CountdownTick::Expired => return CountdownTick::Expired,
                running => last = running,
            }
        }
        last
    }

    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }
}

impl fmt::Debug for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Countdown")
            .field("total_seconds", &self.total_seconds)
            .field("remaining", &self.remaining)
            .field("armed", &self.armed)
            .field("expired", &self.expired)
            .finish()
    }
}
