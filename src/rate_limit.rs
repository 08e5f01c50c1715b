//! # Rate Limiter Module
//!
//! ## Purpose
//! Tracks a sliding one-minute window of request timestamps plus a minimum
//! inter-request interval, and computes how long the next caller must wait
//! before its network call is permitted.
//!
//! ## Input/Output Specification
//! - **Input**: acquisition requests from concurrent search calls
//! - **Output**: bounded waits; a committed timestamp per permitted call
//! - **Invariant**: never more than N recorded calls in any trailing 60 s
//!
//! ## Key Features
//! - Lazy pruning of timestamps older than the trailing window
//! - Burst smoothing through a minimum gap even under the per-minute cap
//! - Reserve-then-record serialized under one lock so concurrent callers
//!   cannot both observe "no wait needed" and burst past the limit

use crate::config::RateLimitConfig;
use std::collections::VecDeque;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};

/// Length of the trailing window
const WINDOW: Duration = Duration::from_secs(60);

/// Sliding-window state. Pure time arithmetic, mutated only under the
/// limiter's lock; instants are passed in explicitly so the logic is
/// testable without sleeping.
#[derive(Debug)]
pub struct RateLimitWindow {
    max_per_minute: usize,
    min_interval: Duration,
    timestamps: VecDeque<Instant>,
    last_request: Option<Instant>,
}

impl RateLimitWindow {
    pub fn new(max_per_minute: usize, min_interval: Duration) -> Self {
        Self {
            max_per_minute: max_per_minute.max(1),
            min_interval,
            timestamps: VecDeque::new(),
            last_request: None,
        }
    }

    /// Discard timestamps that have left the trailing window
    fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.timestamps.front() {
            if now.duration_since(*oldest) >= WINDOW {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Compute the wait required before the next request is permitted.
    /// Zero means both constraints are satisfied immediately. Does not
    /// record anything; the caller commits with [`record_at`] once the
    /// wait has elapsed.
    ///
    /// [`record_at`]: RateLimitWindow::record_at
    pub fn reserve_at(&mut self, now: Instant) -> Duration {
        self.prune(now);

        let mut wait = Duration::ZERO;
        if self.timestamps.len() >= self.max_per_minute {
            if let Some(oldest) = self.timestamps.front() {
                // Wait until the oldest timestamp exits the window
                wait = wait.max((*oldest + WINDOW).duration_since(now));
            }
        }
        if let Some(last) = self.last_request {
            wait = wait.max((last + self.min_interval).duration_since(now));
        }
        wait
    }

    /// Commit a request timestamp. The slot stays consumed even if the
    /// caller later aborts its HTTP call.
    pub fn record_at(&mut self, now: Instant) {
        self.timestamps.push_back(now);
        self.last_request = Some(now);
    }

    /// Requests currently inside the trailing window
    pub fn in_flight(&mut self, now: Instant) -> usize {
        self.prune(now);
        self.timestamps.len()
    }
}

/// Process-wide rate-limit gate shared by all concurrent callers.
///
/// The window lives behind a single async mutex that is held across the
/// whole reserve-sleep-record sequence, so the check-then-act pair is
/// atomic with respect to concurrent callers. Waiters queue on the lock;
/// the wait for any one caller is bounded by one window length plus the
/// queue ahead of it.
#[derive(Debug)]
pub struct RateLimiter {
    window: Mutex<RateLimitWindow>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            window: Mutex::new(RateLimitWindow::new(
                config.requests_per_minute as usize,
                Duration::from_millis(config.min_interval_ms),
            )),
        }
    }

    /// Block until a request slot is available, then consume it.
    pub async fn acquire(&self) {
        let mut window = self.window.lock().await;
        loop {
            let now = Instant::now();
            let wait = window.reserve_at(now);
            if wait.is_zero() {
                window.record_at(now);
                return;
            }
            tracing::debug!(wait_ms = wait.as_millis() as u64, "rate limit gate waiting");
            sleep(wait).await;
        }
    }

    /// Requests recorded inside the current trailing window
    pub async fn current_load(&self) -> usize {
        self.window.lock().await.in_flight(Instant::now())
    }
}
