// src/session/timer.rs

use std::future::Future;
use std::time::Duration;

/// How loudly the clock should be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Normal,
    /// Less than 30 minutes left.
    Warning,
    /// Less than 10 minutes left.
    Critical,
}

/// Countdown for one exam session, decremented once per one-second tick.
#[derive(Debug, Clone)]
pub struct SessionTimer {
    remaining_secs: u64,
}

impl SessionTimer {
    pub fn from_minutes(minutes: u32) -> Self {
        SessionTimer {
            remaining_secs: u64::from(minutes) * 60,
        }
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_secs == 0
    }

    /// One tick of the countdown. Returns true exactly when this tick
    /// reached zero; further ticks keep returning false so expiry fires
    /// once.
    pub fn tick(&mut self) -> bool {
        if self.remaining_secs == 0 {
            return false;
        }
        self.remaining_secs -= 1;
        self.remaining_secs == 0
    }

    /// Clock display as total minutes and seconds ("184:59").
    pub fn format_clock(&self) -> String {
        let minutes = self.remaining_secs / 60;
        let seconds = self.remaining_secs % 60;
        format!("{:02}:{:02}", minutes, seconds)
    }

    pub fn urgency(&self) -> Urgency {
        if self.remaining_secs < 600 {
            Urgency::Critical
        } else if self.remaining_secs < 1800 {
            Urgency::Warning
        } else {
            Urgency::Normal
        }
    }
}

/// Drives a session timer to expiry and then finalizes the attempt.
///
/// Runs independently of any in-flight save: when the countdown reaches
/// zero the finalize future is invoked immediately and exactly once,
/// whatever the candidate was doing. Staged-but-uncommitted selections are
/// simply never sent. A finalization failure is logged and swallowed; the
/// candidate still proceeds to the result view.
pub async fn run_auto_submit<F, Fut, E>(mut timer: SessionTimer, finalize: F)
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    // The first tick of a tokio interval completes immediately.
    interval.tick().await;

    while !timer.is_expired() {
        interval.tick().await;
        timer.tick();
    }

    tracing::info!("session time is up, auto-submitting");
    if let Err(e) = finalize().await {
        tracing::error!("auto-submit finalization failed: {}", e);
    }
}
