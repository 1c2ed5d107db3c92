//! Single shared study timer.
//!
//! `StudyTimer` is a plain state machine over wall-clock timestamps: it never
//! reads the clock itself, callers pass `now` in. The store owns the one timer
//! instance and applies the effects of `stop` to the timed entity.
//!
//! `Ticker` is the UI-side stopwatch cadence: a cancellable recurring callback.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TimerError;

/// Source of wall-clock time, injected so tests can drive time by hand.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        ManualClock { now: Mutex::new(start) }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        if let Ok(mut now) = self.now.lock() {
            *now = to;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    #[default]
    Idle,
    Running,
    Paused,
}

/// What the timer is booking time against.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TimerTarget {
    /// An ad-hoc study session on a subject.
    #[serde(rename_all = "camelCase")]
    Session {
        subject_id: String,
        #[serde(default)]
        topic_id: Option<String>,
        title: String,
        #[serde(default)]
        description: Option<String>,
    },
    /// A subject slot of a study cycle.
    #[serde(rename_all = "camelCase")]
    CycleSubject {
        cycle_id: String,
        cycle_subject_id: String,
    },
}

/// Result of stopping the timer: what was timed and for how long.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerOutcome {
    pub target: TimerTarget,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl TimerOutcome {
    pub fn minutes(&self) -> u32 {
        rounded_minutes(self.elapsed)
    }
}

/// Process-wide timer state. At most one target is timed at a time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StudyTimer {
    #[serde(default)]
    phase: TimerPhase,
    #[serde(default)]
    target: Option<TimerTarget>,
    /// Time booked by finished running intervals, in milliseconds.
    #[serde(default)]
    accumulated_ms: i64,
    /// Start of the current running interval.
    #[serde(default)]
    resumed_at: Option<DateTime<Utc>>,
    /// When the timer was first started for the current target.
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
}

impl StudyTimer {
    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn target(&self) -> Option<&TimerTarget> {
        self.target.as_ref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    pub fn is_idle(&self) -> bool {
        self.phase == TimerPhase::Idle
    }

    pub fn start(&mut self, target: TimerTarget, now: DateTime<Utc>) -> Result<(), TimerError> {
        if self.phase != TimerPhase::Idle {
            return Err(TimerError::AlreadyActive);
        }
        debug!(?target, "timer started");
        self.phase = TimerPhase::Running;
        self.target = Some(target);
        self.accumulated_ms = 0;
        self.resumed_at = Some(now);
        self.started_at = Some(now);
        Ok(())
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), TimerError> {
        if self.phase != TimerPhase::Running {
            return Err(TimerError::NotRunning);
        }
        self.accumulated_ms += self.running_interval(now).num_milliseconds();
        self.resumed_at = None;
        self.phase = TimerPhase::Paused;
        debug!(accumulated_ms = self.accumulated_ms, "timer paused");
        Ok(())
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), TimerError> {
        if self.phase != TimerPhase::Paused || self.target.is_none() {
            return Err(TimerError::NotPaused);
        }
        self.resumed_at = Some(now);
        self.phase = TimerPhase::Running;
        debug!("timer resumed");
        Ok(())
    }

    /// Finalizes the elapsed time and resets the timer to idle with no target.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<TimerOutcome, TimerError> {
        if self.phase == TimerPhase::Idle {
            return Err(TimerError::Idle);
        }
        let elapsed = self.elapsed(now);
        let started_at = self.started_at.unwrap_or(now);
        let target = self.target.take().ok_or(TimerError::Idle)?;
        *self = StudyTimer::default();
        debug!(elapsed_ms = elapsed.num_milliseconds(), "timer stopped");
        Ok(TimerOutcome { target, started_at, elapsed })
    }

    /// Accumulated time plus the current running interval. Never mutates.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        let mut total = Duration::milliseconds(self.accumulated_ms);
        if self.phase == TimerPhase::Running {
            total += self.running_interval(now);
        }
        total
    }

    fn running_interval(&self, now: DateTime<Utc>) -> Duration {
        match self.resumed_at {
            // clock going backwards books nothing
            Some(from) if now > from => now - from,
            _ => Duration::zero(),
        }
    }
}

/// Whole minutes, rounded half up. Negative durations count as zero.
pub fn rounded_minutes(elapsed: Duration) -> u32 {
    let ms = elapsed.num_milliseconds().max(0) as f64;
    (ms / 60_000.0).round() as u32
}

/// Formats a duration as `HH:MM:SS`.
pub fn format_clock(elapsed: Duration) -> String {
    let secs = elapsed.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Recurring callback on a background thread, stopped with `cancel()` or on drop.
///
/// Cadence is best effort: the callback runs `period` after the previous one
/// returned, so drift accumulates under load.
pub struct Ticker {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn every<F>(period: std::time::Duration, mut on_tick: F) -> Ticker
    where
        F: FnMut() + Send + 'static,
    {
        let (stop, stopped) = mpsc::channel::<()>();
        let handle = thread::spawn(move || loop {
            match stopped.recv_timeout(period) {
                Err(RecvTimeoutError::Timeout) => on_tick(),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });
        Ticker { stop: Some(stop), handle: Some(handle) }
    }

    pub fn is_active(&self) -> bool {
        self.stop.is_some()
    }

    /// Stops the callback and waits for the thread to exit. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, 10, 0, 0).unwrap()
    }

    fn session() -> TimerTarget {
        TimerTarget::Session {
            subject_id: "s1".into(),
            topic_id: None,
            title: "Reading".into(),
            description: None,
        }
    }

    #[test]
    fn start_only_from_idle() {
        let mut timer = StudyTimer::default();
        timer.start(session(), t0()).unwrap();
        assert_eq!(timer.start(session(), t0()), Err(TimerError::AlreadyActive));
        timer.pause(t0()).unwrap();
        assert_eq!(timer.start(session(), t0()), Err(TimerError::AlreadyActive));
    }

    #[test]
    fn pause_resume_sums_running_intervals() {
        let mut timer = StudyTimer::default();
        timer.start(session(), t0()).unwrap();
        timer.pause(t0() + Duration::minutes(10)).unwrap();
        // time while paused is not booked
        timer.resume(t0() + Duration::minutes(30)).unwrap();
        let outcome = timer.stop(t0() + Duration::minutes(35)).unwrap();
        assert_eq!(outcome.elapsed, Duration::minutes(15));
        assert_eq!(outcome.minutes(), 15);
        assert!(timer.is_idle());
        assert!(timer.target().is_none());
    }

    #[test]
    fn elapsed_is_a_pure_read() {
        let mut timer = StudyTimer::default();
        timer.start(session(), t0()).unwrap();
        let before = timer.clone();
        assert_eq!(timer.elapsed(t0() + Duration::seconds(90)), Duration::seconds(90));
        assert_eq!(timer, before);
        timer.pause(t0() + Duration::seconds(90)).unwrap();
        assert_eq!(timer.elapsed(t0() + Duration::hours(5)), Duration::seconds(90));
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let mut timer = StudyTimer::default();
        assert_eq!(timer.pause(t0()), Err(TimerError::NotRunning));
        assert_eq!(timer.resume(t0()), Err(TimerError::NotPaused));
        assert_eq!(timer.stop(t0()).unwrap_err(), TimerError::Idle);
        timer.start(session(), t0()).unwrap();
        assert_eq!(timer.resume(t0()), Err(TimerError::NotPaused));
    }

    #[test]
    fn stop_from_paused_keeps_booked_time() {
        let mut timer = StudyTimer::default();
        timer.start(session(), t0()).unwrap();
        timer.pause(t0() + Duration::seconds(150)).unwrap();
        let outcome = timer.stop(t0() + Duration::hours(1)).unwrap();
        assert_eq!(outcome.elapsed, Duration::seconds(150));
        assert_eq!(outcome.minutes(), 3);
    }

    #[test]
    fn minutes_round_half_up() {
        assert_eq!(rounded_minutes(Duration::seconds(29)), 0);
        assert_eq!(rounded_minutes(Duration::seconds(30)), 1);
        assert_eq!(rounded_minutes(Duration::seconds(-30)), 0);
        assert_eq!(format_clock(Duration::seconds(3725)), "01:02:05");
    }

    #[test]
    fn ticker_stops_after_cancel() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let mut ticker = Ticker::every(std::time::Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        thread::sleep(std::time::Duration::from_millis(60));
        ticker.cancel();
        assert!(!ticker.is_active());
        let seen = ticks.load(Ordering::SeqCst);
        assert!(seen > 0);
        thread::sleep(std::time::Duration::from_millis(30));
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
    }
}
