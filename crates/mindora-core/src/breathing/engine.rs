//! Breathing session engine.
//!
//! A tick-driven state machine. Each call to `tick()` is one second of the
//! session; the engine never spawns threads. Hosts either call `tick()`
//! themselves or await `next_tick()`, which owns the session's interval.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |
//!           v
//!       Completed            (any) -> Idle on reset
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = BreathingEngine::new(exercise, &store)?;
//! engine.open();
//! engine.start();
//! while engine.is_running() {
//!     engine.next_tick().await;
//! }
//! ```

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::catalog::Exercise;
use super::pattern::Phase;
use super::snapshot::SessionSnapshot;
use crate::error::ValidationError;
use crate::events::Event;
use crate::history::{CompletionLog, LogEntry, DEFAULT_LOG_KEY};
use crate::storage::KeyValueStore;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Running,
    Paused,
    Completed,
}

/// One breathing session bound to a store.
///
/// Snapshot writes and completion-log appends go through `store`; failures
/// are logged and otherwise ignored so the session keeps running in memory.
pub struct BreathingEngine<S: KeyValueStore> {
    exercise: Exercise,
    store: S,
    state_key: String,
    log_key: String,
    total_seconds: u32,
    state: SessionState,
    phase: Phase,
    seconds_left_in_phase: u32,
    progress_left: u32,
    cycles_completed: u32,
    tick_interval: Duration,
    /// Live only while running.
    ticker: Option<Interval>,
}

impl<S: KeyValueStore> BreathingEngine<S> {
    /// Create an engine in the fresh `Idle` state. Nothing is read from the
    /// store until `open()`.
    pub fn new(exercise: Exercise, store: S) -> Result<Self, ValidationError> {
        exercise.termination.validate(&exercise.pattern)?;
        let total_seconds = match exercise.total_seconds() {
            Some(0) => {
                return Err(ValidationError::ZeroBound {
                    field: "total_seconds".into(),
                })
            }
            Some(total) => total,
            None => {
                return Err(ValidationError::InvalidValue {
                    field: "cycles".into(),
                    message: "session length overflows".into(),
                })
            }
        };
        let phase = exercise.pattern.first_phase();
        Ok(Self {
            state_key: exercise.state_key(),
            log_key: DEFAULT_LOG_KEY.to_string(),
            seconds_left_in_phase: exercise.pattern.seconds(phase),
            progress_left: total_seconds,
            total_seconds,
            state: SessionState::Idle,
            phase,
            cycles_completed: 0,
            tick_interval: DEFAULT_TICK_INTERVAL,
            ticker: None,
            exercise,
            store,
        })
    }

    pub fn with_log_key(mut self, key: impl Into<String>) -> Self {
        self.log_key = key.into();
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.tick_interval = interval;
        }
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn exercise(&self) -> &Exercise {
        &self.exercise
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn seconds_left_in_phase(&self) -> u32 {
        self.seconds_left_in_phase
    }

    pub fn progress_left(&self) -> u32 {
        self.progress_left
    }

    pub fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }

    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.total_seconds - self.progress_left
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn is_completed(&self) -> bool {
        self.state == SessionState::Completed
    }

    pub fn has_live_ticker(&self) -> bool {
        self.ticker.is_some()
    }

    /// Whether a live snapshot for this exercise is in the store.
    pub fn has_saved_progress(&self) -> bool {
        matches!(self.store.get(&self.state_key), Ok(Some(_)))
    }

    /// Rounded 0..=100. Only a completed session reports 100.
    pub fn progress_percent(&self) -> u8 {
        if self.state == SessionState::Completed {
            return 100;
        }
        let pct = (f64::from(self.elapsed_seconds()) / f64::from(self.total_seconds) * 100.0).round();
        (pct as u8).min(99)
    }

    pub fn session_snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            phase_seconds_left: self.seconds_left_in_phase,
            progress_left: self.progress_left,
            cycles_completed: Some(self.cycles_completed),
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            session_type: self.exercise.id.clone(),
            state: self.state,
            phase: self.phase,
            phase_label: self.phase.label().to_string(),
            seconds_left_in_phase: self.seconds_left_in_phase,
            progress_left: self.progress_left,
            total_seconds: self.total_seconds,
            cycles_completed: self.cycles_completed,
            progress_pct: self.progress_percent(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Load any saved snapshot for this exercise. Never resumes ticking.
    pub fn open(&mut self) -> Event {
        self.ticker = None;
        self.load_fresh();

        let restored = match self.store.get(&self.state_key) {
            Ok(Some(raw)) => {
                match SessionSnapshot::parse(&raw, &self.exercise.pattern, self.total_seconds) {
                    Some(snapshot) => {
                        self.apply_snapshot(snapshot);
                        true
                    }
                    None => {
                        tracing::debug!(key = %self.state_key, "discarding unusable snapshot");
                        false
                    }
                }
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(key = %self.state_key, error = %e, "failed to read snapshot");
                false
            }
        };

        Event::SessionOpened {
            session_type: self.exercise.id.clone(),
            restored,
            state: self.state,
            at: Utc::now(),
        }
    }

    pub fn start(&mut self) -> Option<Event> {
        match self.state {
            SessionState::Running | SessionState::Completed => None,
            SessionState::Idle | SessionState::Paused => {
                let was_paused = self.state == SessionState::Paused;
                self.ticker = None;
                self.state = SessionState::Running;
                tracing::debug!(session = %self.exercise.id, phase = %self.phase, "session running");
                Some(if was_paused {
                    Event::SessionResumed {
                        phase: self.phase,
                        seconds_left_in_phase: self.seconds_left_in_phase,
                        progress_left: self.progress_left,
                        at: Utc::now(),
                    }
                } else {
                    Event::SessionStarted {
                        session_type: self.exercise.id.clone(),
                        phase: self.phase,
                        seconds_left_in_phase: self.seconds_left_in_phase,
                        total_seconds: self.total_seconds,
                        at: Utc::now(),
                    }
                })
            }
        }
    }

    pub fn resume(&mut self) -> Option<Event> {
        self.start()
    }

    /// Stop ticking and save the current position. Safe to call repeatedly.
    pub fn pause(&mut self) -> Option<Event> {
        self.ticker = None;
        match self.state {
            SessionState::Running => {
                self.state = SessionState::Paused;
                self.persist();
                Some(Event::SessionPaused {
                    phase: self.phase,
                    seconds_left_in_phase: self.seconds_left_in_phase,
                    progress_left: self.progress_left,
                    at: Utc::now(),
                })
            }
            SessionState::Idle | SessionState::Paused => {
                self.persist();
                None
            }
            SessionState::Completed => None,
        }
    }

    /// Host teardown. Same as `pause()`.
    pub fn stop(&mut self) -> Option<Event> {
        self.pause()
    }

    pub fn reset(&mut self) -> Event {
        self.ticker = None;
        self.load_fresh();
        if let Err(e) = self.store.remove(&self.state_key) {
            tracing::warn!(key = %self.state_key, error = %e, "failed to clear snapshot");
        }
        Event::SessionReset {
            session_type: self.exercise.id.clone(),
            at: Utc::now(),
        }
    }

    /// Advance the session by one second.
    ///
    /// Returns `PhaseChanged` when a new phase begins and `SessionCompleted`
    /// on the final second. Does nothing unless running.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != SessionState::Running {
            return None;
        }

        self.seconds_left_in_phase = self.seconds_left_in_phase.saturating_sub(1);
        self.progress_left = self.progress_left.saturating_sub(1);

        if self.progress_left == 0 {
            return Some(self.complete());
        }

        let event = (self.seconds_left_in_phase == 0).then(|| self.advance());
        self.persist();
        event
    }

    /// Wait for the next tick of this session's interval, then apply it.
    ///
    /// The interval is created on the first wait after `start()` and dropped
    /// by `pause()`, `reset()` and completion. Returns `None` immediately
    /// when not running.
    pub async fn next_tick(&mut self) -> Option<Event> {
        if self.state != SessionState::Running {
            return None;
        }
        let period = self.tick_interval;
        let ticker = self.ticker.get_or_insert_with(|| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        ticker.tick().await;
        self.tick()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self) -> Event {
        self.ticker = None;
        self.state = SessionState::Completed;
        self.progress_left = 0;
        if let super::pattern::Termination::Cycles(n) = self.exercise.termination {
            self.cycles_completed = n;
        }

        let log = CompletionLog::new(&self.store, self.log_key.as_str());
        if let Err(e) = log.append(LogEntry::new(self.exercise.id.clone(), self.total_seconds)) {
            tracing::warn!(key = %self.log_key, error = %e, "failed to append completion log");
        }
        if let Err(e) = self.store.remove(&self.state_key) {
            tracing::warn!(key = %self.state_key, error = %e, "failed to clear snapshot");
        }

        tracing::info!(
            session = %self.exercise.id,
            duration_seconds = self.total_seconds,
            "breathing session completed"
        );
        Event::SessionCompleted {
            session_type: self.exercise.id.clone(),
            duration_seconds: self.total_seconds,
            cycles_completed: self.cycles_completed,
            at: Utc::now(),
        }
    }

    /// Move to the next non-empty phase. Wrapping into inhale counts a cycle,
    /// even when inhale itself is skipped.
    fn advance(&mut self) -> Event {
        // At least one phase is non-empty, so this settles within four steps.
        for _ in 0..Phase::ALL.len() {
            self.phase = self.phase.next();
            if self.phase == Phase::Inhale {
                self.cycles_completed += 1;
            }
            self.seconds_left_in_phase = self.exercise.pattern.seconds(self.phase);
            if self.seconds_left_in_phase > 0 {
                break;
            }
        }
        tracing::debug!(
            session = %self.exercise.id,
            phase = %self.phase,
            seconds = self.seconds_left_in_phase,
            "phase changed"
        );
        Event::PhaseChanged {
            phase: self.phase,
            seconds_left_in_phase: self.seconds_left_in_phase,
            cycles_completed: self.cycles_completed,
            at: Utc::now(),
        }
    }

    fn load_fresh(&mut self) {
        self.state = SessionState::Idle;
        self.phase = self.exercise.pattern.first_phase();
        self.seconds_left_in_phase = self.exercise.pattern.seconds(self.phase);
        self.progress_left = self.total_seconds;
        self.cycles_completed = 0;
    }

    fn apply_snapshot(&mut self, snapshot: SessionSnapshot) {
        self.phase = snapshot.phase;
        self.seconds_left_in_phase = snapshot.phase_seconds_left;
        self.progress_left = snapshot.progress_left;
        let cycle = self.exercise.pattern.cycle_seconds().max(1);
        self.cycles_completed = snapshot
            .cycles_completed
            .unwrap_or_else(|| self.elapsed_seconds() / cycle);
        self.state = if self.progress_left < self.total_seconds {
            SessionState::Paused
        } else {
            SessionState::Idle
        };
    }

    fn persist(&self) {
        let json = match serde_json::to_string(&self.session_snapshot()) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode snapshot");
                return;
            }
        };
        if let Err(e) = self.store.set(&self.state_key, &json) {
            tracing::warn!(key = %self.state_key, error = %e, "failed to save snapshot");
        }
    }
}
