//! Kick-counting stopwatch.
//!
//! One [`SessionTimer`] backs one recording screen. Ticks arrive from the
//! ticker thread; every other transition comes from the user. The timer never
//! reads the clock to measure elapsed time, only to stamp a saved session.

use crate::clock::Clock;
use crate::error::StoreError;
use crate::kv::KeyValueStore;
use crate::session::{Session, KICK_TARGET};
use crate::store::SessionStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
    Complete,
}

impl TimerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Complete => "complete",
        }
    }
}

/// Counters of an in-progress session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerState {
    pub elapsed_seconds: u64,
    pub kick_count: u8,
    pub is_running: bool,
}

/// Result of a kick tap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KickOutcome {
    /// Timer not running, or the target was already reached
    Ignored,
    Counted(u8),
    /// This kick reached the target and stopped the timer
    Completed,
}

pub struct SessionTimer {
    state: TimerState,
    started_at: Option<DateTime<Utc>>,
    clock: Arc<dyn Clock>,
}

impl SessionTimer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: TimerState::default(),
            started_at: None,
            clock,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.state.elapsed_seconds
    }

    pub fn kick_count(&self) -> u8 {
        self.state.kick_count
    }

    /// When the timer was first started since the last reset
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn phase(&self) -> TimerPhase {
        if self.state.kick_count >= KICK_TARGET {
            TimerPhase::Complete
        } else if self.state.is_running {
            TimerPhase::Running
        } else if self.started_at.is_some() {
            TimerPhase::Paused
        } else {
            TimerPhase::Idle
        }
    }

    pub fn can_save(&self) -> bool {
        self.phase() == TimerPhase::Complete
    }

    /// Start or pause. Returns the new phase; a complete session stays complete.
    pub fn toggle_run(&mut self) -> TimerPhase {
        if self.phase() == TimerPhase::Complete {
            return TimerPhase::Complete;
        }
        self.state.is_running = !self.state.is_running;
        if self.state.is_running && self.started_at.is_none() {
            self.started_at = Some(self.clock.now());
        }
        self.phase()
    }

    /// One second passed. Ignored unless running.
    pub fn tick(&mut self) {
        if self.state.is_running {
            self.state.elapsed_seconds += 1;
        }
    }

    pub fn record_kick(&mut self) -> KickOutcome {
        if !self.state.is_running || self.state.kick_count >= KICK_TARGET {
            return KickOutcome::Ignored;
        }
        self.state.kick_count += 1;
        if self.state.kick_count == KICK_TARGET {
            self.state.is_running = false;
            KickOutcome::Completed
        } else {
            KickOutcome::Counted(self.state.kick_count)
        }
    }

    /// Persist a complete session and reset.
    ///
    /// `Ok(None)` when the session is not complete yet. On a store error the
    /// counters are kept so the save can be retried.
    pub fn save<K: KeyValueStore>(
        &mut self,
        store: &SessionStore<K>,
    ) -> Result<Option<Session>, StoreError> {
        if !self.can_save() {
            return Ok(None);
        }
        let session = Session::completed(self.clock.now(), self.state.elapsed_seconds);
        let saved = store.append(session)?;
        self.reset();
        Ok(Some(saved))
    }

    /// Drop the in-progress session. Returns true if it had any progress.
    pub fn discard(&mut self) -> bool {
        let had_progress = self.state.kick_count > 0 || self.state.elapsed_seconds > 0;
        self.reset();
        had_progress
    }

    fn reset(&mut self) {
        self.state = TimerState::default();
        self.started_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::kv::MemoryStore;
    use crate::store::SESSIONS_KEY;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap()
    }

    fn timer() -> (SessionTimer, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        (SessionTimer::new(clock.clone()), clock)
    }

    fn store() -> SessionStore<MemoryStore> {
        SessionStore::new(MemoryStore::new(), SESSIONS_KEY)
    }

    fn kick_to_target(timer: &mut SessionTimer) {
        for _ in 0..KICK_TARGET {
            timer.record_kick();
        }
    }

    #[test]
    fn test_initial_state() {
        let (timer, _) = timer();
        assert_eq!(timer.state(), TimerState::default());
        assert_eq!(timer.phase(), TimerPhase::Idle);
        assert!(!timer.can_save());
    }

    #[test]
    fn test_toggle_cycles_running_and_paused() {
        let (mut timer, _) = timer();
        assert_eq!(timer.toggle_run(), TimerPhase::Running);
        assert_eq!(timer.started_at(), Some(start()));
        assert_eq!(timer.toggle_run(), TimerPhase::Paused);
        assert_eq!(timer.toggle_run(), TimerPhase::Running);
    }

    #[test]
    fn test_tick_only_while_running() {
        let (mut timer, _) = timer();
        timer.tick();
        assert_eq!(timer.elapsed_seconds(), 0);

        timer.toggle_run();
        timer.tick();
        timer.tick();
        timer.toggle_run();
        timer.tick();
        assert_eq!(timer.elapsed_seconds(), 2);
    }

    #[test]
    fn test_kick_ignored_unless_running() {
        let (mut timer, _) = timer();
        assert_eq!(timer.record_kick(), KickOutcome::Ignored);
        assert_eq!(timer.kick_count(), 0);

        timer.toggle_run();
        assert_eq!(timer.record_kick(), KickOutcome::Counted(1));
        timer.toggle_run();
        assert_eq!(timer.record_kick(), KickOutcome::Ignored);
        assert_eq!(timer.kick_count(), 1);
    }

    #[test]
    fn test_tenth_kick_completes_and_stops() {
        let (mut timer, _) = timer();
        timer.toggle_run();
        for i in 1..KICK_TARGET {
            assert_eq!(timer.record_kick(), KickOutcome::Counted(i));
            // Pause attempts between kicks are undone before the next tap
            timer.toggle_run();
            assert_eq!(timer.record_kick(), KickOutcome::Ignored);
            timer.toggle_run();
        }
        assert_eq!(timer.record_kick(), KickOutcome::Completed);
        assert_eq!(timer.kick_count(), 10);
        assert!(!timer.is_running());
        assert_eq!(timer.phase(), TimerPhase::Complete);
    }

    #[test]
    fn test_complete_ignores_toggle_kick_and_tick() {
        let (mut timer, _) = timer();
        timer.toggle_run();
        kick_to_target(&mut timer);
        let before = timer.state();

        assert_eq!(timer.toggle_run(), TimerPhase::Complete);
        assert_eq!(timer.record_kick(), KickOutcome::Ignored);
        timer.tick();
        assert_eq!(timer.state(), before);
    }

    #[test]
    fn test_save_before_target_is_noop() {
        let (mut timer, _) = timer();
        let store = store();
        timer.toggle_run();
        for _ in 0..9 {
            timer.record_kick();
        }
        timer.tick();
        let before = timer.state();

        assert_eq!(timer.save(&store).unwrap(), None);
        assert_eq!(timer.state(), before);
        assert!(store.load_all().unwrap().is_empty());
        assert_eq!(store.backend().raw(SESSIONS_KEY), None);
    }

    #[test]
    fn test_save_resets_to_initial_state() {
        let (mut timer, _) = timer();
        let store = store();
        timer.toggle_run();
        kick_to_target(&mut timer);

        let saved = timer.save(&store).unwrap().unwrap();
        assert_eq!(saved.minutes, 1);
        assert_eq!(timer.state(), TimerState::default());
        assert_eq!(timer.phase(), TimerPhase::Idle);
        assert_eq!(timer.started_at(), None);
    }

    #[test]
    fn test_save_failure_keeps_counters() {
        let (mut timer, _) = timer();
        let store = store();
        timer.toggle_run();
        for _ in 0..90 {
            timer.tick();
        }
        kick_to_target(&mut timer);
        let before = timer.state();

        store.backend().fail_writes(true);
        assert!(timer.save(&store).is_err());
        assert_eq!(timer.state(), before);
        assert!(timer.can_save());

        store.backend().fail_writes(false);
        let saved = timer.save(&store).unwrap().unwrap();
        assert_eq!(saved.minutes, 2);
        assert_eq!(store.load_all().unwrap(), vec![saved]);
    }

    #[test]
    fn test_discard() {
        let (mut timer, _) = timer();
        assert!(!timer.discard());

        timer.toggle_run();
        timer.record_kick();
        assert!(timer.discard());
        assert_eq!(timer.state(), TimerState::default());
        assert_eq!(timer.phase(), TimerPhase::Idle);
    }

    #[test]
    fn test_125_second_session() {
        let (mut timer, clock) = timer();
        let store = store();
        timer.toggle_run();

        // Kicks spread over 125 seconds, the last one at the end
        for second in 1..=125u64 {
            clock.advance(Duration::seconds(1));
            timer.tick();
            if second % 13 == 0 || second == 125 {
                timer.record_kick();
            }
        }
        assert_eq!(timer.phase(), TimerPhase::Complete);
        assert_eq!(timer.elapsed_seconds(), 125);

        let saved = timer.save(&store).unwrap().unwrap();
        assert_eq!(saved.kicks, 10);
        assert_eq!(saved.minutes, 3);
        assert!(!saved.id.is_empty());
        assert!(saved.timestamp().unwrap() >= start());
        assert_eq!(store.load_all().unwrap(), vec![saved]);
    }
}
