//! Idle Escalator
//!
//! State machine for candidate inactivity. It owns at most one deadline; the
//! session task sleeps until that deadline and reports expiry back here. All
//! transitions happen on the session task, so cancel-then-arm is atomic.
//!
//! ```text
//! Disarmed --arm--> Armed --timeout--> Firing(n) --arm--> Armed ...
//!    ^                |                    |
//!    +----disarm------+      n == max ---> Terminated
//! ```

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalatorPhase {
    Disarmed,
    Armed,
    /// A reminder has been sent; waiting for the next external arm.
    Firing(u32),
    /// The reminder budget is exhausted and the session was cancelled.
    Terminated,
}

/// Snapshot of the escalator for observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationState {
    pub count: u32,
    pub armed: bool,
    pub last_activity: Instant,
}

/// What the session should do when the deadline expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutAction {
    /// Nothing was armed; the expiry is stale.
    Ignore,
    /// The session completed meanwhile; stand down quietly.
    StandDown,
    /// Generate and emit reminder number `attempt` (1-based).
    Remind { attempt: u32 },
}

/// Result of recording an emitted reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderOutcome {
    AwaitRearm { count: u32 },
    Terminate,
}

#[derive(Debug, Clone)]
pub struct IdleEscalator {
    phase: EscalatorPhase,
    count: u32,
    max_reminders: u32,
    timeout: Duration,
    deadline: Option<Instant>,
    last_activity: Instant,
}

impl IdleEscalator {
    pub fn new(timeout: Duration, max_reminders: u32) -> Self {
        Self {
            phase: EscalatorPhase::Disarmed,
            count: 0,
            max_reminders: max_reminders.max(1),
            timeout,
            deadline: None,
            last_activity: Instant::now(),
        }
    }

    pub fn phase(&self) -> EscalatorPhase {
        self.phase
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn state(&self) -> EscalationState {
        EscalationState {
            count: self.count,
            armed: self.deadline.is_some(),
            last_activity: self.last_activity,
        }
    }

    /// Starts waiting for the candidate, replacing any pending deadline.
    ///
    /// A completed session is disarmed instead; a terminated escalator
    /// ignores the call.
    pub fn arm(&mut self, now: Instant, session_complete: bool) {
        if self.phase == EscalatorPhase::Terminated {
            return;
        }
        if session_complete {
            self.stand_down();
            return;
        }
        self.deadline = Some(now + self.timeout);
        self.phase = EscalatorPhase::Armed;
        debug!(
            count = self.count,
            timeout_ms = self.timeout.as_millis() as u64,
            "Idle timer armed"
        );
    }

    /// Cancels the pending deadline (the interviewer started speaking).
    /// The escalation count is kept. Safe to call in any state.
    pub fn disarm(&mut self, now: Instant) {
        self.last_activity = now;
        if self.phase == EscalatorPhase::Terminated {
            return;
        }
        if self.deadline.take().is_some() {
            debug!("Idle timer disarmed");
        }
        if self.phase == EscalatorPhase::Armed {
            self.phase = if self.count == 0 {
                EscalatorPhase::Disarmed
            } else {
                EscalatorPhase::Firing(self.count)
            };
        }
    }

    /// The candidate did something: cancel the deadline and reset the count.
    pub fn candidate_active(&mut self, now: Instant) {
        self.last_activity = now;
        if self.phase == EscalatorPhase::Terminated {
            return;
        }
        self.deadline = None;
        self.count = 0;
        self.phase = EscalatorPhase::Disarmed;
    }

    /// Moves to `Disarmed` with a zero count. Used when the session completes.
    pub fn stand_down(&mut self) {
        if self.phase == EscalatorPhase::Terminated {
            return;
        }
        self.deadline = None;
        self.count = 0;
        self.phase = EscalatorPhase::Disarmed;
    }

    /// Handles expiry of the deadline.
    pub fn on_timeout(&mut self, session_complete: bool) -> TimeoutAction {
        if self.phase != EscalatorPhase::Armed || self.deadline.take().is_none() {
            return TimeoutAction::Ignore;
        }
        if session_complete {
            self.stand_down();
            return TimeoutAction::StandDown;
        }
        self.phase = EscalatorPhase::Firing(self.count);
        TimeoutAction::Remind {
            attempt: self.count + 1,
        }
    }

    /// Records that a reminder was emitted.
    pub fn record_reminder(&mut self) -> ReminderOutcome {
        if self.phase == EscalatorPhase::Terminated {
            return ReminderOutcome::Terminate;
        }
        self.count += 1;
        if self.count >= self.max_reminders {
            info!(reminders = self.count, "Reminder budget exhausted");
            self.terminate();
            ReminderOutcome::Terminate
        } else {
            self.phase = EscalatorPhase::Firing(self.count);
            ReminderOutcome::AwaitRearm { count: self.count }
        }
    }

    /// Moves to the terminal state. Idempotent.
    pub fn terminate(&mut self) {
        self.deadline = None;
        self.count = 0;
        self.phase = EscalatorPhase::Terminated;
    }
}
