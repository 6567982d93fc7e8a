//! Failed sign-in lockout rules
//!
//! An account locks once its consecutive failure count reaches
//! `max_attempts`. The lock holds until `locked_until`; after that the
//! counter starts over on the next failure.

use chrono::{DateTime, Duration, Utc};

/// Per-user failure bookkeeping as stored on the `users` row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoginState {
    pub login_attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
}

impl LoginState {
    /// State after a successful sign-in
    pub const fn cleared() -> Self {
        Self {
            login_attempts: 0,
            locked_until: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_attempts: u32,
    pub lockout_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_duration: Duration::minutes(30),
        }
    }
}

impl LockoutPolicy {
    pub fn new(max_attempts: u32, lockout_duration: Duration) -> Self {
        Self {
            max_attempts,
            lockout_duration,
        }
    }

    /// A pending `locked_until` decides. Without one, reaching the
    /// threshold still counts as locked.
    pub fn is_locked(&self, state: &LoginState, now: DateTime<Utc>) -> bool {
        match state.locked_until {
            Some(until) => now < until,
            None => state.login_attempts >= self.max_attempts,
        }
    }

    /// Next state after one more failed attempt
    ///
    /// The Postgres repository evaluates the same rule in a single UPDATE;
    /// keep the two in step.
    pub fn after_failure(&self, state: &LoginState, now: DateTime<Utc>) -> LoginState {
        let lock_expired = state.locked_until.is_some_and(|until| until <= now);

        let login_attempts = if lock_expired {
            1
        } else {
            state.login_attempts.saturating_add(1)
        };

        let locked_until = if login_attempts >= self.max_attempts {
            Some(self.lock_deadline(now))
        } else if lock_expired {
            None
        } else {
            state.locked_until
        };

        LoginState {
            login_attempts,
            locked_until,
        }
    }

    pub fn lock_deadline(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.lockout_duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn fail_n(policy: &LockoutPolicy, n: u32, now: DateTime<Utc>) -> LoginState {
        (0..n).fold(LoginState::default(), |s, _| policy.after_failure(&s, now))
    }

    #[test]
    fn test_below_threshold_not_locked() {
        let policy = LockoutPolicy::default();
        let state = fail_n(&policy, 4, t0());
        assert_eq!(state.login_attempts, 4);
        assert_eq!(state.locked_until, None);
        assert!(!policy.is_locked(&state, t0()));
    }

    #[test]
    fn test_threshold_sets_lock() {
        let policy = LockoutPolicy::default();
        let state = fail_n(&policy, 5, t0());
        assert_eq!(state.login_attempts, 5);
        assert_eq!(state.locked_until, Some(t0() + Duration::minutes(30)));
        assert!(policy.is_locked(&state, t0()));
        assert!(policy.is_locked(&state, t0() + Duration::minutes(29)));
    }

    #[test]
    fn test_lock_expires() {
        let policy = LockoutPolicy::default();
        let state = fail_n(&policy, 5, t0());
        assert!(!policy.is_locked(&state, t0() + Duration::minutes(30)));
        assert!(!policy.is_locked(&state, t0() + Duration::minutes(31)));
    }

    #[test]
    fn test_failure_after_expiry_restarts_count() {
        let policy = LockoutPolicy::default();
        let locked = fail_n(&policy, 5, t0());
        let later = t0() + Duration::minutes(31);

        let next = policy.after_failure(&locked, later);
        assert_eq!(next.login_attempts, 1);
        assert_eq!(next.locked_until, None);
        assert!(!policy.is_locked(&next, later));
    }

    #[test]
    fn test_failure_while_locked_extends_lock() {
        let policy = LockoutPolicy::default();
        let locked = fail_n(&policy, 5, t0());
        let later = t0() + Duration::minutes(10);

        let next = policy.after_failure(&locked, later);
        assert_eq!(next.login_attempts, 6);
        assert_eq!(next.locked_until, Some(later + Duration::minutes(30)));
    }

    #[test]
    fn test_threshold_without_timestamp_is_locked() {
        let policy = LockoutPolicy::default();
        let state = LoginState {
            login_attempts: 5,
            locked_until: None,
        };
        assert!(policy.is_locked(&state, t0()));
    }
}
