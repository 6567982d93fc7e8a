//! Best-effort results
//!
//! Some steps (lockout bookkeeping, last-login stamps) must never fail the
//! operation they belong to. Their errors are collected here instead of
//! being discarded, so callers and tests can see what was skipped.

use crate::error::AuthError;

/// A bookkeeping step that failed without failing the operation
#[derive(Debug)]
pub struct Degradation {
    pub step: &'static str,
    pub error: AuthError,
}

/// Value plus the list of degraded steps that produced it
///
/// ## Examples
/// ```rust,ignore
/// let mut outcome = Outcome::ok(());
/// if let Err(e) = credentials.update_last_login(&user_id, now).await {
///     outcome.record("update_last_login", e);
/// }
/// assert_eq!(outcome.degraded_steps(), vec!["update_last_login"]);
/// ```
#[must_use]
#[derive(Debug)]
pub struct Outcome<T> {
    value: T,
    degraded: Vec<Degradation>,
}

impl<T> Outcome<T> {
    pub fn ok(value: T) -> Self {
        Self {
            value,
            degraded: Vec::new(),
        }
    }

    /// `value` was produced even though `step` failed
    pub fn degraded(value: T, step: &'static str, error: AuthError) -> Self {
        let mut outcome = Self::ok(value);
        outcome.record(step, error);
        outcome
    }

    /// Note a failed step; logged at warn
    pub fn record(&mut self, step: &'static str, error: AuthError) {
        tracing::warn!(step, error = %error, "Degraded: continuing without this step");
        self.degraded.push(Degradation { step, error });
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            degraded: self.degraded,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    pub fn degradations(&self) -> &[Degradation] {
        &self.degraded
    }

    pub fn degraded_steps(&self) -> Vec<&'static str> {
        self.degraded.iter().map(|d| d.step).collect()
    }
}
