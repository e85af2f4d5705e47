//! Per-call execution context for store operations.
//!
//! A context carries an optional deadline and an optional cancellation flag.
//! Callers build one per request and pass it down unchanged; only the store
//! implementation inspects it.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared flag that lets one party cancel in-flight store calls.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Reason a context no longer permits work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    Cancelled,
    DeadlineExceeded,
}

impl Display for ContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::DeadlineExceeded => write!(f, "operation deadline exceeded"),
        }
    }
}

impl Error for ContextError {}

/// Deadline/cancellation carrier forwarded to the store.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    deadline: Option<Instant>,
    cancel: Option<CancelFlag>,
}

impl OpContext {
    /// Context without deadline or cancellation.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the deadline `timeout` from now. A timeout past the clock's range
    /// adds no deadline.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns an error once the context is cancelled or past its deadline.
    ///
    /// Cancellation wins when both apply.
    pub fn check(&self) -> Result<(), ContextError> {
        if self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.is_cancelled())
        {
            return Err(ContextError::Cancelled);
        }
        if self
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
        {
            return Err(ContextError::DeadlineExceeded);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{CancelFlag, ContextError, OpContext};
    use std::time::{Duration, Instant};

    #[test]
    fn background_context_never_expires() {
        assert_eq!(OpContext::background().check(), Ok(()));
    }

    #[test]
    fn cancelled_flag_is_observed_by_clones() {
        let flag = CancelFlag::new();
        let ctx = OpContext::background().with_cancel(flag.clone());
        assert_eq!(ctx.check(), Ok(()));

        flag.cancel();
        assert_eq!(ctx.check(), Err(ContextError::Cancelled));
    }

    #[test]
    fn past_deadline_is_reported() {
        let ctx = OpContext::background().with_deadline(Instant::now() - Duration::from_millis(1));
        assert_eq!(ctx.check(), Err(ContextError::DeadlineExceeded));

        let ctx = OpContext::background().with_timeout(Duration::from_secs(60));
        assert_eq!(ctx.check(), Ok(()));
    }

    #[test]
    fn unrepresentable_timeout_adds_no_deadline() {
        let ctx = OpContext::background().with_timeout(Duration::MAX);
        assert_eq!(ctx.deadline(), None);
        assert_eq!(ctx.check(), Ok(()));

        let ctx = OpContext::background()
            .with_deadline(Instant::now() - Duration::from_millis(1))
            .with_timeout(Duration::MAX);
        assert_eq!(ctx.check(), Err(ContextError::DeadlineExceeded));
    }

    #[test]
    fn cancellation_takes_precedence_over_deadline() {
        let flag = CancelFlag::new();
        flag.cancel();
        let ctx = OpContext::background()
            .with_deadline(Instant::now() - Duration::from_millis(1))
            .with_cancel(flag);
        assert_eq!(ctx.check(), Err(ContextError::Cancelled));
    }
}
