//! Cooperative cancellation.
//!
//! A [`CancellationToken`] is shared between whoever receives termination
//! signals and the copy/extract code, which polls it between entries and
//! while waiting on the archive tool. [`InterruptState`] holds the escalation
//! counter: the first interrupts request graceful cancellation, the last one
//! tells the caller to exit immediately.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Number of interrupts after which the process should stop waiting.
pub const DEFAULT_INTERRUPT_LIMIT: usize = 3;

/// Shared cancellation flag.
///
/// Cloning is cheap; all clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// What the receiver of an interrupt should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// Cancellation was requested; in-flight work winds down on its own.
    Cancel {
        /// Interrupts received so far
        count: usize,
    },
    /// The limit was reached; exit without waiting.
    ForceExit {
        /// Interrupts received so far
        count: usize,
    },
}

/// Escalation counter for termination signals.
///
/// # Example
///
/// ```
/// use addcopy::{CancellationToken, Interrupt, InterruptState};
///
/// let token = CancellationToken::new();
/// let state = InterruptState::new(token.clone());
///
/// assert_eq!(state.record(), Interrupt::Cancel { count: 1 });
/// assert!(token.is_cancelled());
/// assert_eq!(state.record(), Interrupt::Cancel { count: 2 });
/// assert_eq!(state.record(), Interrupt::ForceExit { count: 3 });
/// ```
#[derive(Debug)]
pub struct InterruptState {
    token: CancellationToken,
    count: AtomicUsize,
    limit: usize,
}

impl InterruptState {
    /// Escalate to [`Interrupt::ForceExit`] on the third interrupt.
    #[must_use]
    pub fn new(token: CancellationToken) -> Self {
        Self::with_limit(token, DEFAULT_INTERRUPT_LIMIT)
    }

    /// Escalate on interrupt number `limit` (clamped to at least 1).
    #[must_use]
    pub fn with_limit(token: CancellationToken, limit: usize) -> Self {
        Self {
            token,
            count: AtomicUsize::new(0),
            limit: limit.max(1),
        }
    }

    /// Record one interrupt, cancel the token, and report what to do next.
    pub fn record(&self) -> Interrupt {
        self.token.cancel();
        let count = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        if count >= self.limit {
            Interrupt::ForceExit { count }
        } else {
            Interrupt::Cancel { count }
        }
    }

    /// The token this state cancels.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}
