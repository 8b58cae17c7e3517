//! Synchronization capability guarding the current/previous/next triple.
//!
//! The engine is generic over a [`StateLock`]. Choosing the lock type is how
//! an application opts in to concurrency safety:
//!
//! - [`NoLock`] for single-context use. Zero-sized, no locking cost.
//! - [`ParkingLotLock`] when `run` and `request_transition` are called from
//!   different threads or tasks.
//! - A custom implementation wrapping an RTOS mutex.
//!
//! The lock is held only around the read, compare and assign of the state
//! triple. It is never held while a state callback executes.

mod parking;

pub use parking::ParkingLotLock;

use crate::core::FsmError;

/// Mutual-exclusion primitive injected into the engine.
///
/// Releasing the lock is dropping the guard returned by [`acquire`].
///
/// # Example
///
/// ```rust
/// use tickfsm::sync::StateLock;
/// use tickfsm::FsmError;
/// use std::sync::Mutex;
///
/// struct StdLock(Mutex<()>);
///
/// impl StateLock for StdLock {
///     type Guard<'a> = std::sync::MutexGuard<'a, ()>;
///
///     fn create() -> Result<Self, FsmError> {
///         Ok(StdLock(Mutex::new(())))
///     }
///
///     fn acquire(&self) -> Result<Self::Guard<'_>, FsmError> {
///         self.0
///             .lock()
///             .map_err(|_| FsmError::generic("state lock poisoned"))
///     }
/// }
/// ```
///
/// [`acquire`]: StateLock::acquire
pub trait StateLock: Send + Sync + Sized {
    /// Proof of ownership; the lock is released when this is dropped.
    type Guard<'a>
    where
        Self: 'a;

    /// Create the primitive. Failure aborts [`Fsm::init`](crate::Fsm::init).
    fn create() -> Result<Self, FsmError>;

    /// Block until the lock is held. There is no timeout.
    fn acquire(&self) -> Result<Self::Guard<'_>, FsmError>;
}

/// Stand-in used when the machine is driven from a single execution context.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NoLock;

impl StateLock for NoLock {
    type Guard<'a> = ();

    fn create() -> Result<Self, FsmError> {
        Ok(NoLock)
    }

    fn acquire(&self) -> Result<Self::Guard<'_>, FsmError> {
        Ok(())
    }
}
