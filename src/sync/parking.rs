//! `parking_lot` backed state lock.

use super::StateLock;
use crate::core::FsmError;
use parking_lot::{Mutex, MutexGuard};

/// Blocking mutex for machines shared between threads or tasks.
#[derive(Debug, Default)]
pub struct ParkingLotLock {
    inner: Mutex<()>,
}

impl StateLock for ParkingLotLock {
    type Guard<'a> = MutexGuard<'a, ()>;

    fn create() -> Result<Self, FsmError> {
        Ok(Self {
            inner: Mutex::new(()),
        })
    }

    fn acquire(&self) -> Result<Self::Guard<'_>, FsmError> {
        Ok(self.inner.lock())
    }
}
