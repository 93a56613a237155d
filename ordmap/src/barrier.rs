//! [Barrier] counts pending asynchronous operations and lets callers wait for them to finish.
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError, RwLock};

/// A pending-operation counter with exclusive registration and shared draining.
///
/// [`register`](Barrier::register) takes the gate exclusively, [`drain`](Barrier::drain) takes it
/// shared. Any number of drains may wait together, but while one is waiting no new work can be
/// registered, so a drain waits for the work registered before it started and nothing else.
/// [`complete`](Barrier::complete) does not touch the gate.
#[derive(Debug, Default)]
pub struct Barrier {
    gate: RwLock<()>,
    pending: Mutex<usize>,
    drained: Condvar,
}

impl Barrier {
    /// Returns a barrier without pending operations.
    pub fn new() -> Self {
        Self::default()
    }

    fn pending_guard(&self) -> MutexGuard<'_, usize> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `count` pending operations, blocking while a drain is in progress.
    pub fn register(&self, count: usize) {
        let _gate = self.gate.write().unwrap_or_else(PoisonError::into_inner);
        *self.pending_guard() += count;
    }

    /// Marks one pending operation as complete.
    ///
    /// Returns `true` if this completed the last pending operation.
    pub fn complete(&self) -> bool {
        let mut pending = self.pending_guard();
        debug_assert!(*pending > 0, "barrier completed more often than registered");
        if *pending == 0 {
            return false;
        }
        *pending -= 1;
        if *pending == 0 {
            self.drained.notify_all();
            true
        } else {
            false
        }
    }

    /// Blocks until every operation registered before this call has completed.
    pub fn drain(&self) {
        let _gate = self.gate.read().unwrap_or_else(PoisonError::into_inner);
        let mut pending = self.pending_guard();
        while *pending > 0 {
            pending = self
                .drained
                .wait(pending)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Returns the number of operations registered but not yet completed.
    pub fn pending(&self) -> usize {
        *self.pending_guard()
    }
}

/// Completes one operation on the barrier when dropped, also while unwinding.
pub(crate) struct Completion<'a>(&'a Barrier);

impl<'a> Completion<'a> {
    pub fn new(barrier: &'a Barrier) -> Self {
        Completion(barrier)
    }
}

impl Drop for Completion<'_> {
    fn drop(&mut self) {
        self.0.complete();
    }
}
