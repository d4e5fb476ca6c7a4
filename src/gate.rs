use std::sync::{Mutex, MutexGuard, TryLockError};

/// Non-blocking mutual exclusion around the single heavy inference call.
///
/// A request that finds the gate held fails immediately instead of queueing;
/// callers map that to HTTP 429. The guard releases on drop, so the gate is
/// freed on every exit path once acquired.
pub struct InferenceGate {
    inner: Mutex<()>,
}

pub struct GateGuard<'a> {
    _held: MutexGuard<'a, ()>,
}

impl InferenceGate {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(()),
        }
    }

    /// Returns `None` when another inference is already running.
    pub fn try_acquire(&self) -> Option<GateGuard<'_>> {
        match self.inner.try_lock() {
            Ok(held) => Some(GateGuard { _held: held }),
            Err(TryLockError::WouldBlock) => None,
            // Poisoning means a panic mid-inference; the lock protects no
            // data, so the guard is still valid.
            Err(TryLockError::Poisoned(poisoned)) => Some(GateGuard {
                _held: poisoned.into_inner(),
            }),
        }
    }
}

impl Default for InferenceGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let gate = InferenceGate::new();
        let guard = gate.try_acquire();
        assert!(guard.is_some());
        assert!(gate.try_acquire().is_none());
        drop(guard);
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn guard_releases_on_early_drop() {
        let gate = InferenceGate::new();
        {
            let _guard = gate.try_acquire().unwrap();
        }
        assert!(gate.try_acquire().is_some());
    }
}
