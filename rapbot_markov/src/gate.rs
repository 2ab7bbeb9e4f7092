// One-shot readiness signal.
//
// The gate starts closed-to-traffic ("not ready") and opens exactly once.
// Any number of threads can block in `wait`; all of them wake when the
// gate fires, and later callers return immediately. `close` is the
// pipeline's stop signal: it wakes every waiter of a gate that never
// fired so no worker thread is left parked forever.

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Returned by a wait on a gate that was closed before it fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("readiness gate closed before the model became ready")]
pub struct GateClosed;

#[derive(Debug, Default)]
struct GateState {
    ready: bool,
    closed: bool,
}

#[derive(Debug, Default)]
pub struct ReadyGate {
    state: Mutex<GateState>,
    cond: Condvar,
}

impl ReadyGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the gate. Returns `true` only for the call that actually fired it.
    pub fn fire(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.ready {
            return false;
        }
        state.ready = true;
        self.cond.notify_all();
        true
    }

    pub fn is_ready(&self) -> bool {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).ready
    }

    /// Block until the gate fires. A fired gate stays `Ok` even after `close`.
    pub fn wait(&self) -> Result<(), GateClosed> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let state = self
            .cond
            .wait_while(state, |s| !s.ready && !s.closed)
            .unwrap_or_else(PoisonError::into_inner);
        if state.ready { Ok(()) } else { Err(GateClosed) }
    }

    /// Like `wait`, but gives up after `timeout`. `Ok(false)` means timed out.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<bool, GateClosed> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let (state, _) = self
            .cond
            .wait_timeout_while(state, timeout, |s| !s.ready && !s.closed)
            .unwrap_or_else(PoisonError::into_inner);
        if state.ready {
            Ok(true)
        } else if state.closed {
            Err(GateClosed)
        } else {
            Ok(false)
        }
    }

    /// Wake all waiters; those still waiting for readiness get `GateClosed`.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.closed = true;
        self.cond.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn fires_exactly_once() {
        let gate = ReadyGate::new();
        assert!(!gate.is_ready());
        assert!(gate.fire());
        assert!(!gate.fire());
        assert!(gate.is_ready());
        assert_eq!(gate.wait(), Ok(()));
    }

    #[test]
    fn wakes_every_waiter() {
        let gate = Arc::new(ReadyGate::new());
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let gate = Arc::clone(&gate);
                thread::spawn(move || gate.wait())
            })
            .collect();
        gate.fire();
        for w in waiters {
            assert_eq!(w.join().unwrap(), Ok(()));
        }
    }

    #[test]
    fn close_releases_waiters_with_error() {
        let gate = Arc::new(ReadyGate::new());
        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.wait())
        };
        gate.close();
        assert_eq!(waiter.join().unwrap(), Err(GateClosed));
    }

    #[test]
    fn fired_gate_survives_close() {
        let gate = ReadyGate::new();
        gate.fire();
        gate.close();
        assert_eq!(gate.wait(), Ok(()));
        assert_eq!(gate.wait_timeout(Duration::from_millis(1)), Ok(true));
    }

    #[test]
    fn wait_timeout_expires() {
        let gate = ReadyGate::new();
        assert_eq!(gate.wait_timeout(Duration::from_millis(10)), Ok(false));
    }
}
