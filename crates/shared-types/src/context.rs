//! Per-call execution context.
//!
//! Each logical operation carries its own timeouts and cancellation signal;
//! there is no process-wide scheduler state. The signal is a
//! `tokio::sync::watch` channel so any number of in-flight requests can
//! observe one cancellation.

use std::time::Duration;
use tokio::sync::watch;

/// Upper bounds for each suspension point of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallTimeouts {
    /// Window for collecting endorsements from the fan-out.
    pub endorsement: Duration,
    /// Per-attempt bound on an orderer round-trip.
    pub ordering: Duration,
    /// Window for observing the commit event after broadcast.
    pub commit: Duration,
    /// Window for observing chaincode readiness after instantiate.
    pub ready: Duration,
}

impl Default for CallTimeouts {
    fn default() -> Self {
        Self {
            endorsement: Duration::from_secs(30),
            ordering: Duration::from_secs(30),
            commit: Duration::from_secs(30),
            ready: Duration::from_secs(30),
        }
    }
}

/// Caller side of a cancellation pair.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Abort every request observing the paired signal.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Observer side of a cancellation pair. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once cancellation is requested. Never resolves if the handle
    /// is dropped without cancelling.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

/// Create a linked cancel handle and signal.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx: Some(rx) })
}

/// Execution context of one logical operation.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    pub timeouts: CallTimeouts,
    pub cancel: CancelSignal,
}

impl CallContext {
    pub fn new(timeouts: CallTimeouts) -> Self {
        Self {
            timeouts,
            cancel: CancelSignal::never(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_cancel_wakes_waiter() {
        let (handle, signal) = cancel_pair();
        let waiter = tokio::spawn({
            let signal = signal.clone();
            async move { signal.cancelled().await }
        });

        handle.cancel();
        timeout(Duration::from_millis(100), waiter)
            .await
            .expect("waiter should wake")
            .expect("join");
        assert!(signal.is_cancelled());
        assert!(handle.is_cancelled());
    }

    #[tokio::test]
    async fn test_never_signal_stays_pending() {
        let signal = CancelSignal::never();
        let result = timeout(Duration::from_millis(20), signal.cancelled()).await;
        assert!(result.is_err());
        assert!(!signal.is_cancelled());
    }

    #[tokio::test]
    async fn test_dropped_handle_is_not_cancellation() {
        let (handle, signal) = cancel_pair();
        drop(handle);
        let result = timeout(Duration::from_millis(20), signal.cancelled()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_cancel_before_wait_resolves_immediately() {
        let (handle, signal) = cancel_pair();
        handle.cancel();
        drop(handle);
        timeout(Duration::from_millis(20), signal.cancelled())
            .await
            .expect("already cancelled");
    }
}
