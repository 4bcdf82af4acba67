//! Fault scripting for simulated endpoints.
//!
//! Faults are attached to endpoint names. A scripted fault is consumed by
//! the next request to that endpoint; a sticky fault applies to every
//! request until it is cleared.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// What happens to one request hitting a faulty endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Transport-level failure; the request never arrives.
    Unreachable,
    /// The endpoint answers with an error status.
    Reject { status: i32, message: String },
    /// The endpoint answers normally after a pause.
    Delay(Duration),
    /// The endpoint never answers.
    Hang,
    /// A peer answers with a result digest no other peer produces.
    Diverge,
    /// A peer answers under another peer's name, signing with its own key.
    Impersonate { peer: String, org: String },
}

impl Fault {
    pub fn reject(status: i32, message: impl Into<String>) -> Self {
        Self::Reject {
            status,
            message: message.into(),
        }
    }

    pub fn impersonate(peer: impl Into<String>, org: impl Into<String>) -> Self {
        Self::Impersonate {
            peer: peer.into(),
            org: org.into(),
        }
    }
}

#[derive(Debug, Default)]
struct Faults {
    scripted: HashMap<String, VecDeque<Fault>>,
    sticky: HashMap<String, Fault>,
}

/// Per-endpoint fault table shared by every simulated component.
#[derive(Debug, Default)]
pub struct FaultInjector {
    inner: Mutex<Faults>,
}

impl FaultInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `fault` for the next request to `endpoint`.
    pub fn script(&self, endpoint: &str, fault: Fault) {
        self.inner
            .lock()
            .scripted
            .entry(endpoint.to_string())
            .or_default()
            .push_back(fault);
    }

    /// Make the next `times` requests to `endpoint` fail at the transport.
    pub fn fail_next(&self, endpoint: &str, times: usize) {
        for _ in 0..times {
            self.script(endpoint, Fault::Unreachable);
        }
    }

    /// Apply `fault` to every request to `endpoint` until cleared.
    pub fn set_sticky(&self, endpoint: &str, fault: Fault) {
        self.inner.lock().sticky.insert(endpoint.to_string(), fault);
    }

    pub fn take_down(&self, endpoint: &str) {
        self.set_sticky(endpoint, Fault::Unreachable);
    }

    /// Drop every fault attached to `endpoint`.
    pub fn restore(&self, endpoint: &str) {
        let mut faults = self.inner.lock();
        faults.scripted.remove(endpoint);
        faults.sticky.remove(endpoint);
    }

    /// Whether `endpoint` is taken down until restored. Does not consume
    /// scripted faults.
    pub fn is_down(&self, endpoint: &str) -> bool {
        self.inner.lock().sticky.get(endpoint) == Some(&Fault::Unreachable)
    }

    /// The fault that applies to the request now arriving at `endpoint`.
    /// Scripted faults win over sticky ones.
    pub fn next_fault(&self, endpoint: &str) -> Option<Fault> {
        let mut faults = self.inner.lock();
        if let Some(queue) = faults.scripted.get_mut(endpoint) {
            if let Some(fault) = queue.pop_front() {
                return Some(fault);
            }
        }
        faults.sticky.get(endpoint).cloned()
    }
}
