//! Test utilities and stub collaborators for Eddy development.
//!
//! Every stub records its calls into a shared [`CallLog`], so a test can
//! assert the exact order and count of collaborator invocations within a
//! step. [`stub_kernels`] assembles a full [`KernelSet`](eddy_kernel::KernelSet)
//! of stubs that individual tests tune through the returned builder.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod stubs;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use eddy_core::KernelError;
use indexmap::IndexMap;

pub use fixtures::{ramp_state, uniform_state, DEFAULT_NDV};
pub use stubs::{stub_kernels, DissipationCall, DissipationProbe, StubKernels};

#[derive(Default)]
struct LogInner {
    calls: Vec<&'static str>,
    faults: IndexMap<&'static str, usize>,
}

/// Shared, ordered record of collaborator calls.
///
/// Clones share the same log. A fault armed with
/// [`fail_after`](CallLog::fail_after) makes the named collaborator
/// return an error once it has been called the given number of times.
#[derive(Clone, Default)]
pub struct CallLog {
    inner: Arc<Mutex<LogInner>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LogInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a call to `kernel`; fails if an armed fault triggers.
    pub fn record(&self, kernel: &'static str) -> Result<(), KernelError> {
        let mut inner = self.lock();
        let previous = inner.calls.iter().filter(|&&k| k == kernel).count();
        inner.calls.push(kernel);
        match inner.faults.get(kernel) {
            Some(&after) if previous >= after => Err(KernelError::failed(format!(
                "injected fault in {kernel} after {after} calls"
            ))),
            _ => Ok(()),
        }
    }

    /// Make `kernel` fail on every call after its first `after` calls.
    pub fn fail_after(&self, kernel: &'static str, after: usize) {
        self.lock().faults.insert(kernel, after);
    }

    /// Remove the fault armed for `kernel`.
    pub fn disarm(&self, kernel: &str) {
        self.lock().faults.shift_remove(kernel);
    }

    /// All calls in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    /// Number of calls to `kernel`.
    pub fn count(&self, kernel: &str) -> usize {
        self.lock().calls.iter().filter(|&&k| k == kernel).count()
    }

    /// Call counts per collaborator, in first-call order.
    pub fn counts(&self) -> IndexMap<&'static str, usize> {
        let mut counts = IndexMap::new();
        for &k in &self.lock().calls {
            *counts.entry(k).or_insert(0) += 1;
        }
        counts
    }

    /// Index of the first call to `kernel`.
    pub fn first(&self, kernel: &str) -> Option<usize> {
        self.lock().calls.iter().position(|&k| k == kernel)
    }

    /// Calls up to and including the first call to `kernel`.
    pub fn until(&self, kernel: &str) -> Vec<&'static str> {
        let calls = self.calls();
        match calls.iter().position(|&k| k == kernel) {
            Some(i) => calls[..=i].to_vec(),
            None => calls,
        }
    }

    /// Forget recorded calls; armed faults stay.
    pub fn clear(&self) {
        self.lock().calls.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_log() {
        let log = CallLog::new();
        let other = log.clone();
        log.record("a").unwrap();
        other.record("b").unwrap();
        log.record("a").unwrap();
        assert_eq!(log.calls(), vec!["a", "b", "a"]);
        assert_eq!(other.count("a"), 2);
        assert_eq!(log.first("b"), Some(1));
        assert_eq!(log.counts()["a"], 2);
        assert_eq!(log.until("b"), vec!["a", "b"]);
    }

    #[test]
    fn fault_triggers_after_n_calls() {
        let log = CallLog::new();
        log.fail_after("flux", 2);
        assert!(log.record("flux").is_ok());
        assert!(log.record("flux").is_ok());
        assert!(log.record("flux").is_err());
        assert!(log.record("other").is_ok());
        log.clear();
        assert!(log.calls().is_empty());
        assert!(log.record("flux").is_ok());
        assert!(log.record("flux").is_ok());
        assert!(log.record("flux").is_err());
        log.disarm("flux");
        assert!(log.record("flux").is_ok());
    }
}
