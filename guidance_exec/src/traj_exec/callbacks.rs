//! Progress callback registry
//!
//! Callbacks are registered against a completion threshold and fire once per trajectory
//! activation, the first time the completion fraction reaches their threshold. The thresholds and
//! callbacks never change once registered, the fired flags live in a separate set which is
//! rebuilt in one go whenever a new trajectory is activated.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use std::fmt::Debug;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A progress callback, given the completion fraction that triggered it.
pub type ProgressCallback = Box<dyn FnMut(f64)>;

/// Identifies a registered callback. Ids are handed out in registration order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct CallbackId(usize);

/// Registration-ordered set of progress callbacks.
#[derive(Default)]
pub struct ProgressCallbacks {
    entries: Vec<ProgressEntry>,
    fired: FiredSet,
}

struct ProgressEntry {
    threshold: f64,
    callback: ProgressCallback,
}

/// Which callbacks have fired during the current activation.
#[derive(Debug, Default, Clone, PartialEq)]
struct FiredSet(Vec<bool>);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ProgressCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback to fire when the completion fraction reaches `threshold`.
    ///
    /// The threshold is not validated. Duplicate and out of order thresholds are fine, each
    /// entry is evaluated on its own.
    pub fn register<F>(&mut self, threshold: f64, callback: F) -> CallbackId
    where
        F: FnMut(f64) + 'static,
    {
        self.entries.push(ProgressEntry {
            threshold,
            callback: Box::new(callback),
        });
        self.fired.0.push(false);

        CallbackId(self.entries.len() - 1)
    }

    /// Clear every fired flag.
    pub fn reset_all(&mut self) {
        self.fired = FiredSet::new(self.entries.len());
    }

    /// Fire, in registration order, every callback which hasn't fired yet and whose threshold
    /// `fraction` has reached.
    ///
    /// Returns the number of callbacks fired.
    pub fn notify(&mut self, fraction: f64) -> usize {
        let mut num_fired = 0;

        for (i, entry) in self.entries.iter_mut().enumerate() {
            if !self.fired.0[i] && fraction >= entry.threshold {
                trace!(
                    "Firing progress callback {} (threshold {}) at {}",
                    i,
                    entry.threshold,
                    fraction
                );
                (entry.callback)(fraction);
                self.fired.0[i] = true;
                num_fired += 1;
            }
        }

        num_fired
    }

    /// True if the callback has fired since the last reset.
    pub fn has_fired(&self, id: CallbackId) -> bool {
        self.fired.0.get(id.0).copied().unwrap_or(false)
    }

    /// The threshold the callback was registered with.
    pub fn threshold(&self, id: CallbackId) -> Option<f64> {
        self.entries.get(id.0).map(|e| e.threshold)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Debug for ProgressCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let thresholds: Vec<f64> = self.entries.iter().map(|e| e.threshold).collect();

        f.debug_struct("ProgressCallbacks")
            .field("thresholds", &thresholds)
            .field("fired", &self.fired.0)
            .finish()
    }
}

impl FiredSet {
    fn new(len: usize) -> Self {
        Self(vec![false; len])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_fires_once_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut cbs = ProgressCallbacks::new();

        let l = log.clone();
        let late = cbs.register(0.75, move |f| l.borrow_mut().push(("late", f)));
        let l = log.clone();
        let early = cbs.register(0.25, move |f| l.borrow_mut().push(("early", f)));

        assert_eq!(cbs.notify(0.1), 0);
        assert_eq!(cbs.notify(0.3), 1);
        assert!(cbs.has_fired(early));
        assert!(!cbs.has_fired(late));

        // Both eligible, the already fired one is skipped and the rest fire in registration order
        assert_eq!(cbs.notify(0.9), 1);
        assert_eq!(cbs.notify(1.0), 0);

        assert_eq!(*log.borrow(), vec![("early", 0.3), ("late", 0.9)]);
    }

    #[test]
    fn test_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut cbs = ProgressCallbacks::new();

        for (name, threshold) in [("a", 0.5), ("b", 0.1), ("c", 0.5)].iter().copied() {
            let l = log.clone();
            cbs.register(threshold, move |_| l.borrow_mut().push(name));
        }

        assert_eq!(cbs.notify(0.6), 3);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_reset_all() {
        let count = Rc::new(RefCell::new(0));
        let mut cbs = ProgressCallbacks::new();

        let c = count.clone();
        let id = cbs.register(0.5, move |_| *c.borrow_mut() += 1);
        assert_eq!(cbs.threshold(id), Some(0.5));

        cbs.notify(0.5);
        cbs.notify(0.7);
        assert_eq!(*count.borrow(), 1);

        cbs.reset_all();
        assert!(!cbs.has_fired(id));

        cbs.notify(0.6);
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_sentinel_threshold() {
        let mut cbs = ProgressCallbacks::new();
        let id = cbs.register(-1.0, |_| ());

        assert_eq!(cbs.notify(-1.0), 1);
        assert!(cbs.has_fired(id));
        assert_eq!(cbs.len(), 1);
        assert!(!cbs.is_empty());
    }
}
