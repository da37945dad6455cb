//! Subscription Registry - (object, key) → dependent effects.
//!
//! Process-wide (thread-local, since the model is single-threaded) table of
//! subscriber sets. Entries are created lazily on first [`track`] and are
//! never pruned; an effect leaves a set only when it is stopped.
//!
//! Each effect keeps a back-reference to every [`Dep`] it joined so that
//! stopping it costs O(k) in the number of subscriptions.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::trace;

use super::effect::{active_subscriber, EffectId, Subscriber};
use crate::types::ObjectId;

// =============================================================================
// Dep
// =============================================================================

/// Insertion-ordered set of subscribers for one (object, key) pair.
#[derive(Clone, Default)]
pub(crate) struct Dep(Rc<RefCell<IndexMap<EffectId, Rc<dyn Subscriber>>>>);

impl Dep {
    /// Add a subscriber. Returns false if it was already present.
    fn insert(&self, subscriber: Rc<dyn Subscriber>) -> bool {
        let mut members = self.0.borrow_mut();
        if members.contains_key(&subscriber.id()) {
            return false;
        }
        members.insert(subscriber.id(), subscriber);
        true
    }

    /// Remove a subscriber. Removing one that is absent is a no-op.
    pub(crate) fn remove(&self, id: EffectId) {
        self.0.borrow_mut().shift_remove(&id);
    }

    fn contains(&self, id: EffectId) -> bool {
        self.0.borrow().contains_key(&id)
    }

    fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Copy of the current members, so notification can re-enter the set.
    fn snapshot(&self) -> Vec<Rc<dyn Subscriber>> {
        self.0.borrow().values().cloned().collect()
    }
}

// =============================================================================
// Registry State
// =============================================================================

thread_local! {
    /// Object id → property key → subscribers.
    static TARGET_MAP: RefCell<HashMap<ObjectId, HashMap<String, Dep>>> =
        RefCell::new(HashMap::new());
}

fn dep_for(target: ObjectId, key: &str) -> Dep {
    TARGET_MAP.with(|map| {
        let mut map = map.borrow_mut();
        let deps = map.entry(target).or_default();
        match deps.get(key) {
            Some(dep) => dep.clone(),
            None => {
                let dep = Dep::default();
                deps.insert(key.to_string(), dep.clone());
                dep
            }
        }
    })
}

fn existing_dep(target: ObjectId, key: &str) -> Option<Dep> {
    TARGET_MAP.with(|map| map.borrow().get(&target)?.get(key).cloned())
}

// =============================================================================
// Track / Trigger
// =============================================================================

/// Record that the currently running effect depends on `(target, key)`.
///
/// No-op when no effect is running or dependency collection is disabled
/// for the current frame (see [`untrack`](super::untrack)).
pub fn track(target: ObjectId, key: &str) {
    let Some(subscriber) = active_subscriber() else {
        return;
    };

    let dep = dep_for(target, key);
    if dep.insert(subscriber.clone()) {
        subscriber.add_dep(dep);
    }
}

/// Re-invoke every effect subscribed to `(target, key)`.
///
/// Effects with a scheduler get the scheduler called instead of running.
/// Runs are synchronous; nested triggers recurse through this same path.
pub fn trigger(target: ObjectId, key: &str) {
    let Some(dep) = existing_dep(target, key) else {
        trace!(target: "spark_render::reactivity", object = %target, key, "trigger without subscribers");
        return;
    };

    for subscriber in dep.snapshot() {
        // An earlier run in this loop may have stopped a later subscriber.
        if !dep.contains(subscriber.id()) || !subscriber.is_active() {
            continue;
        }
        subscriber.notify();
    }
}

// =============================================================================
// Introspection
// =============================================================================

/// Number of effects currently subscribed to `(target, key)`.
pub fn subscriber_count(target: ObjectId, key: &str) -> usize {
    existing_dep(target, key).map_or(0, |dep| dep.len())
}

/// Drop every subscription table (for testing).
///
/// Effects that are still active keep their back-references but will never
/// be triggered through the dropped tables again.
pub fn reset_registry() {
    TARGET_MAP.with(|map| map.borrow_mut().clear());
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::reactivity::{effect, untrack, EffectRunner};
    use crate::types::Object;

    #[test]
    fn test_track_outside_effect_is_noop() {
        reset_registry();
        let obj = Object::new();

        track(obj.id(), "a");
        assert_eq!(subscriber_count(obj.id(), "a"), 0);
    }

    #[test]
    fn test_trigger_without_subscribers_is_noop() {
        reset_registry();
        let obj = Object::new();

        // Neither the object nor the key was ever tracked.
        trigger(obj.id(), "missing");
        assert_eq!(subscriber_count(obj.id(), "missing"), 0);
    }

    #[test]
    fn test_track_and_trigger() {
        reset_registry();
        let obj = Object::new();
        let id = obj.id();

        let runs = Rc::new(Cell::new(0));
        let runs_clone = runs.clone();
        let _runner = effect(move || {
            track(id, "a");
            track(id, "a");
            runs_clone.set(runs_clone.get() + 1);
        });

        assert_eq!(runs.get(), 1);
        assert_eq!(subscriber_count(id, "a"), 1);

        trigger(id, "a");
        assert_eq!(runs.get(), 2);

        trigger(id, "b");
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_untrack_suppresses_collection() {
        reset_registry();
        let obj = Object::new();
        let id = obj.id();

        let _runner = effect(move || {
            untrack(|| track(id, "hidden"));
            track(id, "seen");
        });

        assert_eq!(subscriber_count(id, "hidden"), 0);
        assert_eq!(subscriber_count(id, "seen"), 1);
    }

    #[test]
    fn test_stop_during_trigger_skips_stopped_subscriber() {
        reset_registry();
        let obj = Object::new();
        let id = obj.id();

        let victim: Rc<RefCell<Option<EffectRunner<()>>>> = Rc::default();
        let victim_clone = victim.clone();
        let armed = Rc::new(Cell::new(false));
        let armed_clone = armed.clone();
        let _stopper = effect(move || {
            track(id, "k");
            if armed_clone.get() {
                if let Some(runner) = victim_clone.borrow().as_ref() {
                    runner.stop();
                }
            }
        });

        let victim_runs = Rc::new(Cell::new(0));
        let victim_runs_clone = victim_runs.clone();
        let runner = effect(move || {
            track(id, "k");
            victim_runs_clone.set(victim_runs_clone.get() + 1);
        });
        *victim.borrow_mut() = Some(runner);
        assert_eq!(subscriber_count(id, "k"), 2);

        armed.set(true);
        trigger(id, "k");

        // Stopped by the earlier subscriber within the same pass.
        assert_eq!(victim_runs.get(), 1);
        assert_eq!(subscriber_count(id, "k"), 1);
    }
}
