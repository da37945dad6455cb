//! Effects - Re-runnable computations with dependency subscriptions.
//!
//! An effect runs its closure once on creation and again every time a
//! tracked (object, key) pair is written, until it is stopped.
//!
//! # Active Effect Stack
//!
//! The "currently running" effect is the top of a thread-local stack. Every
//! run pushes a frame and pops it on exit, so a nested run (a parent render
//! mounting a child component) restores the outer effect when it returns.
//! Frames pushed by [`untrack`] or by runs of stopped effects collect nothing.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace};

use super::registry::Dep;
use crate::error::ReactiveError;

// =============================================================================
// Effect Identity
// =============================================================================

static NEXT_EFFECT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique id of an effect, used as its key in subscriber sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(u64);

impl EffectId {
    fn next() -> Self {
        Self(NEXT_EFFECT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect#{}", self.0)
    }
}

// =============================================================================
// Subscriber - type-erased view used by the registry
// =============================================================================

pub(crate) trait Subscriber {
    fn id(&self) -> EffectId;
    fn is_active(&self) -> bool;
    /// Remember a subscriber set this effect joined.
    fn add_dep(&self, dep: Dep);
    /// Called by `trigger`: run the scheduler if any, else run directly.
    fn notify(&self);
}

// =============================================================================
// Active Effect Stack
// =============================================================================

#[derive(Clone)]
enum Frame {
    Tracking(Rc<dyn Subscriber>),
    Untracked,
}

thread_local! {
    static EFFECT_STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// Pops its frame on drop, including during unwinding.
struct FrameGuard;

impl FrameGuard {
    fn push(frame: Frame) -> Self {
        EFFECT_STACK.with(|stack| stack.borrow_mut().push(frame));
        FrameGuard
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        let _ = EFFECT_STACK.try_with(|stack| stack.borrow_mut().pop());
    }
}

/// The effect collecting dependencies right now, if any.
pub(crate) fn active_subscriber() -> Option<Rc<dyn Subscriber>> {
    EFFECT_STACK.with(|stack| match stack.borrow().last() {
        Some(Frame::Tracking(subscriber)) => Some(subscriber.clone()),
        _ => None,
    })
}

/// Run `f` with dependency collection disabled.
///
/// Reads inside `f` subscribe nothing, even when called from inside an
/// effect.
pub fn untrack<T>(f: impl FnOnce() -> T) -> T {
    let _guard = FrameGuard::push(Frame::Untracked);
    f()
}

// =============================================================================
// Options
// =============================================================================

/// Custom execution strategy: called instead of re-running on trigger.
pub type Scheduler = Rc<dyn Fn()>;

/// Creation-time configuration for an effect.
///
/// Every field set here replaces the effect's built-in default.
#[derive(Default)]
pub struct EffectOptions {
    /// Called on trigger instead of running the effect.
    pub scheduler: Option<Scheduler>,
    /// Called once when the effect is stopped.
    pub on_stop: Option<Box<dyn FnOnce()>>,
    /// Label used in trace output.
    pub name: Option<String>,
}

impl EffectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduler(mut self, scheduler: impl Fn() + 'static) -> Self {
        self.scheduler = Some(Rc::new(scheduler));
        self
    }

    pub fn on_stop(mut self, on_stop: impl FnOnce() + 'static) -> Self {
        self.on_stop = Some(Box::new(on_stop));
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

// =============================================================================
// ReactiveEffect
// =============================================================================

/// A re-runnable computation.
///
/// Usually handled through an [`EffectRunner`]; created by [`effect`] or
/// [`effect_with`].
pub struct ReactiveEffect<T> {
    id: EffectId,
    name: Option<String>,
    this: Weak<ReactiveEffect<T>>,
    func: RefCell<Box<dyn FnMut() -> T>>,
    scheduler: Option<Scheduler>,
    active: Cell<bool>,
    deps: RefCell<Vec<Dep>>,
    on_stop: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl<T: 'static> ReactiveEffect<T> {
    /// Create an effect without running it.
    pub fn new(func: impl FnMut() -> T + 'static, options: EffectOptions) -> Rc<Self> {
        let EffectOptions {
            scheduler,
            on_stop,
            name,
        } = options;

        Rc::new_cyclic(|this| Self {
            id: EffectId::next(),
            name,
            this: this.clone(),
            func: RefCell::new(Box::new(func)),
            scheduler,
            active: Cell::new(true),
            deps: RefCell::new(Vec::new()),
            on_stop: RefCell::new(on_stop),
        })
    }

    pub fn id(&self) -> EffectId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Number of subscriber sets joined.
    pub fn dep_count(&self) -> usize {
        self.deps.borrow().len()
    }

    /// Execute the closure and return its result.
    ///
    /// While active, reads performed by the closure subscribe this effect.
    /// After [`stop`](Self::stop) the closure still runs, but collects
    /// nothing.
    pub fn run(&self) -> Result<T, ReactiveError> {
        let mut func = self
            .func
            .try_borrow_mut()
            .map_err(|_| ReactiveError::Reentrant { id: self.id })?;
        let func = &mut *func;

        let frame = match self.this.upgrade() {
            Some(this) if self.active.get() => Frame::Tracking(this),
            _ => Frame::Untracked,
        };

        trace!(
            target: "spark_render::effect",
            id = %self.id,
            name = self.name.as_deref().unwrap_or(""),
            active = self.active.get(),
            "run"
        );

        let _guard = FrameGuard::push(frame);
        Ok(func())
    }

    /// Unsubscribe from everything and deactivate. Idempotent.
    pub fn stop(&self) {
        if !self.active.get() {
            return;
        }

        let deps = std::mem::take(&mut *self.deps.borrow_mut());
        for dep in &deps {
            dep.remove(self.id);
        }

        let on_stop = self.on_stop.borrow_mut().take();
        if let Some(on_stop) = on_stop {
            on_stop();
        }

        self.active.set(false);
        debug!(target: "spark_render::effect", id = %self.id, "stopped");
    }

    /// Handle sharing this effect.
    pub fn runner(self: &Rc<Self>) -> EffectRunner<T> {
        EffectRunner {
            effect: self.clone(),
        }
    }
}

impl<T: 'static> Subscriber for ReactiveEffect<T> {
    fn id(&self) -> EffectId {
        self.id
    }

    fn is_active(&self) -> bool {
        self.active.get()
    }

    fn add_dep(&self, dep: Dep) {
        self.deps.borrow_mut().push(dep);
    }

    fn notify(&self) {
        if !self.active.get() {
            return;
        }

        if let Some(scheduler) = self.scheduler.clone() {
            scheduler();
            return;
        }

        if let Err(err) = self.run() {
            debug!(target: "spark_render::effect", id = %self.id, %err, "skipped trigger");
        }
    }
}

// =============================================================================
// Runner
// =============================================================================

/// Handle returned by [`effect`].
///
/// Cloning the handle shares the effect. Dropping every handle does not stop
/// an effect that has subscriptions; call [`stop`](Self::stop) for that.
pub struct EffectRunner<T> {
    effect: Rc<ReactiveEffect<T>>,
}

impl<T: 'static> EffectRunner<T> {
    /// Run the effect manually. See [`ReactiveEffect::run`].
    pub fn run(&self) -> Result<T, ReactiveError> {
        self.effect.run()
    }

    pub fn stop(&self) {
        self.effect.stop();
    }

    pub fn is_active(&self) -> bool {
        self.effect.is_active()
    }

    pub fn id(&self) -> EffectId {
        self.effect.id()
    }

    pub fn effect(&self) -> &Rc<ReactiveEffect<T>> {
        &self.effect
    }
}

impl<T> Clone for EffectRunner<T> {
    fn clone(&self) -> Self {
        Self {
            effect: self.effect.clone(),
        }
    }
}

impl<T> fmt::Debug for EffectRunner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectRunner")
            .field("id", &self.effect.id)
            .field("active", &self.effect.active.get())
            .finish()
    }
}

/// Create an effect and run it once immediately.
///
/// # Example
///
/// ```
/// use spark_render::{effect, Object};
///
/// let state = Object::new().with("count", 1).reactive();
/// let seen = std::rc::Rc::new(std::cell::Cell::new(0));
/// let seen_clone = seen.clone();
///
/// let _runner = effect(move || {
///     let count = state.get("count").and_then(|v| v.as_int()).unwrap_or(0);
///     seen_clone.set(count);
/// });
/// assert_eq!(seen.get(), 1);
/// ```
pub fn effect<T: 'static>(func: impl FnMut() -> T + 'static) -> EffectRunner<T> {
    effect_with(func, EffectOptions::default())
}

/// Create an effect with options and run it once immediately.
pub fn effect_with<T: 'static>(
    func: impl FnMut() -> T + 'static,
    options: EffectOptions,
) -> EffectRunner<T> {
    let effect = ReactiveEffect::new(func, options);
    // A fresh effect cannot be running yet.
    let _ = effect.run();
    EffectRunner { effect }
}

/// Stop the effect behind `runner`.
pub fn stop<T: 'static>(runner: &EffectRunner<T>) {
    runner.stop();
}

// =============================================================================
// Tests
// =============================================================================
