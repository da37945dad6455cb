//! Reactivity - Dependency tracking over wrapped objects.
//!
//! The reactive layer has three parts:
//! - [`registry`] - (object, key) → subscriber sets, with [`track`] and [`trigger`]
//! - [`effect`] - re-runnable computations and the active-effect stack
//! - [`proxy`] - intercepting views over plain [`Object`](crate::Object)s
//!
//! # Flow
//!
//! ```text
//! effect(f) ──run──▶ f reads proxy.get("k") ──track──▶ registry[(obj, "k")] += effect
//! proxy.set("k", v) ──trigger──▶ registry[(obj, "k")] ──▶ scheduler() or effect.run()
//! ```
//!
//! Everything is single-threaded and synchronous: a write returns only after
//! every affected effect has re-run.

pub mod effect;
pub mod proxy;
pub mod registry;

pub use effect::{
    effect, effect_with, stop, untrack, EffectId, EffectOptions, EffectRunner, ReactiveEffect,
    Scheduler,
};
pub use proxy::{
    is_proxy, is_reactive, is_read_only, reactive, read_only, shallow_read_only, to_raw, Proxy,
    ReactiveFlag, Variant,
};
pub use registry::{reset_registry, subscriber_count, track, trigger};
