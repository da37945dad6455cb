//! # spark-render
//!
//! Reactive rendering runtime: fine-grained dependency tracking plus a keyed
//! tree reconciler over a pluggable host.
//!
//! ## Architecture
//!
//! State lives in plain [`Object`]s. Wrapping one with [`reactive`] yields a
//! [`Proxy`] whose reads subscribe the running effect and whose writes re-run
//! every subscriber synchronously. Component renders are effects, so a write
//! to anything a render read re-renders that component and diffs the result
//! against its previous tree.
//!
//! ```text
//! write ─► trigger ─► render effect ─► VNode tree ─► patch ─► Host ops
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Values and plain objects
//! - [`reactivity`] - Proxies, the subscription registry, effects
//! - [`vnode`] - Tree node descriptions
//! - [`renderer`] - Host trait, reconciler, components
//! - [`pipeline`] - App mounting
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```
//! use spark_render::{define_component, Object, MemoryHost, Renderer, Setup, VNode, Value};
//!
//! let state = Object::new().with("count", 0).reactive();
//! let ctx = state.clone();
//! let counter = define_component("Counter", move |_props| {
//!     Setup::new(ctx.clone(), |ctx| {
//!         let count = ctx.as_proxy().and_then(|p| p.get("count")).unwrap_or_default();
//!         VNode::element("button").with_text(format!("clicked {count}"))
//!     })
//! });
//!
//! let renderer = Renderer::new(MemoryHost::new());
//! let root = renderer.host().create_root();
//! renderer.render(VNode::component(counter), root).unwrap();
//! assert_eq!(renderer.host().inner_html(root), "<button>clicked 0</button>");
//!
//! state
//!     .update("count", |n| Value::from(n.and_then(|v| v.as_int()).unwrap_or(0) + 1))
//!     .unwrap();
//! assert_eq!(renderer.host().inner_html(root), "<button>clicked 1</button>");
//! ```

pub mod error;
pub mod pipeline;
pub mod reactivity;
pub mod renderer;
pub mod types;
pub mod vnode;

pub use error::{HostError, ReactiveError};
pub use types::{Object, ObjectId, Value};

pub use reactivity::{
    effect, effect_with, is_proxy, is_reactive, is_read_only, reactive, read_only,
    shallow_read_only, stop, to_raw, untrack, EffectId, EffectOptions, EffectRunner, Proxy,
    ReactiveEffect, Variant,
};

pub use vnode::{h, is_same_type, Children, Key, NodeKind, Props, ShapeFlags, VNode};

pub use renderer::{
    define_component, Component, ComponentInstance, ComponentRef, Host, HostNode, HostOp,
    MemoryHost, Renderer, Setup,
};

pub use pipeline::{create_app, App, MountHandle};
