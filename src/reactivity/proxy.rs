//! Proxies - Intercepting views over plain objects.
//!
//! A [`Proxy`] pairs an [`Object`] with a [`Variant`]:
//!
//! | variant             | `get` tracks | nested objects      | `set`               |
//! |---------------------|--------------|---------------------|---------------------|
//! | `Mutable`           | yes          | wrapped `Mutable`   | writes + triggers   |
//! | `ReadOnly`          | no           | wrapped `ReadOnly`  | discarded + warning |
//! | `ShallowReadOnly`   | no           | returned raw        | discarded + warning |
//!
//! Objects may hold proxies directly (`Object::with`, `set_raw`). A deep
//! read-only view hands those back read-only as well; a shallow one returns
//! them as stored, which is how component props pass reactive state down.
//!
//! Wrapping is idempotent and variant-stable: wrapping a proxy returns it
//! unchanged, whatever variant was asked for. A proxy is a cheap handle, so
//! two wrappers built for the same object and variant compare equal and
//! behave identically.

use std::fmt;

use tracing::warn;

use super::registry::{track, trigger};
use crate::error::ReactiveError;
use crate::types::{Object, Value};

// =============================================================================
// Variant / Flags
// =============================================================================

/// Interception behavior of a [`Proxy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Mutable,
    ReadOnly,
    ShallowReadOnly,
}

impl Variant {
    pub fn is_read_only(self) -> bool {
        !matches!(self, Variant::Mutable)
    }

    /// Variant used for object-valued properties read through this one.
    fn nested(self) -> Option<Variant> {
        match self {
            Variant::Mutable => Some(Variant::Mutable),
            Variant::ReadOnly => Some(Variant::ReadOnly),
            Variant::ShallowReadOnly => None,
        }
    }
}

/// Introspection markers answered by the wrapper itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactiveFlag {
    IsReactive,
    IsReadOnly,
}

// =============================================================================
// Proxy
// =============================================================================

/// Intercepting view over an [`Object`].
#[derive(Clone)]
pub struct Proxy {
    target: Object,
    variant: Variant,
}

impl Proxy {
    pub(crate) fn new(target: Object, variant: Variant) -> Self {
        Self { target, variant }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// The wrapped object.
    pub fn raw(&self) -> &Object {
        &self.target
    }

    /// Answer an introspection flag. Never forwarded, never tracked.
    pub fn flag(&self, flag: ReactiveFlag) -> bool {
        match flag {
            ReactiveFlag::IsReactive => self.variant == Variant::Mutable,
            ReactiveFlag::IsReadOnly => self.variant.is_read_only(),
        }
    }

    /// Read a property.
    ///
    /// Mutable proxies subscribe the running effect to `key`, even when the
    /// key is absent, so a later insertion triggers it.
    pub fn get(&self, key: &str) -> Option<Value> {
        let value = self.target.get_raw(key);
        if self.variant == Variant::Mutable {
            track(self.target.id(), key);
        }
        value.map(|value| self.wrap_nested(value))
    }

    /// True if the property exists. Tracks like [`get`](Self::get).
    pub fn has(&self, key: &str) -> bool {
        if self.variant == Variant::Mutable {
            track(self.target.id(), key);
        }
        self.target.contains_key(key)
    }

    /// Write a property.
    ///
    /// Mutable proxies store the value and then trigger `key`. Writes through
    /// read-only proxies leave the object untouched and return
    /// [`ReactiveError::ReadOnlyWrite`]; the error is advisory.
    ///
    /// Proxies are stored as the object they wrap.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<(), ReactiveError> {
        if self.variant.is_read_only() {
            warn!(
                target: "spark_render::reactivity",
                key,
                object = %self.target.id(),
                "write through read-only proxy discarded"
            );
            return Err(ReactiveError::ReadOnlyWrite {
                key: key.to_string(),
            });
        }

        self.target.set_raw(key, to_raw(&value.into()));
        trigger(self.target.id(), key);
        Ok(())
    }

    /// Read-modify-write without subscribing to `key`.
    pub fn update(
        &self,
        key: &str,
        f: impl FnOnce(Option<Value>) -> Value,
    ) -> Result<(), ReactiveError> {
        let current = self.target.get_raw(key);
        self.set(key, f(current))
    }

    fn wrap_nested(&self, value: Value) -> Value {
        match (value, self.variant.nested()) {
            (Value::Object(object), Some(variant)) => Value::Proxy(Proxy::new(object, variant)),
            // A stored mutable proxy must not leak write access out of a
            // deep read-only view.
            (Value::Proxy(proxy), Some(Variant::ReadOnly)) if !proxy.variant.is_read_only() => {
                Value::Proxy(Proxy::new(proxy.target, Variant::ReadOnly))
            }
            (value, _) => value,
        }
    }
}

impl PartialEq for Proxy {
    fn eq(&self, other: &Self) -> bool {
        self.variant == other.variant && self.target.ptr_eq(&other.target)
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("variant", &self.variant)
            .field("target", &self.target.id())
            .finish()
    }
}

impl Object {
    /// Mutable proxy over this object.
    pub fn reactive(&self) -> Proxy {
        Proxy::new(self.clone(), Variant::Mutable)
    }

    /// Deep read-only proxy over this object.
    pub fn read_only(&self) -> Proxy {
        Proxy::new(self.clone(), Variant::ReadOnly)
    }

    /// Read-only proxy whose nested objects are returned raw.
    pub fn shallow_read_only(&self) -> Proxy {
        Proxy::new(self.clone(), Variant::ShallowReadOnly)
    }
}

// =============================================================================
// Constructors
// =============================================================================

fn create_proxy(value: Value, variant: Variant) -> Value {
    match value {
        Value::Object(object) => Value::Proxy(Proxy::new(object, variant)),
        Value::Proxy(proxy) => Value::Proxy(proxy),
        other => {
            warn!(
                target: "spark_render::reactivity",
                value = %other,
                ?variant,
                "cannot wrap a non-object value, returned unchanged"
            );
            other
        }
    }
}

/// Wrap `value` in a mutable proxy.
///
/// Objects are wrapped, proxies are returned unchanged, anything else is
/// returned unchanged with a warning.
pub fn reactive(value: impl Into<Value>) -> Value {
    create_proxy(value.into(), Variant::Mutable)
}

/// Wrap `value` in a deep read-only proxy. Same rules as [`reactive`].
pub fn read_only(value: impl Into<Value>) -> Value {
    create_proxy(value.into(), Variant::ReadOnly)
}

/// Wrap `value` in a shallow read-only proxy. Same rules as [`reactive`].
pub fn shallow_read_only(value: impl Into<Value>) -> Value {
    create_proxy(value.into(), Variant::ShallowReadOnly)
}

pub fn is_reactive(value: &Value) -> bool {
    value
        .as_proxy()
        .is_some_and(|proxy| proxy.flag(ReactiveFlag::IsReactive))
}

pub fn is_read_only(value: &Value) -> bool {
    value
        .as_proxy()
        .is_some_and(|proxy| proxy.flag(ReactiveFlag::IsReadOnly))
}

pub fn is_proxy(value: &Value) -> bool {
    is_reactive(value) || is_read_only(value)
}

/// The plain object behind a proxy; other values are returned as-is.
pub fn to_raw(value: &Value) -> Value {
    match value {
        Value::Proxy(proxy) => Value::Object(proxy.raw().clone()),
        other => other.clone(),
    }
}

// =============================================================================
// Tests
// =============================================================================
