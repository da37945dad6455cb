//! Core types for spark-render.
//!
//! The reactive layer works over a small dynamic value model: plain
//! [`Object`]s holding ordered properties of type [`Value`]. Objects carry an
//! explicit [`ObjectId`] assigned at creation, which is what the subscription
//! registry keys on.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use crate::reactivity::Proxy;

// =============================================================================
// Object Identity
// =============================================================================

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity token of an [`Object`].
///
/// Every clone of an `Object` handle shares the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value of the token.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Object
// =============================================================================

struct ObjectInner {
    id: ObjectId,
    props: RefCell<IndexMap<String, Value>>,
}

/// Shared handle to a plain data object.
///
/// Reads and writes through this handle are *raw*: they never track or
/// trigger. Wrap it with [`reactive`](crate::reactive) or
/// [`read_only`](crate::read_only) to get an intercepting view.
#[derive(Clone)]
pub struct Object(Rc<ObjectInner>);

impl Object {
    /// Create an empty object with a fresh identity.
    pub fn new() -> Self {
        Self(Rc::new(ObjectInner {
            id: ObjectId::next(),
            props: RefCell::new(IndexMap::new()),
        }))
    }

    /// Builder-style insert.
    pub fn with(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_raw(key, value);
        self
    }

    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    /// Read a property without tracking.
    pub fn get_raw(&self, key: &str) -> Option<Value> {
        self.0.props.borrow().get(key).cloned()
    }

    /// Write a property without triggering. Returns the previous value.
    pub fn set_raw(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.props.borrow_mut().insert(key.into(), value.into())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.props.borrow().contains_key(key)
    }

    /// Property names in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.0.props.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.props.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.props.borrow().is_empty()
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Nested objects print by id only; cyclic graphs are legal.
        let props = self.0.props.borrow();
        let mut map = f.debug_map();
        for (key, value) in props.iter() {
            match value {
                Value::Object(obj) => map.entry(key, &format_args!("Object({})", obj.id())),
                other => map.entry(key, other),
            };
        }
        map.finish()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let object = Object::new();
        for (key, value) in iter {
            object.set_raw(key, value);
        }
        object
    }
}

// =============================================================================
// Value
// =============================================================================

/// A dynamically typed property value.
///
/// Equality is by value for primitives and by identity for objects and
/// wrappers, which is exactly what property diffing needs.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Object(Object),
    Proxy(Proxy),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for plain objects and wrapped objects alike.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Proxy(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_proxy(&self) -> Option<&Proxy> {
        match self {
            Value::Proxy(proxy) => Some(proxy),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Proxy(a), Value::Proxy(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Str(s) => f.write_str(s),
            Value::Object(obj) => write!(f, "[object {}]", obj.id()),
            Value::Proxy(proxy) => write!(f, "[proxy {}]", proxy.raw().id()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value.into())
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl From<Proxy> for Value {
    fn from(value: Proxy) -> Self {
        Value::Proxy(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_identity() {
        let a = Object::new();
        let b = Object::new();
        assert_ne!(a.id(), b.id());

        let a2 = a.clone();
        assert_eq!(a.id(), a2.id());
        assert_eq!(a, a2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_raw_access() {
        let obj = Object::new().with("count", 1).with("name", "spark");
        assert_eq!(obj.get_raw("count"), Some(Value::Int(1)));
        assert_eq!(obj.get_raw("name").as_ref().and_then(Value::as_str), Some("spark"));
        assert_eq!(obj.get_raw("missing"), None);

        let previous = obj.set_raw("count", 2);
        assert_eq!(previous, Some(Value::Int(1)));
        assert_eq!(obj.keys(), vec!["count".to_string(), "name".to_string()]);
    }

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::from(1), Value::Int(1));
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_eq!(Value::from("a"), Value::from(String::from("a")));

        let obj = Object::new();
        assert_eq!(Value::from(obj.clone()), Value::from(obj));
        assert_ne!(Value::from(Object::new()), Value::from(Object::new()));
    }

    #[test]
    fn test_from_iter() {
        let obj: Object = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj.get_raw("b"), Some(Value::Int(2)));
    }
}
