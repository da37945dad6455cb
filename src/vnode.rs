//! Tree Nodes - Versioned descriptions of renderable units.
//!
//! A [`VNode`] describes one element, text run, fragment or component for
//! one render. Render functions build a fresh tree every time; the
//! reconciler diffs it against the previous one and records the host node
//! each description produced.
//!
//! The classification bits ([`ShapeFlags`]) are derived from the node's
//! [`NodeKind`] and [`Children`] rather than stored, so they always agree
//! with the actual children value.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::renderer::{ComponentInstance, ComponentRef, HostNode};
use crate::types::Value;

// =============================================================================
// Shape Flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Node kind and children kind packed into one bitfield.
    ///
    /// Combine with bitwise OR: `ShapeFlags::ELEMENT | ShapeFlags::TEXT_CHILDREN`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShapeFlags: u8 {
        const ELEMENT = 1 << 0;
        const STATEFUL_COMPONENT = 1 << 2;
        const TEXT_CHILDREN = 1 << 3;
        const ARRAY_CHILDREN = 1 << 4;
    }
}

// =============================================================================
// Keys / Props
// =============================================================================

/// Identity key used to match children across renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i64),
    Str(Rc<str>),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{n}"),
            Key::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Int(value.into())
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Key::Int(value as i64)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.into())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value.into())
    }
}

/// Property map, applied to the host in insertion order.
pub type Props = IndexMap<String, Value>;

// =============================================================================
// Kind / Children
// =============================================================================

/// What a node describes.
#[derive(Clone)]
pub enum NodeKind {
    /// Host element with its tag name.
    Element(String),
    /// Text run; the text lives in [`Children::Text`].
    Text,
    /// Children mounted directly into the parent container.
    Fragment,
    /// Stateful component rendered through its definition.
    Component(ComponentRef),
}

impl NodeKind {
    /// Short label for logs.
    pub fn label(&self) -> &str {
        match self {
            NodeKind::Element(tag) => tag,
            NodeKind::Text => "#text",
            NodeKind::Fragment => "#fragment",
            NodeKind::Component(definition) => definition.name(),
        }
    }
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Element(tag) => f.debug_tuple("Element").field(tag).finish(),
            NodeKind::Text => f.write_str("Text"),
            NodeKind::Fragment => f.write_str("Fragment"),
            NodeKind::Component(definition) => {
                f.debug_tuple("Component").field(&definition.name()).finish()
            }
        }
    }
}

/// Children value of a node.
#[derive(Debug, Default)]
pub enum Children {
    #[default]
    None,
    Text(String),
    Array(Vec<VNode>),
}

impl From<&str> for Children {
    fn from(value: &str) -> Self {
        Children::Text(value.to_string())
    }
}

impl From<String> for Children {
    fn from(value: String) -> Self {
        Children::Text(value)
    }
}

impl From<Vec<VNode>> for Children {
    fn from(value: Vec<VNode>) -> Self {
        Children::Array(value)
    }
}

impl From<()> for Children {
    fn from(_: ()) -> Self {
        Children::None
    }
}

// =============================================================================
// VNode
// =============================================================================

/// Description of one renderable unit for one render.
pub struct VNode {
    kind: NodeKind,
    props: Props,
    children: Children,
    key: Option<Key>,

    /// Host node produced by this description, once mounted.
    el: Cell<Option<HostNode>>,
    /// Component instance, once a component node is mounted.
    component: RefCell<Option<Rc<ComponentInstance>>>,
}

impl VNode {
    fn new(kind: NodeKind, children: Children) -> Self {
        Self {
            kind,
            props: Props::new(),
            children,
            key: None,
            el: Cell::new(None),
            component: RefCell::new(None),
        }
    }

    /// Host element with the given tag.
    pub fn element(tag: impl Into<String>) -> Self {
        Self::new(NodeKind::Element(tag.into()), Children::None)
    }

    /// Text run.
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(NodeKind::Text, Children::Text(content.into()))
    }

    /// Fragment whose children mount straight into the parent container.
    pub fn fragment(children: impl IntoIterator<Item = VNode>) -> Self {
        Self::new(NodeKind::Fragment, Children::Array(children.into_iter().collect()))
    }

    /// Component node. Share one [`ComponentRef`] across renders so the
    /// reconciler sees the same type.
    pub fn component(definition: ComponentRef) -> Self {
        Self::new(NodeKind::Component(definition), Children::None)
    }

    // -------------------------------------------------------------------------
    // Builders
    // -------------------------------------------------------------------------

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    pub fn with_props<K, V>(mut self, props: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.props
            .extend(props.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Text children. On a fragment this becomes a single text child, since
    /// a fragment has no host node to hold text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children = match self.kind {
            NodeKind::Fragment => Children::Array(vec![VNode::text(text)]),
            _ => Children::Text(text.into()),
        };
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = VNode>) -> Self {
        self.children = Children::Array(children.into_iter().collect());
        self
    }

    /// Append one child, converting text or empty children to an array.
    pub fn with_child(mut self, child: VNode) -> Self {
        self.children = match std::mem::take(&mut self.children) {
            Children::Array(mut children) => {
                children.push(child);
                Children::Array(children)
            }
            Children::Text(text) => Children::Array(vec![VNode::text(text), child]),
            Children::None => Children::Array(vec![child]),
        };
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Tag name for elements.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    /// Text content for text nodes and text-children elements.
    pub fn text_content(&self) -> Option<&str> {
        match &self.children {
            Children::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Classification bits derived from kind and children.
    pub fn shape(&self) -> ShapeFlags {
        let mut shape = match self.kind {
            NodeKind::Element(_) => ShapeFlags::ELEMENT,
            NodeKind::Component(_) => ShapeFlags::STATEFUL_COMPONENT,
            NodeKind::Text | NodeKind::Fragment => ShapeFlags::empty(),
        };
        match self.children {
            Children::Text(_) => shape |= ShapeFlags::TEXT_CHILDREN,
            Children::Array(_) => shape |= ShapeFlags::ARRAY_CHILDREN,
            Children::None => {}
        }
        shape
    }

    /// Host node produced by this node, once mounted.
    ///
    /// For components this is the root host node of the first render.
    pub fn el(&self) -> Option<HostNode> {
        self.el.get()
    }

    pub(crate) fn set_el(&self, el: Option<HostNode>) {
        self.el.set(el);
    }

    /// Mounted component instance, for component nodes.
    pub fn component_instance(&self) -> Option<Rc<ComponentInstance>> {
        self.component.borrow().clone()
    }

    pub(crate) fn set_component_instance(&self, instance: Rc<ComponentInstance>) {
        *self.component.borrow_mut() = Some(instance);
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("VNode");
        s.field("kind", &self.kind);
        if let Some(key) = &self.key {
            s.field("key", key);
        }
        if !self.props.is_empty() {
            s.field("props", &self.props);
        }
        s.field("children", &self.children)
            .field("el", &self.el.get())
            .finish()
    }
}

/// Shorthand element constructor.
///
/// ```
/// use spark_render::h;
///
/// let node = h("ul", [("class", "list")], vec![h("li", [("id", "a")], "first")]);
/// assert_eq!(node.tag(), Some("ul"));
/// ```
pub fn h<K, V>(
    tag: &str,
    props: impl IntoIterator<Item = (K, V)>,
    children: impl Into<Children>,
) -> VNode
where
    K: Into<String>,
    V: Into<Value>,
{
    let mut node = VNode::element(tag).with_props(props);
    node.children = children.into();
    node
}

/// True if `a` and `b` can be patched into each other: same kind, same
/// type identifier and same key.
pub fn is_same_type(a: &VNode, b: &VNode) -> bool {
    let same_kind = match (&a.kind, &b.kind) {
        (NodeKind::Element(x), NodeKind::Element(y)) => x == y,
        (NodeKind::Text, NodeKind::Text) => true,
        (NodeKind::Fragment, NodeKind::Fragment) => true,
        (NodeKind::Component(x), NodeKind::Component(y)) => {
            std::ptr::addr_eq(Rc::as_ptr(x), Rc::as_ptr(y))
        }
        _ => false,
    };
    same_kind && a.key == b.key
}

// =============================================================================
// Tests
// =============================================================================
