//! Host adapter - The primitive operations the reconciler is generic over.

use std::fmt;

use crate::error::HostError;
use crate::types::Value;

/// Tag passed to [`Host::create_node`] by the default [`Host::create_text`].
pub const TEXT_TAG: &str = "#text";

/// Opaque handle to a node owned by a [`Host`].
///
/// Hosts hand these out from [`Host::create_node`] and map them to their
/// concrete nodes however they like (an index into an arena, a key into a
/// DOM node table, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostNode(pub usize);

impl fmt::Display for HostNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Rendering target.
///
/// Methods take `&self`: a render can re-enter the host (a component mounted
/// mid-patch runs its own render immediately), so implementations keep their
/// state behind interior mutability.
pub trait Host {
    /// Create a detached node for `tag`.
    fn create_node(&self, tag: &str) -> Result<HostNode, HostError>;

    /// Create a detached text node.
    fn create_text(&self, text: &str) -> Result<HostNode, HostError> {
        let node = self.create_node(TEXT_TAG)?;
        self.set_text(node, text)?;
        Ok(node)
    }

    /// Set, change or remove (`new` is `None` or `Null`) one property.
    fn patch_prop(
        &self,
        node: HostNode,
        key: &str,
        old: Option<&Value>,
        new: Option<&Value>,
    ) -> Result<(), HostError>;

    /// Insert `node` into `parent` before `anchor`, or at the end when
    /// `anchor` is `None`. An attached node is moved.
    fn insert(
        &self,
        node: HostNode,
        parent: HostNode,
        anchor: Option<HostNode>,
    ) -> Result<(), HostError>;

    /// Detach `node` from its parent. Detached nodes are left alone.
    fn remove(&self, node: HostNode) -> Result<(), HostError>;

    /// Replace the text content of `node` (and, for elements, all of its
    /// children).
    fn set_text(&self, node: HostNode, text: &str) -> Result<(), HostError>;

    /// Next sibling of `node`, if the host can tell.
    ///
    /// Used to find where a component's re-rendered root belongs. Hosts that
    /// cannot answer may keep the default; fragments rendered at a
    /// component's root then append at the end of the container.
    fn next_sibling(&self, node: HostNode) -> Option<HostNode> {
        let _ = node;
        None
    }
}
