//! In-memory host.
//!
//! Keeps a node arena plus a log of every [`HostOp`] it was asked to perform.
//! Used by the test suite to assert exact operation sequences and by the
//! demos as a stand-in rendering target.
//!
//! ```
//! use spark_render::{MemoryHost, Renderer, VNode};
//!
//! let renderer = Renderer::new(MemoryHost::new());
//! let root = renderer.host().create_root();
//!
//! renderer.render(VNode::element("p").with_text("hi"), root).unwrap();
//! assert_eq!(renderer.host().inner_html(root), "<p>hi</p>");
//! ```

use std::cell::RefCell;
use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::trace;

use super::host::{Host, HostNode, TEXT_TAG};
use crate::error::HostError;
use crate::types::Value;

/// One recorded host operation.
#[derive(Debug, Clone, PartialEq)]
pub enum HostOp {
    Create { node: HostNode, tag: String },
    SetProp { node: HostNode, key: String, value: Value },
    RemoveProp { node: HostNode, key: String },
    Insert { node: HostNode, parent: HostNode, anchor: Option<HostNode> },
    Remove { node: HostNode },
    SetText { node: HostNode, text: String },
}

#[derive(Debug, Default)]
struct NodeData {
    tag: String,
    props: IndexMap<String, Value>,
    text: String,
    children: Vec<HostNode>,
    parent: Option<HostNode>,
}

/// Arena-backed [`Host`] that records what it was asked to do.
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: RefCell<Vec<NodeData>>,
    ops: RefCell<Vec<HostOp>>,
    fail_tags: RefCell<HashSet<String>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a container node. Not recorded in the op log.
    pub fn create_root(&self) -> HostNode {
        self.alloc("#root")
    }

    /// Make [`create_node`](Host::create_node) fail for `tag`.
    pub fn fail_on_tag(&self, tag: impl Into<String>) {
        self.fail_tags.borrow_mut().insert(tag.into());
    }

    // -------------------------------------------------------------------------
    // Op log
    // -------------------------------------------------------------------------

    pub fn ops(&self) -> Vec<HostOp> {
        self.ops.borrow().clone()
    }

    /// Return and clear the op log.
    pub fn take_ops(&self) -> Vec<HostOp> {
        std::mem::take(&mut *self.ops.borrow_mut())
    }

    pub fn clear_ops(&self) {
        self.ops.borrow_mut().clear();
    }

    // -------------------------------------------------------------------------
    // Tree queries
    // -------------------------------------------------------------------------

    /// Number of nodes ever created, roots included.
    pub fn node_count(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn children(&self, node: HostNode) -> Vec<HostNode> {
        self.with_node(node, |data| data.children.clone())
            .unwrap_or_default()
    }

    pub fn parent(&self, node: HostNode) -> Option<HostNode> {
        self.with_node(node, |data| data.parent).flatten()
    }

    pub fn tag(&self, node: HostNode) -> Option<String> {
        self.with_node(node, |data| data.tag.clone())
    }

    pub fn text(&self, node: HostNode) -> Option<String> {
        self.with_node(node, |data| data.text.clone())
    }

    pub fn prop(&self, node: HostNode, key: &str) -> Option<Value> {
        self.with_node(node, |data| data.props.get(key).cloned())
            .flatten()
    }

    /// Markup-like rendering of `node` and its subtree.
    ///
    /// Elements print as `<tag k="v">text children</tag>`, text nodes print
    /// their text.
    pub fn serialize(&self, node: HostNode) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    /// Serialization of the children of `node` only.
    pub fn inner_html(&self, node: HostNode) -> String {
        let mut out = String::new();
        if let Some(text) = self.text(node) {
            out.push_str(&text);
        }
        for child in self.children(node) {
            self.write_node(child, &mut out);
        }
        out
    }

    fn write_node(&self, node: HostNode, out: &mut String) {
        let nodes = self.nodes.borrow();
        let Some(data) = nodes.get(node.0) else {
            return;
        };
        if data.tag == TEXT_TAG {
            out.push_str(&data.text);
            return;
        }

        out.push('<');
        out.push_str(&data.tag);
        for (key, value) in &data.props {
            out.push_str(&format!(" {key}=\"{value}\""));
        }
        out.push('>');
        out.push_str(&data.text);
        let children = data.children.clone();
        let tag = data.tag.clone();
        drop(nodes);

        for child in children {
            self.write_node(child, out);
        }
        out.push_str("</");
        out.push_str(&tag);
        out.push('>');
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn alloc(&self, tag: &str) -> HostNode {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(NodeData {
            tag: tag.to_string(),
            ..NodeData::default()
        });
        HostNode(nodes.len() - 1)
    }

    fn with_node<T>(&self, node: HostNode, f: impl FnOnce(&NodeData) -> T) -> Option<T> {
        self.nodes.borrow().get(node.0).map(f)
    }

    fn check(&self, node: HostNode) -> Result<(), HostError> {
        if node.0 < self.nodes.borrow().len() {
            Ok(())
        } else {
            Err(HostError::UnknownNode(node))
        }
    }

    fn record(&self, op: HostOp) {
        trace!(target: "spark_render::host", ?op);
        self.ops.borrow_mut().push(op);
    }

    fn detach(nodes: &mut [NodeData], node: HostNode) {
        if let Some(parent) = nodes[node.0].parent.take() {
            nodes[parent.0].children.retain(|&child| child != node);
        }
    }
}

impl Host for MemoryHost {
    fn create_node(&self, tag: &str) -> Result<HostNode, HostError> {
        if self.fail_tags.borrow().contains(tag) {
            return Err(HostError::Rejected(format!("cannot create <{tag}>")));
        }
        let node = self.alloc(tag);
        self.record(HostOp::Create {
            node,
            tag: tag.to_string(),
        });
        Ok(node)
    }

    fn patch_prop(
        &self,
        node: HostNode,
        key: &str,
        _old: Option<&Value>,
        new: Option<&Value>,
    ) -> Result<(), HostError> {
        self.check(node)?;
        let mut nodes = self.nodes.borrow_mut();
        match new {
            Some(value) if !value.is_null() => {
                nodes[node.0].props.insert(key.to_string(), value.clone());
                drop(nodes);
                self.record(HostOp::SetProp {
                    node,
                    key: key.to_string(),
                    value: value.clone(),
                });
            }
            _ => {
                nodes[node.0].props.shift_remove(key);
                drop(nodes);
                self.record(HostOp::RemoveProp {
                    node,
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }

    fn insert(
        &self,
        node: HostNode,
        parent: HostNode,
        anchor: Option<HostNode>,
    ) -> Result<(), HostError> {
        self.check(node)?;
        self.check(parent)?;
        if let Some(anchor) = anchor {
            self.check(anchor)?;
        }

        let mut nodes = self.nodes.borrow_mut();
        Self::detach(&mut nodes, node);

        let siblings = &nodes[parent.0].children;
        let index = match anchor {
            Some(anchor) => siblings
                .iter()
                .position(|&child| child == anchor)
                .ok_or(HostError::AnchorMismatch { anchor, parent })?,
            None => siblings.len(),
        };
        nodes[parent.0].children.insert(index, node);
        nodes[node.0].parent = Some(parent);
        drop(nodes);

        self.record(HostOp::Insert {
            node,
            parent,
            anchor,
        });
        Ok(())
    }

    fn remove(&self, node: HostNode) -> Result<(), HostError> {
        self.check(node)?;
        Self::detach(&mut self.nodes.borrow_mut(), node);
        self.record(HostOp::Remove { node });
        Ok(())
    }

    fn set_text(&self, node: HostNode, text: &str) -> Result<(), HostError> {
        self.check(node)?;
        {
            let mut nodes = self.nodes.borrow_mut();
            let children = std::mem::take(&mut nodes[node.0].children);
            for child in children {
                nodes[child.0].parent = None;
            }
            nodes[node.0].text = text.to_string();
        }
        self.record(HostOp::SetText {
            node,
            text: text.to_string(),
        });
        Ok(())
    }

    fn next_sibling(&self, node: HostNode) -> Option<HostNode> {
        let nodes = self.nodes.borrow();
        let parent = nodes.get(node.0)?.parent?;
        let siblings = &nodes[parent.0].children;
        let index = siblings.iter().position(|&child| child == node)?;
        siblings.get(index + 1).copied()
    }
}

// =============================================================================
// Tests
// =============================================================================
