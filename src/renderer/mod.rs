//! Renderer - Reconciles tree nodes against a host.
//!
//! The reconciler is generic over a [`Host`]: the five primitive operations
//! (create, patch a property, insert, remove, set text) of whatever output
//! tree is being kept in sync.
//!
//! # Flow
//!
//! ```text
//! render(vnode) ─► patch(previous root, vnode)
//!                    ├─ text       create / replace host text node
//!                    ├─ element    mount, or diff props + children
//!                    │               └─ keyed array diff (prefix, suffix, LIS moves)
//!                    ├─ fragment   children straight into the container
//!                    └─ component  setup, then a render effect that re-patches
//!                                  its own subtree on reactive writes
//! ```
//!
//! ## Modules
//!
//! - `host` - The [`Host`] trait and [`HostNode`] handles
//! - `memory` - [`MemoryHost`], an arena host with an operation log
//! - `patch` - Mount, update and unmount of single nodes
//! - `keyed` - The keyed array diff
//! - `sequence` - Longest increasing subsequence for the move pass
//! - `component` - Component definitions, instances and render effects

mod component;
mod host;
mod keyed;
mod memory;
mod patch;
mod sequence;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::error::HostError;
use crate::vnode::VNode;

pub use component::{define_component, Component, ComponentInstance, ComponentRef, RenderFn, Setup};
pub use host::{Host, HostNode, TEXT_TAG};
pub use memory::{HostOp, MemoryHost};
pub use sequence::longest_increasing_subsequence;

struct RendererInner<H> {
    host: H,
    /// Last tree rendered into each container.
    roots: RefCell<HashMap<HostNode, Rc<VNode>>>,
}

/// Reconciler bound to one host.
///
/// Cloning shares the host and the retained roots.
pub struct Renderer<H> {
    inner: Rc<RendererInner<H>>,
}

impl<H> Clone for Renderer<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H: Host + 'static> Renderer<H> {
    pub fn new(host: H) -> Self {
        Self {
            inner: Rc::new(RendererInner {
                host,
                roots: RefCell::new(HashMap::new()),
            }),
        }
    }

    pub fn host(&self) -> &H {
        &self.inner.host
    }

    /// Render `vnode` into `container`, diffing against whatever was
    /// rendered there before.
    ///
    /// Failures below the root are logged and skipped; the error returned
    /// here is the root's own.
    pub fn render(&self, vnode: VNode, container: HostNode) -> Result<(), HostError> {
        let vnode = Rc::new(vnode);
        let prev = self.root(container);
        debug!(
            target: "spark_render::renderer",
            %container,
            root = vnode.kind().label(),
            update = prev.is_some(),
            "render"
        );

        let result = self.patch(prev.as_deref(), &vnode, container, None, None);
        self.inner.roots.borrow_mut().insert(container, vnode);
        result
    }

    /// Unmount whatever was rendered into `container`.
    pub fn unmount(&self, container: HostNode) -> Result<(), HostError> {
        let root = self.inner.roots.borrow_mut().remove(&container);
        match root {
            Some(root) => {
                debug!(target: "spark_render::renderer", %container, "unmount");
                self.unmount_node(&root, true)
            }
            None => Ok(()),
        }
    }

    /// Tree last rendered into `container`.
    pub fn root(&self, container: HostNode) -> Option<Rc<VNode>> {
        self.inner.roots.borrow().get(&container).cloned()
    }
}

// =============================================================================
// Tests
// =============================================================================
