//! Patch - Mount, diff and unmount of single nodes.
//!
//! `patch(old, new)` is the one entry point. With no `old` it mounts, with
//! an `old` of the same type it updates in place, and with an `old` of a
//! different type it replaces. Array children go through the keyed diff in
//! `keyed.rs`.
//!
//! Host failures propagate with `?` up to the nearest children loop, which
//! logs them and carries on with the next sibling.

use std::rc::Rc;

use tracing::{error, trace};

use super::component::ComponentInstance;
use super::host::{Host, HostNode};
use super::Renderer;
use crate::error::HostError;
use crate::vnode::{is_same_type, Children, NodeKind, Props, VNode};

impl<H: Host + 'static> Renderer<H> {
    /// Bring the host subtree described by `old` in line with `new`.
    ///
    /// Host nodes mounted here go into `container` before `anchor`
    /// (appended when `anchor` is `None`). `parent` is the component whose
    /// render produced `new`, if any.
    pub fn patch(
        &self,
        old: Option<&VNode>,
        new: &VNode,
        container: HostNode,
        parent: Option<&Rc<ComponentInstance>>,
        anchor: Option<HostNode>,
    ) -> Result<(), HostError> {
        if let Some(prev) = old.filter(|prev| !is_same_type(prev, new)) {
            trace!(
                target: "spark_render::renderer",
                old = prev.kind().label(),
                new = new.kind().label(),
                "replace"
            );
            let anchor = self.first_host_node(prev).or(anchor);
            self.patch(None, new, container, parent, anchor)?;
            return self.unmount_node(prev, true);
        }

        match new.kind() {
            NodeKind::Text => self.process_text(old, new, container, anchor),
            NodeKind::Element(_) => self.process_element(old, new, container, parent, anchor),
            NodeKind::Fragment => self.process_fragment(old, new, container, parent, anchor),
            NodeKind::Component(_) => self.process_component(old, new, container, parent, anchor),
        }
    }

    // -------------------------------------------------------------------------
    // Text
    // -------------------------------------------------------------------------

    fn process_text(
        &self,
        old: Option<&VNode>,
        new: &VNode,
        container: HostNode,
        anchor: Option<HostNode>,
    ) -> Result<(), HostError> {
        let text = new.text_content().unwrap_or_default();

        if let Some(prev) = old {
            if prev.text_content() == new.text_content() && prev.el().is_some() {
                new.set_el(prev.el());
                return Ok(());
            }
        }

        let el = self.host().create_text(text)?;
        new.set_el(Some(el));

        // A changed text gets a fresh node in the old one's place.
        let prev_el = old.and_then(VNode::el);
        self.host().insert(el, container, prev_el.or(anchor))?;
        if let Some(prev_el) = prev_el {
            self.host().remove(prev_el)?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Elements
    // -------------------------------------------------------------------------

    fn process_element(
        &self,
        old: Option<&VNode>,
        new: &VNode,
        container: HostNode,
        parent: Option<&Rc<ComponentInstance>>,
        anchor: Option<HostNode>,
    ) -> Result<(), HostError> {
        match old.and_then(|prev| prev.el().map(|el| (prev, el))) {
            Some((prev, el)) => self.patch_element(prev, new, el, parent),
            None => self.mount_element(new, container, parent, anchor),
        }
    }

    fn mount_element(
        &self,
        vnode: &VNode,
        container: HostNode,
        parent: Option<&Rc<ComponentInstance>>,
        anchor: Option<HostNode>,
    ) -> Result<(), HostError> {
        let tag = vnode.tag().unwrap_or_default();
        let el = self.host().create_node(tag)?;
        vnode.set_el(Some(el));
        trace!(target: "spark_render::renderer", tag, %el, "mount element");

        match vnode.children() {
            Children::Text(text) => self.host().set_text(el, text)?,
            Children::Array(children) => self.mount_children(children, el, parent, None),
            Children::None => {}
        }

        for (key, value) in vnode.props() {
            self.host().patch_prop(el, key, None, Some(value))?;
        }

        self.host().insert(el, container, anchor)
    }

    fn patch_element(
        &self,
        old: &VNode,
        new: &VNode,
        el: HostNode,
        parent: Option<&Rc<ComponentInstance>>,
    ) -> Result<(), HostError> {
        new.set_el(Some(el));
        self.patch_children(old, new, el, parent)?;
        self.patch_props(el, old.props(), new.props())
    }

    /// Apply changed and added properties, then remove dropped ones.
    pub(super) fn patch_props(
        &self,
        el: HostNode,
        old_props: &Props,
        new_props: &Props,
    ) -> Result<(), HostError> {
        for (key, next) in new_props {
            let prev = old_props.get(key);
            if prev != Some(next) {
                self.host().patch_prop(el, key, prev, Some(next))?;
            }
        }

        for (key, prev) in old_props {
            if !new_props.contains_key(key) {
                self.host().patch_prop(el, key, Some(prev), None)?;
            }
        }
        Ok(())
    }

    fn patch_children(
        &self,
        old: &VNode,
        new: &VNode,
        el: HostNode,
        parent: Option<&Rc<ComponentInstance>>,
    ) -> Result<(), HostError> {
        match (old.children(), new.children()) {
            (Children::Array(c1), Children::Array(c2)) => {
                self.patch_keyed_children(c1, c2, el, parent, None);
            }
            (Children::Array(c1), Children::Text(text)) => {
                self.unmount_children(c1);
                self.host().set_text(el, text)?;
            }
            (Children::Array(c1), Children::None) => self.unmount_children(c1),
            (Children::Text(prev), Children::Text(next)) => {
                if prev != next {
                    self.host().set_text(el, next)?;
                }
            }
            (Children::Text(_), Children::Array(c2)) => {
                self.host().set_text(el, "")?;
                self.mount_children(c2, el, parent, None);
            }
            (Children::Text(_), Children::None) => self.host().set_text(el, "")?,
            (Children::None, Children::Text(text)) => self.host().set_text(el, text)?,
            (Children::None, Children::Array(c2)) => self.mount_children(c2, el, parent, None),
            (Children::None, Children::None) => {}
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Fragments
    // -------------------------------------------------------------------------

    fn process_fragment(
        &self,
        old: Option<&VNode>,
        new: &VNode,
        container: HostNode,
        parent: Option<&Rc<ComponentInstance>>,
        anchor: Option<HostNode>,
    ) -> Result<(), HostError> {
        let c2 = child_nodes(new);
        match old {
            None => self.mount_children(c2, container, parent, anchor),
            Some(prev) => self.patch_keyed_children(child_nodes(prev), c2, container, parent, anchor),
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Children loops
    // -------------------------------------------------------------------------

    pub(super) fn mount_children(
        &self,
        children: &[VNode],
        container: HostNode,
        parent: Option<&Rc<ComponentInstance>>,
        anchor: Option<HostNode>,
    ) {
        for child in children {
            let result = self.patch(None, child, container, parent, anchor);
            self.contain(result, child, "mount");
        }
    }

    fn unmount_children(&self, children: &[VNode]) {
        for child in children {
            let result = self.unmount_node(child, true);
            self.contain(result, child, "unmount");
        }
    }

    /// Log a failure of one sibling so the loop can go on with the next.
    pub(super) fn contain(&self, result: Result<(), HostError>, vnode: &VNode, step: &str) {
        if let Err(err) = result {
            error!(
                target: "spark_render::renderer",
                node = vnode.kind().label(),
                step,
                %err,
                "host operation failed"
            );
        }
    }

    // -------------------------------------------------------------------------
    // Unmount
    // -------------------------------------------------------------------------

    /// Tear down `vnode`.
    ///
    /// With `do_remove` unset only component effects are stopped; the
    /// caller is removing an ancestor host node that takes these along.
    pub(super) fn unmount_node(&self, vnode: &VNode, do_remove: bool) -> Result<(), HostError> {
        match vnode.kind() {
            NodeKind::Component(_) => {
                if let Some(instance) = vnode.component_instance() {
                    instance.stop();
                    if let Some(tree) = instance.sub_tree() {
                        self.unmount_node(&tree, do_remove)?;
                    }
                    if let Some(placeholder) = instance.take_placeholder().filter(|_| do_remove) {
                        self.host().remove(placeholder)?;
                    }
                }
                Ok(())
            }
            NodeKind::Fragment => {
                for child in child_nodes(vnode) {
                    let result = self.unmount_node(child, do_remove);
                    self.contain(result, child, "unmount");
                }
                Ok(())
            }
            NodeKind::Element(_) => {
                for child in child_nodes(vnode) {
                    let result = self.unmount_node(child, false);
                    self.contain(result, child, "unmount");
                }
                self.remove_el(vnode, do_remove)
            }
            NodeKind::Text => self.remove_el(vnode, do_remove),
        }
    }

    fn remove_el(&self, vnode: &VNode, do_remove: bool) -> Result<(), HostError> {
        match vnode.el() {
            Some(el) if do_remove => self.host().remove(el),
            _ => Ok(()),
        }
    }

    // -------------------------------------------------------------------------
    // Host node lookup / moves
    // -------------------------------------------------------------------------

    /// First host node `vnode` put into its container.
    pub(super) fn first_host_node(&self, vnode: &VNode) -> Option<HostNode> {
        match vnode.kind() {
            NodeKind::Element(_) | NodeKind::Text => vnode.el(),
            NodeKind::Fragment => child_nodes(vnode)
                .iter()
                .find_map(|child| self.first_host_node(child)),
            NodeKind::Component(_) => vnode
                .component_instance()
                .and_then(|instance| instance.sub_tree())
                .and_then(|tree| self.first_host_node(&tree))
                .or_else(|| vnode.component_instance().and_then(|i| i.placeholder()))
                .or_else(|| vnode.el()),
        }
    }

    /// Last host node `vnode` put into its container.
    pub(super) fn last_host_node(&self, vnode: &VNode) -> Option<HostNode> {
        match vnode.kind() {
            NodeKind::Element(_) | NodeKind::Text => vnode.el(),
            NodeKind::Fragment => child_nodes(vnode)
                .iter()
                .rev()
                .find_map(|child| self.last_host_node(child)),
            NodeKind::Component(_) => vnode
                .component_instance()
                .and_then(|instance| instance.sub_tree())
                .and_then(|tree| self.last_host_node(&tree))
                .or_else(|| vnode.component_instance().and_then(|i| i.placeholder()))
                .or_else(|| vnode.el()),
        }
    }

    /// First host node among `list[from..]`.
    pub(super) fn next_host_node(&self, list: &[VNode], from: usize) -> Option<HostNode> {
        list.get(from..)?
            .iter()
            .find_map(|vnode| self.first_host_node(vnode))
    }

    /// Re-insert every host node of `vnode` before `anchor`.
    pub(super) fn move_node(
        &self,
        vnode: &VNode,
        container: HostNode,
        anchor: Option<HostNode>,
    ) -> Result<(), HostError> {
        match vnode.kind() {
            NodeKind::Element(_) | NodeKind::Text => match vnode.el() {
                Some(el) => self.host().insert(el, container, anchor),
                None => Ok(()),
            },
            NodeKind::Fragment => {
                for child in child_nodes(vnode) {
                    self.move_node(child, container, anchor)?;
                }
                Ok(())
            }
            NodeKind::Component(_) => {
                let Some(instance) = vnode.component_instance() else {
                    return Ok(());
                };
                if let Some(tree) = instance.sub_tree() {
                    self.move_node(&tree, container, anchor)?;
                }
                match instance.placeholder() {
                    Some(placeholder) => self.host().insert(placeholder, container, anchor),
                    None => Ok(()),
                }
            }
        }
    }
}

fn child_nodes(vnode: &VNode) -> &[VNode] {
    match vnode.children() {
        Children::Array(children) => children,
        _ => &[],
    }
}
