//! Components - The glue boundary and the render effect.
//!
//! A component definition turns props into a [`Setup`]: a rendering
//! context plus a render function. Mounting wraps "render, then patch" in
//! one effect. The first run mounts the subtree; every later run is caused by
//! a reactive write observed during rendering and patches the new subtree
//! against the previous one.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, error};

use super::host::{Host, HostNode};
use super::Renderer;
use crate::error::HostError;
use crate::reactivity::{shallow_read_only, untrack, EffectOptions, EffectRunner, ReactiveEffect};
use crate::types::{Object, Value};
use crate::vnode::{NodeKind, VNode};

// =============================================================================
// Definition
// =============================================================================

/// Render function: builds a tree from the rendering context.
pub type RenderFn = Rc<dyn Fn(&Value) -> VNode>;

/// Shared component definition. Node type identity is pointer identity.
pub type ComponentRef = Rc<dyn Component>;

/// What a component definition yields for one instance.
pub struct Setup {
    /// Value passed to every call of `render`, usually a reactive proxy.
    pub context: Value,
    pub render: RenderFn,
}

impl Setup {
    pub fn new(context: impl Into<Value>, render: impl Fn(&Value) -> VNode + 'static) -> Self {
        Self {
            context: context.into(),
            render: Rc::new(render),
        }
    }
}

/// A component definition.
///
/// `props` is the node's property map wrapped in a shallow read-only proxy.
pub trait Component {
    fn name(&self) -> &str {
        "Anonymous"
    }

    fn setup(&self, props: &Value) -> Setup;
}

impl<F> Component for F
where
    F: Fn(&Value) -> Setup,
{
    fn setup(&self, props: &Value) -> Setup {
        self(props)
    }
}

struct NamedComponent<F> {
    name: String,
    setup: F,
}

impl<F> Component for NamedComponent<F>
where
    F: Fn(&Value) -> Setup,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&self, props: &Value) -> Setup {
        (self.setup)(props)
    }
}

/// Define a named component from a setup function.
///
/// ```
/// use spark_render::{define_component, Object, Setup, VNode};
///
/// let counter = define_component("Counter", |_props| {
///     let state = Object::new().with("count", 0).reactive();
///     Setup::new(state, |ctx| {
///         let count = ctx.as_proxy().and_then(|s| s.get("count")).unwrap_or_default();
///         VNode::element("span").with_text(count.to_string())
///     })
/// });
/// assert_eq!(counter.name(), "Counter");
/// ```
pub fn define_component(
    name: impl Into<String>,
    setup: impl Fn(&Value) -> Setup + 'static,
) -> ComponentRef {
    Rc::new(NamedComponent {
        name: name.into(),
        setup,
    })
}

// =============================================================================
// Instance
// =============================================================================

/// A mounted component.
pub struct ComponentInstance {
    name: String,
    props: Value,
    context: Value,
    render: RenderFn,
    parent: Option<Weak<ComponentInstance>>,
    is_mounted: Cell<bool>,
    sub_tree: RefCell<Option<Rc<VNode>>>,
    /// Empty text node holding the instance's position while its subtree
    /// renders no host nodes.
    placeholder: Cell<Option<HostNode>>,
    effect: RefCell<Option<EffectRunner<Result<(), HostError>>>>,
}

impl ComponentInstance {
    fn new(name: &str, props: Value, setup: Setup, parent: Option<&Rc<ComponentInstance>>) -> Self {
        Self {
            name: name.to_string(),
            props,
            context: setup.context,
            render: setup.render,
            parent: parent.map(Rc::downgrade),
            is_mounted: Cell::new(false),
            sub_tree: RefCell::new(None),
            placeholder: Cell::new(None),
            effect: RefCell::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shallow read-only view of the props the instance was created with.
    pub fn props(&self) -> &Value {
        &self.props
    }

    pub fn context(&self) -> &Value {
        &self.context
    }

    pub fn parent(&self) -> Option<Rc<ComponentInstance>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn is_mounted(&self) -> bool {
        self.is_mounted.get()
    }

    /// Tree produced by the most recent render.
    pub fn sub_tree(&self) -> Option<Rc<VNode>> {
        self.sub_tree.borrow().clone()
    }

    pub(crate) fn placeholder(&self) -> Option<HostNode> {
        self.placeholder.get()
    }

    pub(crate) fn take_placeholder(&self) -> Option<HostNode> {
        self.placeholder.take()
    }

    /// True while the render effect is live.
    pub fn is_active(&self) -> bool {
        self.effect
            .borrow()
            .as_ref()
            .is_some_and(EffectRunner::is_active)
    }

    /// Stop re-rendering on reactive writes.
    pub(crate) fn stop(&self) {
        let effect = self.effect.borrow().clone();
        if let Some(effect) = effect {
            effect.stop();
        }
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("name", &self.name)
            .field("is_mounted", &self.is_mounted.get())
            .finish()
    }
}

// =============================================================================
// Mounting
// =============================================================================

impl<H: Host + 'static> Renderer<H> {
    pub(super) fn process_component(
        &self,
        old: Option<&VNode>,
        new: &VNode,
        container: HostNode,
        parent: Option<&Rc<ComponentInstance>>,
        anchor: Option<HostNode>,
    ) -> Result<(), HostError> {
        match old {
            None => self.mount_component(new, container, parent, anchor),
            Some(prev) => {
                // Instances are not reused: mount a fresh one where the old
                // subtree sits, then tear the old one down.
                let anchor = self.first_host_node(prev).or(anchor);
                self.mount_component(new, container, parent, anchor)?;
                self.unmount_node(prev, true)
            }
        }
    }

    fn mount_component(
        &self,
        vnode: &VNode,
        container: HostNode,
        parent: Option<&Rc<ComponentInstance>>,
        anchor: Option<HostNode>,
    ) -> Result<(), HostError> {
        let NodeKind::Component(definition) = vnode.kind() else {
            return Ok(());
        };

        let props: Object = vnode
            .props()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let props = shallow_read_only(props);

        // Reads during setup belong to the instance, not to a parent render.
        let setup = untrack(|| definition.setup(&props));
        let instance = Rc::new(ComponentInstance::new(definition.name(), props, setup, parent));
        vnode.set_component_instance(instance.clone());

        debug!(target: "spark_render::renderer", component = instance.name(), "mount component");
        self.setup_render_effect(&instance, container, anchor)?;

        vnode.set_el(instance.sub_tree().and_then(|tree| self.first_host_node(&tree)));
        Ok(())
    }

    fn setup_render_effect(
        &self,
        instance: &Rc<ComponentInstance>,
        container: HostNode,
        anchor: Option<HostNode>,
    ) -> Result<(), HostError> {
        let inner = Rc::downgrade(&self.inner);
        let weak = Rc::downgrade(instance);

        let component_update = move || -> Result<(), HostError> {
            let (Some(instance), Some(inner)) = (weak.upgrade(), inner.upgrade()) else {
                return Ok(());
            };
            let renderer = Renderer { inner };

            if !instance.is_mounted.get() {
                let sub_tree = Rc::new((instance.render)(&instance.context));
                *instance.sub_tree.borrow_mut() = Some(sub_tree.clone());
                renderer.patch(None, &sub_tree, container, Some(&instance), anchor)?;
                renderer.sync_placeholder(&instance, &sub_tree, container, anchor)?;
                instance.is_mounted.set(true);
                return Ok(());
            }

            debug!(target: "spark_render::renderer", component = instance.name(), "update component");
            let sub_tree = Rc::new((instance.render)(&instance.context));
            let prev_tree = instance.sub_tree.replace(Some(sub_tree.clone()));

            // The mount-time anchor may be gone by now; an empty previous
            // tree left its placeholder, otherwise ask the host.
            let anchor = instance.placeholder().or_else(|| {
                prev_tree
                    .as_deref()
                    .and_then(|tree| renderer.last_host_node(tree))
                    .and_then(|node| renderer.host().next_sibling(node))
            });

            let result = renderer
                .patch(
                    prev_tree.as_deref(),
                    &sub_tree,
                    container,
                    Some(&instance),
                    anchor,
                )
                .and_then(|()| renderer.sync_placeholder(&instance, &sub_tree, container, anchor));
            if let Err(err) = &result {
                error!(
                    target: "spark_render::renderer",
                    component = instance.name(),
                    %err,
                    "component update aborted"
                );
            }
            result
        };

        let effect = ReactiveEffect::new(
            component_update,
            EffectOptions::new().name(format!("render:{}", instance.name())),
        );
        *instance.effect.borrow_mut() = Some(effect.runner());

        match effect.run() {
            Ok(result) => result,
            // A brand new effect cannot already be running.
            Err(err) => {
                debug!(target: "spark_render::renderer", %err, "initial render skipped");
                Ok(())
            }
        }
    }

    /// Keep a placeholder in the container exactly while `tree` has no host
    /// node of its own.
    ///
    /// `anchor` is where the subtree was asked to go; after the patch it is
    /// still the node following the instance's position.
    fn sync_placeholder(
        &self,
        instance: &ComponentInstance,
        tree: &VNode,
        container: HostNode,
        anchor: Option<HostNode>,
    ) -> Result<(), HostError> {
        let has_nodes = self.first_host_node(tree).is_some();
        match instance.placeholder() {
            Some(node) if has_nodes => {
                instance.placeholder.set(None);
                self.host().remove(node)
            }
            None if !has_nodes => {
                let node = self.host().create_text("")?;
                self.host().insert(node, container, anchor)?;
                instance.placeholder.set(Some(node));
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
