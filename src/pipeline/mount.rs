//! Mount API - Application lifecycle.
//!
//! # Example
//!
//! ```
//! use spark_render::{create_app, define_component, MemoryHost, Renderer, Setup, VNode};
//!
//! let hello = define_component("Hello", |props| {
//!     Setup::new(props.clone(), |props| {
//!         let name = props.as_proxy().and_then(|p| p.get("name")).unwrap_or_default();
//!         VNode::element("h1").with_text(format!("hello {name}"))
//!     })
//! });
//!
//! let renderer = Renderer::new(MemoryHost::new());
//! let container = renderer.host().create_root();
//!
//! let handle = create_app(renderer.clone(), hello)
//!     .with_prop("name", "world")
//!     .mount(container)
//!     .unwrap();
//! assert_eq!(renderer.host().inner_html(container), "<h1>hello world</h1>");
//!
//! handle.unmount();
//! assert_eq!(renderer.host().inner_html(container), "");
//! ```

use std::rc::Rc;

use tracing::{error, info};

use crate::error::HostError;
use crate::renderer::{ComponentInstance, ComponentRef, Host, HostNode, Renderer};
use crate::types::Value;
use crate::vnode::{Props, VNode};

// =============================================================================
// App
// =============================================================================

/// Root component plus the props it is mounted with.
pub struct App<H> {
    renderer: Renderer<H>,
    root: ComponentRef,
    props: Props,
}

/// Prepare `root` for mounting through `renderer`.
pub fn create_app<H: Host + 'static>(renderer: Renderer<H>, root: ComponentRef) -> App<H> {
    App {
        renderer,
        root,
        props: Props::new(),
    }
}

impl<H: Host + 'static> App<H> {
    /// Prop passed to the root component's setup.
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Mount the root component into `container`.
    ///
    /// Runs setup and the first render synchronously. If the root itself
    /// fails to mount, whatever was created is torn down again.
    pub fn mount(self, container: HostNode) -> Result<MountHandle<H>, HostError> {
        let App {
            renderer,
            root,
            props,
        } = self;

        let name = root.name().to_string();
        let vnode = VNode::component(root).with_props(props);

        if let Err(err) = renderer.render(vnode, container) {
            error!(target: "spark_render::app", component = %name, %err, "mount failed");
            if let Err(cleanup) = renderer.unmount(container) {
                error!(target: "spark_render::app", component = %name, err = %cleanup, "cleanup after failed mount failed");
            }
            return Err(err);
        }

        info!(target: "spark_render::app", component = %name, %container, "mounted");
        Ok(MountHandle {
            renderer,
            container,
            mounted: true,
        })
    }
}

// =============================================================================
// Mount Handle
// =============================================================================

/// Handle returned by [`App::mount`].
///
/// Unmounting stops every render effect in the tree and removes the host
/// nodes from the container. Dropping the handle does the same.
pub struct MountHandle<H: Host + 'static> {
    renderer: Renderer<H>,
    container: HostNode,
    mounted: bool,
}

impl<H: Host + 'static> MountHandle<H> {
    pub fn container(&self) -> HostNode {
        self.container
    }

    pub fn renderer(&self) -> &Renderer<H> {
        &self.renderer
    }

    /// Instance of the root component.
    pub fn root_instance(&self) -> Option<Rc<ComponentInstance>> {
        self.renderer
            .root(self.container)
            .and_then(|vnode| vnode.component_instance())
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Stop render effects and clear the container.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;

        match self.renderer.unmount(self.container) {
            Ok(()) => info!(target: "spark_render::app", container = %self.container, "unmounted"),
            Err(err) => error!(target: "spark_render::app", %err, "unmount failed"),
        }
    }
}

impl<H: Host + 'static> Drop for MountHandle<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactivity::reactive;
    use crate::renderer::{define_component, MemoryHost, Setup};
    use crate::types::Object;

    fn counter(state: Value) -> ComponentRef {
        define_component("Counter", move |_props| {
            Setup::new(state.clone(), |ctx| {
                let count = ctx
                    .as_proxy()
                    .and_then(|p| p.get("count"))
                    .unwrap_or_default();
                VNode::element("span").with_text(count.to_string())
            })
        })
    }

    #[test]
    fn test_mount_and_update() {
        let state = reactive(Object::new().with("count", 0));
        let renderer = Renderer::new(MemoryHost::new());
        let container = renderer.host().create_root();

        let handle = create_app(renderer.clone(), counter(state.clone()))
            .mount(container)
            .unwrap();
        assert!(handle.is_mounted());
        assert_eq!(renderer.host().inner_html(container), "<span>0</span>");

        state.as_proxy().unwrap().set("count", 1).unwrap();
        assert_eq!(renderer.host().inner_html(container), "<span>1</span>");

        let instance = handle.root_instance().unwrap();
        assert_eq!(instance.name(), "Counter");
        assert!(instance.is_mounted());
    }

    #[test]
    fn test_unmount_stops_rendering() {
        let state = reactive(Object::new().with("count", 0));
        let renderer = Renderer::new(MemoryHost::new());
        let container = renderer.host().create_root();

        let handle = create_app(renderer.clone(), counter(state.clone()))
            .mount(container)
            .unwrap();
        let instance = handle.root_instance().unwrap();
        handle.unmount();

        assert!(!instance.is_active());
        assert_eq!(renderer.host().inner_html(container), "");

        renderer.host().clear_ops();
        state.as_proxy().unwrap().set("count", 5).unwrap();
        assert!(renderer.host().ops().is_empty());
    }

    #[test]
    fn test_drop_unmounts() {
        let renderer = Renderer::new(MemoryHost::new());
        let container = renderer.host().create_root();
        {
            let _handle = create_app(renderer.clone(), counter(reactive(Object::new())))
                .mount(container)
                .unwrap();
            assert_eq!(renderer.host().children(container).len(), 1);
        }
        assert!(renderer.host().children(container).is_empty());
    }

    #[test]
    fn test_failed_root_mount() {
        let renderer = Renderer::new(MemoryHost::new());
        renderer.host().fail_on_tag("span");
        let container = renderer.host().create_root();

        let result = create_app(renderer.clone(), counter(reactive(Object::new()))).mount(container);
        assert!(matches!(result, Err(HostError::Rejected(_))));
        assert!(renderer.root(container).is_none());
    }

    /// Accepts node creation but refuses every insert and remove.
    #[derive(Default)]
    struct SealedHost(MemoryHost);

    impl Host for SealedHost {
        fn create_node(&self, tag: &str) -> Result<HostNode, HostError> {
            self.0.create_node(tag)
        }

        fn patch_prop(
            &self,
            node: HostNode,
            key: &str,
            old: Option<&Value>,
            new: Option<&Value>,
        ) -> Result<(), HostError> {
            self.0.patch_prop(node, key, old, new)
        }

        fn insert(&self, _: HostNode, _: HostNode, _: Option<HostNode>) -> Result<(), HostError> {
            Err(HostError::Rejected("sealed container".into()))
        }

        fn remove(&self, _: HostNode) -> Result<(), HostError> {
            Err(HostError::Rejected("sealed remove".into()))
        }

        fn set_text(&self, node: HostNode, text: &str) -> Result<(), HostError> {
            self.0.set_text(node, text)
        }
    }

    #[test]
    fn test_failed_cleanup_keeps_mount_error() {
        let renderer = Renderer::new(SealedHost::default());
        let container = renderer.host().0.create_root();

        let result = create_app(renderer.clone(), counter(reactive(Object::new()))).mount(container);
        assert_eq!(
            result.err(),
            Some(HostError::Rejected("sealed container".into()))
        );
        assert!(renderer.root(container).is_none());
    }
}
