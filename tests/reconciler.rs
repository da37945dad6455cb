//! Reconciler behavior against the in-memory host.
//!
//! Every test asserts on the exact host operations a render produced, so a
//! change in how many nodes get created, moved or removed shows up here.
//!
//! Run with: cargo test --test reconciler

use std::cell::Cell;
use std::rc::Rc;

use spark_render::{
    define_component, h, reactive, Children, HostNode, HostOp, MemoryHost, Object, Renderer, Setup, VNode,
    Value,
};

// =============================================================================
// Helpers
// =============================================================================

fn setup() -> (Renderer<MemoryHost>, HostNode) {
    let renderer = Renderer::new(MemoryHost::new());
    let root = renderer.host().create_root();
    (renderer, root)
}

fn item(key: i64) -> VNode {
    VNode::element("li").with_key(key).with_text(key.to_string())
}

fn list(keys: &[i64]) -> VNode {
    VNode::element("ul").with_children(keys.iter().map(|&k| item(k)))
}

fn root_el(renderer: &Renderer<MemoryHost>, root: HostNode) -> HostNode {
    renderer
        .root(root)
        .and_then(|vnode| vnode.el())
        .expect("root element mounted")
}

fn texts(renderer: &Renderer<MemoryHost>, parent: HostNode) -> Vec<String> {
    renderer
        .host()
        .children(parent)
        .into_iter()
        .map(|child| renderer.host().inner_html(child))
        .collect()
}

fn count_ops(ops: &[HostOp], pred: impl Fn(&HostOp) -> bool) -> usize {
    ops.iter().filter(|op| pred(op)).count()
}

// =============================================================================
// Keyed children
// =============================================================================

#[test]
fn test_append_is_one_insertion() {
    let (renderer, root) = setup();
    renderer.render(list(&[1, 2, 3]), root).unwrap();
    let ul = root_el(&renderer, root);
    let before = renderer.host().children(ul);
    renderer.host().clear_ops();

    renderer.render(list(&[1, 2, 3, 4]), root).unwrap();

    let ops = renderer.host().take_ops();
    let after = renderer.host().children(ul);
    assert_eq!(&after[..3], &before[..]);
    assert_eq!(
        ops,
        vec![
            HostOp::Create { node: after[3], tag: "li".into() },
            HostOp::SetText { node: after[3], text: "4".into() },
            HostOp::Insert { node: after[3], parent: ul, anchor: None },
        ]
    );
}

#[test]
fn test_middle_removal_is_one_removal() {
    let (renderer, root) = setup();
    renderer.render(list(&[1, 2, 3]), root).unwrap();
    let ul = root_el(&renderer, root);
    let before = renderer.host().children(ul);
    renderer.host().clear_ops();

    renderer.render(list(&[1, 3]), root).unwrap();

    assert_eq!(renderer.host().take_ops(), vec![HostOp::Remove { node: before[1] }]);
    assert_eq!(renderer.host().children(ul), vec![before[0], before[2]]);
}

#[test]
fn test_prepend_inserts_before_old_first() {
    let (renderer, root) = setup();
    renderer.render(list(&[1, 2]), root).unwrap();
    let ul = root_el(&renderer, root);
    let before = renderer.host().children(ul);
    renderer.host().clear_ops();

    renderer.render(list(&[0, 1, 2]), root).unwrap();

    let after = renderer.host().children(ul);
    assert_eq!(&after[1..], &before[..]);
    assert_eq!(
        renderer.host().take_ops(),
        vec![
            HostOp::Create { node: after[0], tag: "li".into() },
            HostOp::SetText { node: after[0], text: "0".into() },
            HostOp::Insert { node: after[0], parent: ul, anchor: Some(before[0]) },
        ]
    );
}

#[test]
fn test_reorder_moves_without_recreating() {
    let (renderer, root) = setup();
    renderer.render(list(&[1, 2, 3, 4, 5]), root).unwrap();
    let ul = root_el(&renderer, root);
    renderer.host().clear_ops();

    renderer.render(list(&[1, 4, 2, 3, 5]), root).unwrap();

    let ops = renderer.host().take_ops();
    assert_eq!(texts(&renderer, ul), vec!["1", "4", "2", "3", "5"]);
    assert_eq!(count_ops(&ops, |op| matches!(op, HostOp::Create { .. })), 0);
    assert_eq!(count_ops(&ops, |op| matches!(op, HostOp::Remove { .. })), 0);
    // 2 and 3 stay on the increasing run; only 4 moves
    assert_eq!(count_ops(&ops, |op| matches!(op, HostOp::Insert { .. })), 1);
}

#[test]
fn test_mixed_insert_remove_and_move() {
    let (renderer, root) = setup();
    renderer.render(list(&[1, 2, 3, 4, 5, 6]), root).unwrap();
    let ul = root_el(&renderer, root);
    let before = renderer.host().children(ul);

    renderer.render(list(&[1, 5, 3, 7, 2, 6]), root).unwrap();

    let after = renderer.host().children(ul);
    assert_eq!(texts(&renderer, ul), vec!["1", "5", "3", "7", "2", "6"]);
    assert_eq!(after[1], before[4]);
    assert_eq!(after[2], before[2]);
    assert_eq!(after[4], before[1]);
    assert!(!after.contains(&before[3]));
}

#[test]
fn test_unkeyed_children_patch_in_place() {
    let (renderer, root) = setup();
    let view = |labels: &[&str]| {
        VNode::element("div").with_children(labels.iter().map(|l| VNode::element("p").with_text(*l)))
    };
    renderer.render(view(&["a", "b"]), root).unwrap();
    let div = root_el(&renderer, root);
    let before = renderer.host().children(div);
    renderer.host().clear_ops();

    renderer.render(view(&["a", "c"]), root).unwrap();

    assert_eq!(
        renderer.host().take_ops(),
        vec![HostOp::SetText { node: before[1], text: "c".into() }]
    );
}

// =============================================================================
// Props
// =============================================================================

#[test]
fn test_props_diff() {
    let (renderer, root) = setup();
    renderer
        .render(h("div", [("a", 1), ("b", 2)], ()), root)
        .unwrap();
    let div = root_el(&renderer, root);
    renderer.host().clear_ops();

    renderer
        .render(h("div", [("a", 1), ("c", 3)], ()), root)
        .unwrap();

    assert_eq!(
        renderer.host().take_ops(),
        vec![
            HostOp::SetProp { node: div, key: "c".into(), value: Value::from(3) },
            HostOp::RemoveProp { node: div, key: "b".into() },
        ]
    );
    assert_eq!(renderer.host().prop(div, "a"), Some(Value::from(1)));
}

#[test]
fn test_prop_set_to_null_removes() {
    let (renderer, root) = setup();
    renderer.render(h("input", [("disabled", true)], ()), root).unwrap();
    let input = root_el(&renderer, root);

    renderer
        .render(VNode::element("input").with_prop("disabled", Value::Null), root)
        .unwrap();
    assert_eq!(renderer.host().prop(input, "disabled"), None);
}

// =============================================================================
// Children kind transitions
// =============================================================================

#[test]
fn test_array_to_text() {
    let (renderer, root) = setup();
    renderer.render(list(&[1, 2, 3]), root).unwrap();
    let ul = root_el(&renderer, root);
    let before = renderer.host().children(ul);
    renderer.host().clear_ops();

    renderer
        .render(VNode::element("ul").with_text("empty"), root)
        .unwrap();

    assert_eq!(
        renderer.host().take_ops(),
        vec![
            HostOp::Remove { node: before[0] },
            HostOp::Remove { node: before[1] },
            HostOp::Remove { node: before[2] },
            HostOp::SetText { node: ul, text: "empty".into() },
        ]
    );
    assert_eq!(renderer.host().inner_html(ul), "empty");
}

#[test]
fn test_text_to_array() {
    let (renderer, root) = setup();
    renderer
        .render(VNode::element("ul").with_text("loading"), root)
        .unwrap();
    let ul = root_el(&renderer, root);
    renderer.host().clear_ops();

    renderer.render(list(&[1, 2]), root).unwrap();

    let ops = renderer.host().take_ops();
    assert_eq!(ops[0], HostOp::SetText { node: ul, text: String::new() });
    assert_eq!(count_ops(&ops, |op| matches!(op, HostOp::Create { .. })), 2);
    assert_eq!(renderer.host().inner_html(ul), "<li>1</li><li>2</li>");
}

// =============================================================================
// Components
// =============================================================================

#[test]
fn test_component_update_diffs_subtree() {
    let (renderer, root) = setup();
    let state = reactive(Object::new().with("count", 0));
    let renders = Rc::new(Cell::new(0));

    let ctx = state.clone();
    let render_count = renders.clone();
    let counter = define_component("Counter", move |_props| {
        let render_count = render_count.clone();
        Setup::new(ctx.clone(), move |ctx| {
            render_count.set(render_count.get() + 1);
            let count = ctx.as_proxy().and_then(|p| p.get("count")).unwrap_or_default();
            VNode::element("div").with_children([
                VNode::element("span").with_text(count.to_string()),
                VNode::element("button").with_text("+"),
            ])
        })
    });

    renderer.render(VNode::component(counter), root).unwrap();
    let instance = renderer
        .root(root)
        .and_then(|vnode| vnode.component_instance())
        .unwrap();
    let div = renderer.host().children(root)[0];
    let span = renderer.host().children(div)[0];
    assert_eq!(renders.get(), 1);
    renderer.host().clear_ops();

    state.as_proxy().unwrap().set("count", 1).unwrap();

    assert_eq!(renders.get(), 2);
    assert_eq!(
        renderer.host().take_ops(),
        vec![HostOp::SetText { node: span, text: "1".into() }]
    );
    assert_eq!(renderer.host().children(root), vec![div]);
    assert!(instance.is_mounted());
}

#[test]
fn test_unobserved_write_does_not_render() {
    let (renderer, root) = setup();
    let state = reactive(Object::new().with("shown", 1).with("hidden", 2));
    let renders = Rc::new(Cell::new(0));

    let ctx = state.clone();
    let render_count = renders.clone();
    let view = define_component("View", move |_props| {
        let render_count = render_count.clone();
        Setup::new(ctx.clone(), move |ctx| {
            render_count.set(render_count.get() + 1);
            let shown = ctx.as_proxy().and_then(|p| p.get("shown")).unwrap_or_default();
            VNode::element("p").with_text(shown.to_string())
        })
    });
    renderer.render(VNode::component(view), root).unwrap();

    state.as_proxy().unwrap().set("hidden", 3).unwrap();
    assert_eq!(renders.get(), 1);
}

#[test]
fn test_fragment_root_component_keeps_siblings() {
    let (renderer, root) = setup();
    let items = reactive(Object::new().with("len", 1));

    let ctx = items.clone();
    let rows = define_component("Rows", move |_props| {
        Setup::new(ctx.clone(), |ctx| {
            let len = ctx
                .as_proxy()
                .and_then(|p| p.get("len"))
                .and_then(|v| v.as_int())
                .unwrap_or(0);
            VNode::fragment((0..len).map(item))
        })
    });

    renderer
        .render(
            VNode::element("ul").with_children([
                VNode::component(rows),
                VNode::element("footer").with_text("end"),
            ]),
            root,
        )
        .unwrap();
    let ul = root_el(&renderer, root);

    items.as_proxy().unwrap().set("len", 3).unwrap();
    assert_eq!(
        renderer.host().inner_html(ul),
        "<li>0</li><li>1</li><li>2</li><footer>end</footer>"
    );

    items.as_proxy().unwrap().set("len", 0).unwrap();
    assert_eq!(renderer.host().inner_html(ul), "<footer>end</footer>");
}

#[test]
fn test_empty_fragment_root_grows_in_place() {
    let (renderer, root) = setup();
    let items = reactive(Object::new().with("len", 0));

    let ctx = items.clone();
    let rows = define_component("Rows", move |_props| {
        Setup::new(ctx.clone(), |ctx| {
            let len = ctx
                .as_proxy()
                .and_then(|p| p.get("len"))
                .and_then(|v| v.as_int())
                .unwrap_or(0);
            VNode::fragment((0..len).map(item))
        })
    });

    renderer
        .render(
            VNode::element("ul").with_children([
                VNode::element("header").with_text("start"),
                VNode::component(rows),
                VNode::element("footer").with_text("end"),
            ]),
            root,
        )
        .unwrap();
    let ul = root_el(&renderer, root);
    // header, placeholder, footer
    assert_eq!(renderer.host().children(ul).len(), 3);

    items.as_proxy().unwrap().set("len", 2).unwrap();
    assert_eq!(
        renderer.host().inner_html(ul),
        "<header>start</header><li>0</li><li>1</li><footer>end</footer>"
    );
    assert_eq!(renderer.host().children(ul).len(), 4);

    items.as_proxy().unwrap().set("len", 0).unwrap();
    assert_eq!(
        renderer.host().inner_html(ul),
        "<header>start</header><footer>end</footer>"
    );

    items.as_proxy().unwrap().set("len", 3).unwrap();
    assert_eq!(
        renderer.host().inner_html(ul),
        "<header>start</header><li>0</li><li>1</li><li>2</li><footer>end</footer>"
    );
    assert_eq!(renderer.host().children(ul).len(), 5);

    // unmounting an empty instance takes its placeholder along
    items.as_proxy().unwrap().set("len", 0).unwrap();
    renderer
        .render(VNode::element("ul").with_text("gone"), root)
        .unwrap();
    assert!(renderer.host().children(ul).is_empty());
}

#[test]
fn test_parent_rerender_remounts_child() {
    let (renderer, root) = setup();
    let state = reactive(Object::new().with("title", "a"));
    let child = define_component("Child", |props| {
        Setup::new(props.clone(), |props| {
            let label = props.as_proxy().and_then(|p| p.get("label")).unwrap_or_default();
            VNode::element("em").with_text(label.to_string())
        })
    });

    let ctx = state.clone();
    let parent = define_component("Parent", move |_props| {
        let child = child.clone();
        Setup::new(ctx.clone(), move |ctx| {
            let title = ctx.as_proxy().and_then(|p| p.get("title")).unwrap_or_default();
            VNode::element("section").with_children([
                VNode::element("h1").with_text(title.to_string()),
                VNode::component(child.clone()).with_prop("label", title.clone()),
                VNode::element("hr"),
            ])
        })
    });

    renderer.render(VNode::component(parent), root).unwrap();
    let section = renderer.host().children(root)[0];
    let parent_instance = renderer.root(root).unwrap().component_instance().unwrap();
    let child_instance = |tree: Rc<VNode>| match tree.children() {
        Children::Array(children) => children[1].component_instance().unwrap(),
        _ => unreachable!(),
    };
    let first_child = child_instance(parent_instance.sub_tree().unwrap());
    assert_eq!(first_child.parent().map(|p| p.name().to_string()), Some("Parent".into()));

    state.as_proxy().unwrap().set("title", "b").unwrap();

    assert_eq!(
        renderer.host().inner_html(section),
        "<h1>b</h1><em>b</em><hr></hr>"
    );
    let second_child = child_instance(parent_instance.sub_tree().unwrap());
    assert!(!first_child.is_active());
    assert!(second_child.is_active());
}

#[test]
fn test_unmount_stops_component_effects() {
    let (renderer, root) = setup();
    let state = reactive(Object::new().with("n", 0));
    let ctx = state.clone();
    let view = define_component("View", move |_props| {
        Setup::new(ctx.clone(), |ctx| {
            let n = ctx.as_proxy().and_then(|p| p.get("n")).unwrap_or_default();
            VNode::element("b").with_text(n.to_string())
        })
    });

    renderer
        .render(VNode::element("div").with_child(VNode::component(view)), root)
        .unwrap();
    let instance = match renderer.root(root).unwrap().children() {
        Children::Array(children) => children[0].component_instance().unwrap(),
        _ => unreachable!(),
    };
    assert!(instance.is_active());

    renderer.render(VNode::element("div"), root).unwrap();
    assert!(!instance.is_active());

    renderer.host().clear_ops();
    state.as_proxy().unwrap().set("n", 1).unwrap();
    assert!(renderer.host().ops().is_empty());
}

// =============================================================================
// Failure containment
// =============================================================================

#[test]
fn test_failed_child_does_not_stop_siblings() {
    let (renderer, root) = setup();
    renderer.host().fail_on_tag("broken");

    let result = renderer.render(
        VNode::element("div").with_children([
            VNode::element("a"),
            VNode::element("broken"),
            VNode::element("c"),
        ]),
        root,
    );

    assert!(result.is_ok());
    let div = root_el(&renderer, root);
    assert_eq!(renderer.host().inner_html(div), "<a></a><c></c>");
}

#[test]
fn test_failed_root_is_reported() {
    let (renderer, root) = setup();
    renderer.host().fail_on_tag("broken");

    let result = renderer.render(VNode::element("broken"), root);
    assert!(matches!(result, Err(spark_render::HostError::Rejected(_))));
    assert!(renderer.host().children(root).is_empty());
}
