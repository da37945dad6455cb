//! Counter demo - A component re-rendering on reactive writes.
//!
//! Run with: RUST_LOG=spark_render=debug cargo run --example counter

use spark_render::{create_app, define_component, MemoryHost, Object, Renderer, Setup, VNode, Value};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let state = Object::new().with("count", 0).with("step", 1).reactive();

    let ctx = state.clone();
    let counter = define_component("Counter", move |props| {
        let label = props
            .as_proxy()
            .and_then(|p| p.get("label"))
            .unwrap_or_else(|| Value::from("count"));
        Setup::new(ctx.clone(), move |ctx| {
            let count = ctx.as_proxy().and_then(|p| p.get("count")).unwrap_or_default();
            VNode::element("div").with_children([
                VNode::element("span").with_text(format!("{label}: {count}")),
                VNode::element("button").with_prop("type", "button").with_text("+"),
            ])
        })
    });

    let renderer = Renderer::new(MemoryHost::new());
    let container = renderer.host().create_root();
    let handle = match create_app(renderer.clone(), counter)
        .with_prop("label", "clicks")
        .mount(container)
    {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("mount failed: {err}");
            return;
        }
    };
    println!("{}", renderer.host().inner_html(container));

    for _ in 0..3 {
        renderer.host().clear_ops();
        let step = state.get("step").and_then(|v| v.as_int()).unwrap_or(1);
        let _ = state.update("count", |n| Value::from(n.and_then(|v| v.as_int()).unwrap_or(0) + step));
        println!("{}  ({} host ops)", renderer.host().inner_html(container), renderer.host().ops().len());
    }

    // not read by the render: no re-render
    let _ = state.set("step", 10);
    println!("after unobserved write: {} host ops", renderer.host().take_ops().len());

    handle.unmount();
    println!("unmounted: {:?}", renderer.host().inner_html(container));
}
