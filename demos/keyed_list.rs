//! Keyed list demo - Reordering children with minimal host operations.
//!
//! Run with: cargo run --example keyed_list

use spark_render::{HostOp, MemoryHost, Renderer, VNode};

fn view(keys: &[&str]) -> VNode {
    VNode::element("ul").with_children(
        keys.iter()
            .map(|&k| VNode::element("li").with_key(k).with_prop("id", k).with_text(k)),
    )
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let renderer = Renderer::new(MemoryHost::new());
    let root = renderer.host().create_root();

    let steps: [&[&str]; 5] = [
        &["a", "b", "c", "d", "e"],
        &["a", "b", "c", "d", "e", "f"],
        &["z", "a", "b", "c", "d", "e", "f"],
        &["z", "a", "d", "b", "c", "f", "e"],
        &["f", "e", "d"],
    ];

    for keys in steps {
        if let Err(err) = renderer.render(view(keys), root) {
            eprintln!("render failed: {err}");
            return;
        }

        let ops = renderer.host().take_ops();
        let count = |pred: fn(&HostOp) -> bool| ops.iter().filter(|op| pred(op)).count();
        println!(
            "{:<16} create={} insert={} remove={}",
            keys.join(","),
            count(|op| matches!(op, HostOp::Create { .. })),
            count(|op| matches!(op, HostOp::Insert { .. })),
            count(|op| matches!(op, HostOp::Remove { .. })),
        );
        println!("  {}", renderer.host().inner_html(root));
    }
}
