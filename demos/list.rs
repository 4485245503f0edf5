//! Keyed list demo on the in-memory host.
//!
//! Mounts a page, then prepends items and bumps a counter through click
//! handlers, printing the host markup after every flush.
//!
//! ```text
//! RUST_LOG=spark_vdom=debug cargo run --example list
//! ```

use spark_vdom::host::{MemoryHost, NodeId};
use spark_vdom::pipeline::App;
use spark_vdom::reactive::{reactive, Reactive};
use spark_vdom::types::Handler;
use spark_vdom::vnode::{element, VNode};
use spark_vdom::Result;
use tracing_subscriber::EnvFilter;

struct Page {
    title: String,
    modified: bool,
    clicks: i64,
    items: Vec<(String, String)>,
    next_id: u32,
}

fn view(page: &Reactive<Page>) -> VNode {
    let (title, modified) = page.read_fields(&["title", "modified"], |p| (p.title.clone(), p.modified));
    let clicks = page.read("clicks", |p| p.clicks);
    let items = page.read("items", |p| p.items.clone());

    let counter = page.clone();
    let adder = page.clone();

    element("div")
        .attr("class", if modified { "container modified" } else { "container" })
        .child(element("h1").child(title))
        .child(
            element("button")
                .attr("id", "count")
                .attr("onClick", Handler::new(move || counter.write("clicks", |p| p.clicks += 1)))
                .child(format!("Clicked {clicks} times")),
        )
        .child(
            element("button")
                .attr("id", "add")
                .attr(
                    "onClick",
                    Handler::new(move || {
                        adder.write_fields(&["items", "next_id"], |p| {
                            let id = format!("item-{}", p.next_id);
                            p.next_id += 1;
                            p.items.insert(0, (id.clone(), format!("New {id}")));
                        })
                    }),
                )
                .child("Prepend"),
        )
        .child(
            element("ul").keyed().children(
                items
                    .into_iter()
                    .map(|(key, label)| element("li").key(key).child(label)),
            ),
        )
        .build()
}

fn click(app: &App<MemoryHost>, root: NodeId, id: &str) {
    let handler = app.with_host(|h| {
        h.find_by_attribute(root, "id", id)
            .and_then(|node| h.handler(node, "onClick"))
    });
    match handler {
        Some(handler) => handler.call(),
        None => tracing::warn!(id, "no clickable node"),
    }
}

fn print(app: &App<MemoryHost>, root: NodeId, label: &str) {
    let (markup, stats) = app.with_host(|h| (h.inner_markup(root), h.stats()));
    println!("── {label}");
    println!("{markup}");
    println!("   {stats:?}\n");
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let page = reactive(Page {
        title: "Hello Virtual DOM".into(),
        modified: false,
        clicks: 0,
        items: ["a", "b", "c"]
            .iter()
            .map(|k| (k.to_string(), format!("Item {}", k.to_uppercase())))
            .collect(),
        next_id: 0,
    });

    let mut host = MemoryHost::new();
    let root = host.create_root("app");

    let source = page.clone();
    let mut app = App::mount(host, root, move || view(&source))?;
    print(&app, root, "first paint");

    // several writes, one commit
    page.write_fields(&["title", "modified"], |p| {
        p.title = "Updated Virtual DOM".into();
        p.modified = true;
    });
    page.write("items", |p| {
        p.items.retain(|(key, _)| key != "b");
        p.items.insert(0, ("d".into(), "New Item D".into()));
        p.items.push(("e".into(), "New Item E".into()));
        if let Some(a) = p.items.iter_mut().find(|(key, _)| key == "a") {
            a.1 = "Updated Item A".into();
        }
    });
    app.run_until_idle()?.into_result()?;
    print(&app, root, "page update");

    click(&app, root, "count");
    click(&app, root, "count");
    click(&app, root, "add");
    app.run_until_idle()?.into_result()?;
    print(&app, root, "after clicks");

    app.unmount()?;
    print(&app, root, "unmounted");
    Ok(())
}
