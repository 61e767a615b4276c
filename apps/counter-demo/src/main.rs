use std::error::Error;
use std::time::Duration;

use fiber_core::{
    create_element, use_state, Component, Element, FiberRoot, MemoryHost, NodeId, Props,
    WorkStatus,
};
use fiber_runtime_std::{StdRuntime, StdRuntimeConfig};

const SLICE_ENV: &str = "COUNTER_SLICE_MS";
const DEFAULT_CLICKS: usize = 3;

fn counter(_props: &Props) -> Element {
    let (count, set_count) = use_state(1);
    create_element(
        "h1",
        Props::new()
            .on("onClick", move |_| set_count.update(|c| c + 1))
            .child(format!("Count: {count}")),
    )
}

fn history(_props: &Props) -> Element {
    let (entries, set_entries) = use_state(Vec::<String>::new());
    create_element(
        "section",
        Props::new()
            .child(create_element(
                "button",
                Props::new()
                    .with("id", "log")
                    .on("onClick", move |event| {
                        let line = format!("{} on node {}", event.kind, event.target);
                        set_entries.update(move |entries| {
                            let mut next = entries.clone();
                            next.push(line.clone());
                            next
                        })
                    })
                    .child("log"),
            ))
            .child(create_element(
                "ul",
                Props::new().children_from(
                    entries
                        .iter()
                        .map(|entry| create_element("li", Props::new().child(entry.as_str()))),
                ),
            )),
    )
}

fn app() -> Element {
    create_element(
        "main",
        Props::new()
            .child(Element::component(Component::new("Counter", counter), Props::new()))
            .child(Element::component(Component::new("History", history), Props::new())),
    )
}

fn slice_budget() -> Result<Duration, Box<dyn Error>> {
    match std::env::var(SLICE_ENV) {
        Ok(raw) => {
            let millis: u64 = raw
                .parse()
                .map_err(|err| format!("{SLICE_ENV}={raw:?} is not a number of milliseconds: {err}"))?;
            Ok(Duration::from_millis(millis))
        }
        Err(std::env::VarError::NotPresent) => Ok(StdRuntimeConfig::DEFAULT_SLICE_BUDGET),
        Err(err) => Err(format!("{SLICE_ENV}: {err}").into()),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let clicks = match std::env::args().nth(1) {
        Some(raw) => raw.parse()?,
        None => DEFAULT_CLICKS,
    };
    let budget = slice_budget()?;
    log::info!("slice budget {budget:?}, {clicks} clicks");

    let runtime = StdRuntime::with_config(StdRuntimeConfig::default().with_slice_budget(budget));
    let (host, container) = MemoryHost::with_container("body")?;
    let mut root = runtime.mount(host, container);

    println!("=== Fiber-RS Counter Example ===");
    root.render(app());
    drive(&runtime, &mut root)?;
    print!("{}", root.host().dump_tree(container));

    let page = child_at(root.host(), container, 0)?;
    let h1 = child_at(root.host(), page, 0)?;
    let section = child_at(root.host(), page, 1)?;
    let log_button = child_at(root.host(), section, 0)?;

    for click in 1..=clicks {
        root.host().dispatch_event(h1, "click")?;
        root.host().dispatch_event(log_button, "click")?;
        drive(&runtime, &mut root)?;
        println!("\n--- after click {click} ---");
        print!("{}", root.host().dump_tree(container));
    }
    Ok(())
}

fn child_at(host: &MemoryHost, parent: NodeId, index: usize) -> Result<NodeId, Box<dyn Error>> {
    host.children(parent)
        .get(index)
        .copied()
        .ok_or_else(|| format!("node {parent} has no child at {index}").into())
}

/// Plays the part of the host event loop: every idle period runs one slice.
fn drive(runtime: &StdRuntime, root: &mut FiberRoot<MemoryHost>) -> Result<(), Box<dyn Error>> {
    let mut slices = 0usize;
    while root.has_pending_work() {
        match runtime.tick(root)? {
            Some(WorkStatus::Committed(stats)) => {
                slices += 1;
                log::info!("commit after {slices} slices: {stats:?}");
            }
            Some(_) => slices += 1,
            None => break,
        }
    }
    Ok(())
}
