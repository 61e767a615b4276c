use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use fiber_core::{
    create_element, use_state, Component, Element, MemoryHost, Props, WorkLoopConfig, WorkStatus,
};
use fiber_runtime_std::{StdRuntime, StdRuntimeConfig};

fn counter(_props: &Props) -> Element {
    let (count, set_count) = use_state(0);
    create_element(
        "button",
        Props::new()
            .on("onClick", move |_| set_count.update(|c| c + 1))
            .child(count),
    )
}

#[test]
fn click_wakes_the_loop_and_commits() {
    let runtime = StdRuntime::new();
    let wakes = Rc::new(Cell::new(0));
    let seen = Rc::clone(&wakes);
    runtime.set_idle_waker(move || seen.set(seen.get() + 1));

    let (host, container) = MemoryHost::with_container("div").expect("container");
    let mut root = runtime.mount(host, container);
    root.render(Element::component(Component::new("Counter", counter), Props::new()));
    assert!(wakes.get() > 0);
    assert_eq!(runtime.run_until_idle(&mut root).expect("first"), 1);

    let button = root.host().children(container)[0];
    let before = wakes.get();
    root.host().dispatch_event(button, "click").expect("click");
    assert!(wakes.get() > before);

    assert_eq!(runtime.run_until_idle(&mut root).expect("second"), 1);
    assert_eq!(root.host().text_content(button), "1");
    assert_eq!(root.host().children(container), &[button]);
}

#[test]
fn tiny_budget_spreads_work_over_many_ticks() {
    let config = StdRuntimeConfig::default()
        .with_slice_budget(Duration::ZERO)
        .with_work_loop(WorkLoopConfig::default());
    let runtime = StdRuntime::with_config(config);
    let (host, container) = MemoryHost::with_container("div").expect("container");
    let mut root = runtime.mount(host, container);

    root.render(create_element(
        "ol",
        Props::new().children_from((0..4).map(|i| create_element("li", Props::new().child(i)))),
    ));

    let mut yielded = 0;
    loop {
        match runtime.tick(&mut root).expect("tick") {
            Some(WorkStatus::Yielded) => yielded += 1,
            Some(WorkStatus::Committed(_)) => break,
            other => panic!("unexpected tick result {other:?}"),
        }
    }
    // root, ol, then li and text for each item; the last unit commits.
    assert_eq!(yielded, 9);
    assert_eq!(root.host().text_content(container), "0123");
}
