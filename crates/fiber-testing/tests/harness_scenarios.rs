use std::cell::Cell;

use fiber_core::{
    create_element, use_state, Component, Element, Mutation, PropValue, Props, WorkStatus,
};
use fiber_testing::{run_test_harness, TestDeadline, TestHarness};

fn counter(props: &Props) -> Element {
    let step = match props.get("step") {
        Some(PropValue::Int(step)) => *step,
        _ => 1,
    };
    let (count, set_count) = use_state(0i64);
    create_element(
        "button",
        Props::new()
            .with("data-count", count)
            .on("onClick", move |_| set_count.update(move |c| c + step))
            .child(format!("Count: {count}")),
    )
}

const COUNTER: Component = Component::new("Counter", counter);

fn panel(_props: &Props) -> Element {
    create_element(
        "section",
        Props::new()
            .child(Element::component(COUNTER, Props::new()))
            .child(Element::component(COUNTER, Props::new().with("step", 10))),
    )
}

#[test]
fn sibling_components_keep_separate_state() {
    run_test_harness(|harness| {
        harness
            .set_content(Element::component(Component::new("Panel", panel), Props::new()))
            .expect("render");
        let buttons = harness.find_by_tag("button");
        assert_eq!(buttons.len(), 2);

        harness.click(buttons[1]).expect("click");
        harness.click(buttons[0]).expect("click");
        harness.click(buttons[1]).expect("click");

        assert_eq!(harness.host().text_content(buttons[0]), "Count: 1");
        assert_eq!(harness.host().text_content(buttons[1]), "Count: 20");
        assert_eq!(harness.host().attribute(buttons[1], "data-count"), Some("20"));
        assert_eq!(harness.find_by_tag("button"), buttons);
    });
}

#[test]
fn listener_is_swapped_not_duplicated() {
    let mut harness = TestHarness::new();
    harness
        .set_content(Element::component(COUNTER, Props::new()))
        .expect("render");
    let button = harness.single_by_tag("button");
    harness.take_mutations();

    harness.click(button).expect("click");
    let mutations = harness.take_mutations();
    let removed = mutations
        .iter()
        .position(|m| matches!(m, Mutation::RemoveListener { kind, .. } if kind == "click"));
    let added = mutations
        .iter()
        .position(|m| matches!(m, Mutation::AddListener { kind, .. } if kind == "click"));
    assert!(removed.expect("removed") < added.expect("added"));
    assert_eq!(harness.host().listener_count(button, "click"), 1);
}

#[test]
fn dropped_attributes_are_removed_from_the_host() {
    let mut harness = TestHarness::new();
    harness
        .set_content(create_element(
            "input",
            Props::new().with("value", "a").with("disabled", true),
        ))
        .expect("first");
    let input = harness.single_by_tag("input");
    harness.take_mutations();

    let stats = harness
        .set_content(create_element("input", Props::new().with("value", "b")))
        .expect("second")
        .expect("stats");
    assert_eq!(stats.updates, 1);
    assert_eq!(harness.host().attribute(input, "disabled"), None);
    assert_eq!(harness.host().attribute(input, "value"), Some("b"));
    assert_eq!(
        harness.take_mutations(),
        vec![
            Mutation::RemoveAttribute {
                node: input,
                name: "disabled".into()
            },
            Mutation::SetAttribute {
                node: input,
                name: "value".into(),
                value: "b".into()
            },
        ]
    );
}

#[test]
fn on_prefixed_plain_values_never_reach_the_host() {
    let mut harness = TestHarness::new();
    harness
        .set_content(create_element("a", Props::new().with("onClick", "alert()")))
        .expect("render");
    let link = harness.single_by_tag("a");
    assert_eq!(harness.host().attribute(link, "onClick"), None);
    assert_eq!(harness.host().listener_count(link, "click"), 0);
}

#[test]
fn every_slice_requests_another_idle_callback() {
    let mut harness = TestHarness::new();
    harness.render(create_element("p", Props::new().child("x")));
    harness.take_idle_requests();

    let deadline = TestDeadline::exhausted();
    let mut slices = 0;
    while harness.slice(&deadline).expect("slice") != WorkStatus::Idle {
        slices += 1;
    }
    assert_eq!(slices, 3);
    assert_eq!(harness.take_idle_requests(), 4);
    assert!(!harness.root().runtime().needs_work());
}

thread_local! {
    static RENDERS: Cell<usize> = const { Cell::new(0) };
}

fn leaf(_props: &Props) -> Element {
    RENDERS.with(|renders| renders.set(renders.get() + 1));
    create_element("i", Props::new())
}

#[test]
fn units_budget_maps_to_units_of_work() {
    let mut harness = TestHarness::new();
    harness.render(create_element(
        "div",
        Props::new().child(Element::component(Component::new("Leaf", leaf), Props::new())),
    ));
    // root, div, Leaf, i
    assert_eq!(harness.slice(&TestDeadline::units(2)).expect("slice"), WorkStatus::Yielded);
    assert_eq!(RENDERS.with(Cell::get), 0);
    assert_eq!(harness.slice(&TestDeadline::units(1)).expect("slice"), WorkStatus::Yielded);
    assert_eq!(RENDERS.with(Cell::get), 1);
    assert!(harness.text().is_empty());
    assert!(matches!(
        harness.slice(&TestDeadline::units(5)).expect("slice"),
        WorkStatus::Committed(stats) if stats.placements == 2
    ));
    assert_eq!(harness.find_by_tag("i").len(), 1);
}
