use std::time::Duration;

use oxide_hooks::element::fake::{FakeDataPoint, FakeElement, FakeSvg};
use oxide_hooks::{ViewId, SVG_VIEW_HOOK, VISIBILITY_CHANGE_EVENT};
use serde_json::{json, Value};

use super::{build_driver_with_bus, build_integration_test, MockBus};

const NAVIGATION: &str = "phx:page-loading-stop";

fn plot_id() -> ViewId {
    ViewId::new("plot")
}

fn data_point(foo: &str) -> FakeDataPoint {
    FakeDataPoint::new([("class", "data-point"), ("data-foo", foo)])
}

#[test]
fn given_no_svg_when_mounted_should_create_no_bindings_and_raise_no_error() {
    let mut test = build_integration_test();

    test.driver
        .mount(SVG_VIEW_HOOK, FakeElement::new("plot").boxed());

    assert!(test.driver.is_mounted(&plot_id()));
    assert_eq!(test.driver.subscription_count(&plot_id()), 0);
    assert!(!test.driver.is_observing_visibility(&plot_id()));
    assert!(test.bus.errors().is_empty());
}

#[test]
fn given_svg_when_mounted_should_bind_only_interactive_elements() {
    let mut test = build_integration_test();
    let first = data_point("a");
    let second = data_point("b");
    let axis = FakeDataPoint::new([("class", "axis"), ("data-foo", "c")]);
    let svg = FakeSvg::new(
        "<svg><g/></svg>",
        vec![first.clone(), second.clone(), axis.clone()],
    );

    test.driver
        .mount(SVG_VIEW_HOOK, FakeElement::new("plot").with_svg(svg).boxed());

    assert_eq!(first.listener_count(), 1);
    assert_eq!(second.listener_count(), 1);
    assert_eq!(axis.listener_count(), 0);
    assert!(test.driver.is_observing_visibility(&plot_id()));
    assert_eq!(test.driver.subscription_count(&plot_id()), 1);
}

#[test]
fn given_click_on_data_point_should_push_exactly_one_interaction_event() {
    let mut bus = MockBus::new();
    bus.expect_push_event()
        .withf(|event| {
            event.name() == "tucan-interaction"
                && event.payload() == json!({ "type": "data-point-click", "data": { "foo": "bar" } })
        })
        .times(1)
        .return_const(());
    bus.expect_report_error().never();
    let (mut driver, _, _) = build_driver_with_bus(Box::new(bus));
    let point = data_point("bar");
    let svg = FakeSvg::new("<svg/>", vec![point.clone()]);
    driver.mount(SVG_VIEW_HOOK, FakeElement::new("plot").with_svg(svg).boxed());

    point.click();
    driver.settle();
}

#[test]
fn given_repeated_content_updates_should_keep_a_single_listener_per_element() {
    let mut test = build_integration_test();
    let point = data_point("bar");
    let element =
        FakeElement::new("plot").with_svg(FakeSvg::new("<svg>a</svg>", vec![point.clone()]));
    test.driver.mount(SVG_VIEW_HOOK, element.boxed());

    element.set_svg(Some(FakeSvg::new("<svg>b</svg>", vec![point.clone()])));
    test.driver.update(&plot_id());
    element.set_svg(Some(FakeSvg::new("<svg>c</svg>", vec![point.clone()])));
    test.driver.update(&plot_id());

    assert_eq!(point.listener_count(), 1);

    point.click();
    test.driver.settle();

    assert_eq!(test.bus.events_named("tucan-interaction").len(), 1);
}

#[test]
fn given_changed_markup_on_update_should_move_listeners_to_new_content() {
    let mut test = build_integration_test();
    let old_point = data_point("old");
    let new_point = data_point("new");
    let element =
        FakeElement::new("plot").with_svg(FakeSvg::new("<svg>a</svg>", vec![old_point.clone()]));
    test.driver.mount(SVG_VIEW_HOOK, element.boxed());

    element.set_svg(Some(FakeSvg::new("<svg>b</svg>", vec![new_point.clone()])));
    test.driver.update(&plot_id());

    assert_eq!(old_point.listener_count(), 0);
    assert_eq!(new_point.listener_count(), 1);
}

#[test]
fn given_identical_markup_on_update_should_not_rebind() {
    let mut test = build_integration_test();
    let old_point = data_point("old");
    let new_point = data_point("new");
    let svg = FakeSvg::new("<svg>a</svg>", vec![old_point.clone()]);
    let element = FakeElement::new("plot").with_svg(svg.clone());
    test.driver.mount(SVG_VIEW_HOOK, element.boxed());

    element.set_svg(Some(svg.rerendered(vec![new_point.clone()])));
    test.driver.update(&plot_id());

    assert_eq!(old_point.listener_count(), 1);
    assert_eq!(new_point.listener_count(), 0);
}

#[test]
fn given_no_svg_at_mount_when_svg_appears_on_update_should_bind() {
    let mut test = build_integration_test();
    let point = data_point("late");
    let element = FakeElement::new("plot");
    test.driver.mount(SVG_VIEW_HOOK, element.boxed());

    element.set_svg(Some(FakeSvg::new("<svg/>", vec![point.clone()])));
    test.driver.update(&plot_id());

    assert_eq!(point.listener_count(), 1);
    assert!(test.driver.is_observing_visibility(&plot_id()));
}

#[test]
fn given_visibility_reports_should_push_one_event_per_threshold_crossing() {
    let mut test = build_integration_test();
    let svg = FakeSvg::new("<svg/>", vec![]);
    test.driver
        .mount(SVG_VIEW_HOOK, FakeElement::new("plot").with_svg(svg).boxed());

    for ratio in [0.0, 0.05, 0.1, 0.4, 0.9, 1.0] {
        test.driver.report_intersection(&plot_id(), ratio);
    }
    assert_eq!(test.bus.events_named(VISIBILITY_CHANGE_EVENT).len(), 1);

    test.driver.report_intersection(&plot_id(), 0.0);
    assert_eq!(test.bus.events_named(VISIBILITY_CHANGE_EVENT).len(), 1);

    test.driver.report_intersection(&plot_id(), 0.3);
    let events = test.bus.events_named(VISIBILITY_CHANGE_EVENT);
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].payload(), json!({ "id": "plot", "visible": true }));
}

#[test]
fn given_navigation_with_new_svg_node_in_viewport_should_rebind_after_settle_delay() {
    let mut test = build_integration_test();
    let old_point = data_point("old");
    let new_point = data_point("new");
    let svg = FakeSvg::new("<svg>a</svg>", vec![old_point.clone()]);
    let element = FakeElement::new("plot").with_svg(svg.clone());
    test.driver.mount(SVG_VIEW_HOOK, element.boxed());
    element.set_svg(Some(svg.rerendered(vec![new_point.clone()])));

    test.driver.dispatch_window_event(NAVIGATION, &Value::Null);
    test.driver.advance(Duration::from_millis(49));

    assert_eq!(new_point.listener_count(), 0);

    test.driver.advance(Duration::from_millis(1));

    assert_eq!(old_point.listener_count(), 0);
    assert_eq!(new_point.listener_count(), 1);
}

#[test]
fn given_navigation_while_out_of_viewport_should_not_rebind() {
    let mut test = build_integration_test();
    let new_point = data_point("new");
    let svg = FakeSvg::new("<svg>a</svg>", vec![data_point("old")]);
    let element = FakeElement::new("plot").with_svg(svg.clone());
    test.driver.mount(SVG_VIEW_HOOK, element.boxed());
    element.set_svg(Some(svg.rerendered(vec![new_point.clone()])));
    element.set_in_viewport(false);

    test.driver.dispatch_window_event(NAVIGATION, &Value::Null);
    test.driver.advance(Duration::from_millis(50));

    assert_eq!(new_point.listener_count(), 0);
}

#[test]
fn given_navigation_with_same_svg_node_should_keep_bindings() {
    let mut test = build_integration_test();
    let point = data_point("same");
    let element =
        FakeElement::new("plot").with_svg(FakeSvg::new("<svg/>", vec![point.clone()]));
    test.driver.mount(SVG_VIEW_HOOK, element.boxed());

    test.driver.dispatch_window_event(NAVIGATION, &Value::Null);
    test.driver.advance(Duration::from_millis(50));

    assert_eq!(point.listener_count(), 1);
}

#[test]
fn given_destroyed_view_should_release_listeners_observer_and_navigation_listener() {
    let mut test = build_integration_test();
    let point = data_point("bar");
    let element =
        FakeElement::new("plot").with_svg(FakeSvg::new("<svg/>", vec![point.clone()]));
    test.driver.mount(SVG_VIEW_HOOK, element.boxed());

    test.driver.destroy(&plot_id());
    point.click();
    test.driver.report_intersection(&plot_id(), 1.0);
    test.driver.dispatch_window_event(NAVIGATION, &Value::Null);
    test.driver.advance(Duration::from_millis(50));

    assert_eq!(point.listener_count(), 0);
    assert!(!test.driver.is_mounted(&plot_id()));
    assert_eq!(test.driver.retiring_count(), 0);
    assert!(test.bus.events().is_empty());
}

#[test]
fn given_destroy_while_navigation_settle_pending_should_not_rebind() {
    let mut test = build_integration_test();
    let new_point = data_point("new");
    let svg = FakeSvg::new("<svg>a</svg>", vec![data_point("old")]);
    let element = FakeElement::new("plot").with_svg(svg.clone());
    test.driver.mount(SVG_VIEW_HOOK, element.boxed());
    element.set_svg(Some(svg.rerendered(vec![new_point.clone()])));

    test.driver.dispatch_window_event(NAVIGATION, &Value::Null);
    test.driver.destroy(&plot_id());
    test.driver.advance(Duration::from_millis(50));

    assert_eq!(new_point.listener_count(), 0);
}
