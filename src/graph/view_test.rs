use super::*;

// =============================================================================
// MOCKS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Call {
    Fit(Animation),
    Focus(Uuid, f64, Animation),
    SetOptions(NetworkOptions),
}

#[derive(Default)]
struct MockNetwork {
    calls: Vec<Call>,
}

impl Network for MockNetwork {
    fn fit(&mut self, animation: Animation) {
        self.calls.push(Call::Fit(animation));
    }

    fn focus(&mut self, node: Uuid, scale: f64, animation: Animation) {
        self.calls.push(Call::Focus(node, scale, animation));
    }

    fn set_options(&mut self, options: NetworkOptions) {
        self.calls.push(Call::SetOptions(options));
    }
}

#[derive(Default)]
struct MockHost {
    guards_added: usize,
    guards_removed: usize,
}

impl MockHost {
    fn active_guards(&self) -> usize {
        self.guards_added - self.guards_removed
    }
}

impl EventHost for MockHost {
    fn block_touch_scroll(&mut self) {
        self.guards_added += 1;
    }

    fn unblock_touch_scroll(&mut self) {
        self.guards_removed += 1;
    }
}

fn test_person(firstname: &str, lastname: &str) -> Person {
    Person {
        id: Uuid::new_v4(),
        firstname: firstname.into(),
        lastname: lastname.into(),
        added_by: None,
    }
}

fn mounted_view() -> NodeMapView<MockNetwork, MockHost> {
    NodeMapView::mount(
        MockNetwork::default(),
        MockHost::default(),
        ViewProps::default(),
        NetworkOptions::default(),
    )
}

fn mounted_view_with_person(person: Person) -> NodeMapView<MockNetwork, MockHost> {
    let props = ViewProps { people: vec![person], ..ViewProps::default() };
    NodeMapView::mount(
        MockNetwork::default(),
        MockHost::default(),
        props,
        NetworkOptions::default(),
    )
}

// =============================================================================
// LIFECYCLE
// =============================================================================

#[test]
fn mount_registers_touch_guard_and_starts_loading() {
    let view = mounted_view();
    assert!(view.is_loading());
    assert_eq!(view.overlay(), Overlay::Loading);
}

#[test]
fn unmount_removes_touch_guard() {
    let view = mounted_view();
    let host = view.unmount();
    assert_eq!(host.guards_added, 1);
    assert_eq!(host.guards_removed, 1);
    assert_eq!(host.active_guards(), 0, "no residual listener after unmount");
}

// =============================================================================
// STABILIZATION
// =============================================================================

#[test]
fn stabilization_below_threshold_keeps_loading() {
    let mut view = mounted_view();
    view.on_stabilization_progress(10);
    assert!(view.is_loading());
    assert!(view.network_mut().calls.is_empty());
}

#[test]
fn stabilization_past_threshold_fits_and_reveals_edges() {
    let mut view = mounted_view();
    view.on_stabilization_progress(11);

    assert!(!view.is_loading());
    assert_eq!(view.overlay(), Overlay::None);

    let calls = view.network_mut().calls.clone();
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[0], Call::Fit(anim) if anim.duration_ms == 1000));
    assert!(matches!(calls[1], Call::SetOptions(options) if !options.edges_hidden));
}

#[test]
fn stabilization_fit_happens_only_once() {
    let mut view = mounted_view();
    view.on_stabilization_progress(50);
    view.on_stabilization_progress(100);

    // The second progress event must not re-fit or re-apply options.
    assert_eq!(view.network_mut().calls.len(), 2);
}

// =============================================================================
// CLICKS & OVERLAY
// =============================================================================

#[test]
fn clicking_node_focuses_and_shows_info() {
    let person = test_person("Ada", "Lovelace");
    let id = person.id;
    let mut view = mounted_view_with_person(person);
    view.on_stabilization_progress(100);

    view.on_click(Some(id));
    assert_eq!(view.focused(), Some(id));

    let Overlay::Info(info) = view.overlay() else {
        panic!("expected info overlay, got {:?}", view.overlay());
    };
    assert_eq!(info.id, id);
    assert_eq!(info.name, "Ada Lovelace");

    let last = view.network_mut().calls.last().cloned().unwrap();
    assert!(matches!(last, Call::Focus(node, scale, anim)
        if node == id && (scale - 0.95).abs() < f64::EPSILON && anim.duration_ms == 500));
}

#[test]
fn clicking_empty_canvas_fits_and_clears_info() {
    let person = test_person("Ada", "Lovelace");
    let id = person.id;
    let mut view = mounted_view_with_person(person);
    view.on_stabilization_progress(100);
    view.on_click(Some(id));

    view.on_click(None);
    assert_eq!(view.overlay(), Overlay::None);

    let last = view.network_mut().calls.last().cloned().unwrap();
    assert!(matches!(last, Call::Fit(anim) if anim.duration_ms == 500));
}

#[test]
fn exit_closes_info_without_viewport_change() {
    let person = test_person("Ada", "Lovelace");
    let id = person.id;
    let mut view = mounted_view_with_person(person);
    view.on_stabilization_progress(100);
    view.on_click(Some(id));
    let calls_before = view.network_mut().calls.len();

    view.exit();
    assert_eq!(view.overlay(), Overlay::None);
    assert_eq!(view.network_mut().calls.len(), calls_before);
}

#[test]
fn overlay_is_loading_until_stabilized_even_after_click() {
    let person = test_person("Ada", "Lovelace");
    let id = person.id;
    let mut view = mounted_view_with_person(person);

    view.on_click(Some(id));
    assert_eq!(view.overlay(), Overlay::Loading);
}

#[test]
fn stale_focus_after_prop_update_resolves_to_nothing() {
    let person = test_person("Ada", "Lovelace");
    let id = person.id;
    let mut view = mounted_view_with_person(person);
    view.on_stabilization_progress(100);
    view.on_click(Some(id));
    assert!(matches!(view.overlay(), Overlay::Info(_)));

    // The focused person disappears from the collections.
    view.update_props(ViewProps::default());
    assert_eq!(view.overlay(), Overlay::None);
}
