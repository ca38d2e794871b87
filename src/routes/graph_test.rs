use super::*;
use crate::graph::types::Easing;
use crate::state::test_helpers;
use uuid::Uuid;

async fn seeded_state() -> (AppState, Uuid, Uuid) {
    let state = test_helpers::test_app_state();
    let ada = test_helpers::seed_person(&state, "Ada", "Lovelace").await;
    let charles = test_helpers::seed_person(&state, "Charles", "Babbage").await;
    test_helpers::seed_relationship(&state, &[ada, charles], "colleague").await;
    (state, ada, charles)
}

/// Screen coordinates of a node under the session's current transform.
fn screen_position(session: &mut GraphSession, id: Uuid) -> (f64, f64) {
    let position = session
        .network_mut()
        .positions()
        .into_iter()
        .find(|p| p.id == id)
        .expect("node present");
    let t = session.network_mut().transform();
    (
        t.x + t.k * f64::from(position.x),
        t.y + t.k * f64::from(position.y),
    )
}

#[tokio::test]
async fn data_reflects_directory() {
    let (state, _, _) = seeded_state().await;
    let response = data(State(state)).await;
    assert_eq!(response.0.nodes.len(), 2);
    assert_eq!(response.0.edges.len(), 1);
}

#[tokio::test]
async fn layout_settles_and_answers_all_positions() {
    let (state, _, _) = seeded_state().await;
    let response = layout(State(state), Query(ViewportQuery { width: None, height: None })).await;
    assert!(response.0.iterations > 0);
    assert_eq!(response.0.positions.len(), 2);
}

#[tokio::test]
async fn mount_blocks_touch_scroll_and_starts_loading() {
    let (state, _, _) = seeded_state().await;
    let session = mount_session(&state, 800.0, 600.0).await;
    assert!(session.host().touch_scroll_blocked);
    assert!(session.is_loading());
    assert_eq!(overlay_msg(&session), ServerMsg::Overlay { overlay: OverlayMsg::Loading });
}

#[tokio::test]
async fn stabilization_sequence_fits_and_reveals_edges() {
    let (state, _, _) = seeded_state().await;
    let mut session = mount_session(&state, 800.0, 600.0).await;
    let out = stabilize_session(&mut session);

    assert!(matches!(out.first(), Some(ServerMsg::Stabilization { .. })));
    assert!(out.iter().any(|m| matches!(
        m,
        ServerMsg::Command { command: NetworkCommand::Fit { animation } }
            if animation.duration_ms == 1000 && animation.easing == Easing::EaseInOutQuad
    )));
    assert!(out.iter().any(|m| matches!(
        m,
        ServerMsg::Command { command: NetworkCommand::SetOptions { options } } if !options.edges_hidden
    )));

    let n = out.len();
    assert!(matches!(&out[n - 2], ServerMsg::Positions { positions } if positions.len() == 2));
    assert_eq!(out[n - 1], ServerMsg::Overlay { overlay: OverlayMsg::None });
    assert!(!session.is_loading());
}

#[tokio::test]
async fn click_on_node_focuses_and_shows_info() {
    let (state, ada, _) = seeded_state().await;
    let mut session = mount_session(&state, 800.0, 600.0).await;
    stabilize_session(&mut session);

    let (sx, sy) = screen_position(&mut session, ada);
    let out = apply_client_msg(&mut session, ClientMsg::Click { x: sx, y: sy });

    assert!(out.iter().any(|m| matches!(
        m,
        ServerMsg::Command { command: NetworkCommand::Focus { node, scale, animation } }
            if *node == ada && (*scale - 0.95).abs() < f64::EPSILON && animation.duration_ms == 500
    )));
    match out.last() {
        Some(ServerMsg::Overlay { overlay: OverlayMsg::Info { info } }) => {
            assert_eq!(info.name, "Ada Lovelace");
            assert_eq!(info.relations.len(), 1);
        }
        other => panic!("expected info overlay, got {other:?}"),
    }
}

#[tokio::test]
async fn click_on_empty_canvas_refits_and_clears_overlay() {
    let (state, ada, _) = seeded_state().await;
    let mut session = mount_session(&state, 800.0, 600.0).await;
    stabilize_session(&mut session);

    let (sx, sy) = screen_position(&mut session, ada);
    apply_client_msg(&mut session, ClientMsg::Click { x: sx, y: sy });

    let out = apply_client_msg(&mut session, ClientMsg::Click { x: -10_000.0, y: -10_000.0 });
    assert!(out.iter().any(|m| matches!(
        m,
        ServerMsg::Command { command: NetworkCommand::Fit { animation } } if animation.duration_ms == 500
    )));
    assert_eq!(out.last(), Some(&ServerMsg::Overlay { overlay: OverlayMsg::None }));
}

#[tokio::test]
async fn exit_closes_overlay_without_commands() {
    let (state, ada, _) = seeded_state().await;
    let mut session = mount_session(&state, 800.0, 600.0).await;
    stabilize_session(&mut session);

    let (sx, sy) = screen_position(&mut session, ada);
    apply_client_msg(&mut session, ClientMsg::Click { x: sx, y: sy });

    let out = apply_client_msg(&mut session, ClientMsg::Exit);
    assert_eq!(out, vec![ServerMsg::Overlay { overlay: OverlayMsg::None }]);
}

#[tokio::test]
async fn unmount_releases_touch_scroll_guard() {
    let (state, _, _) = seeded_state().await;
    let session = mount_session(&state, 800.0, 600.0).await;
    let host = session.unmount();
    assert!(!host.touch_scroll_blocked);
}

#[tokio::test]
async fn empty_directory_session_still_settles() {
    let state = test_helpers::test_app_state();
    let mut session = mount_session(&state, 800.0, 600.0).await;
    let out = stabilize_session(&mut session);
    assert!(!session.is_loading());
    assert_eq!(out.last(), Some(&ServerMsg::Overlay { overlay: OverlayMsg::None }));
}

#[test]
fn client_messages_parse_from_wire_form() {
    let click: ClientMsg = serde_json::from_str(r#"{"type":"click","x":10.5,"y":20.0}"#).unwrap();
    assert!(matches!(click, ClientMsg::Click { x, y } if (x - 10.5).abs() < f64::EPSILON && (y - 20.0).abs() < f64::EPSILON));

    let exit: ClientMsg = serde_json::from_str(r#"{"type":"exit"}"#).unwrap();
    assert!(matches!(exit, ClientMsg::Exit));
}
