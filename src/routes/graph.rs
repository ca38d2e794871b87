//! Graph view surface: data, one-shot layout, and the WebSocket session.
//!
//! DESIGN
//! ======
//! The WebSocket session is the server-driven rendition of the view
//! component. Each connection mounts its own `NodeMapView` over a fresh
//! physics network, streams stabilization progress and viewport commands
//! to the client, and maps inbound click/exit messages onto the view
//! callbacks. Message handling is factored into plain functions over the
//! session so the protocol can be tested without a socket.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{Json, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::graph::info::PersonInfo;
use crate::graph::network::{ForceNetwork, NetworkCommand, NodePosition};
use crate::graph::types::{GraphData, NetworkOptions};
use crate::graph::view::{EventHost, NodeMapView, Overlay, ViewProps};
use crate::state::AppState;

const DEFAULT_VIEWPORT_WIDTH: f64 = 800.0;
const DEFAULT_VIEWPORT_HEIGHT: f64 = 600.0;

// =============================================================================
// DATA & LAYOUT
// =============================================================================

/// `GET /api/graph` — nodes and edges for the current directory.
pub async fn data(State(state): State<AppState>) -> Json<GraphData> {
    let directory = state.directory.read().await;
    Json(GraphData::from_directory(&directory))
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ViewportQuery {
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl ViewportQuery {
    fn size(self) -> (f64, f64) {
        (
            self.width.unwrap_or(DEFAULT_VIEWPORT_WIDTH),
            self.height.unwrap_or(DEFAULT_VIEWPORT_HEIGHT),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct LayoutResponse {
    pub iterations: u32,
    pub positions: Vec<NodePosition>,
}

/// `GET /api/graph/layout` — run stabilization to completion and answer the
/// settled node positions. One-shot alternative to the session for clients
/// that render statically.
pub async fn layout(State(state): State<AppState>, Query(viewport): Query<ViewportQuery>) -> Json<LayoutResponse> {
    let (width, height) = viewport.size();
    let graph_data = {
        let directory = state.directory.read().await;
        GraphData::from_directory(&directory)
    };

    let mut network = ForceNetwork::new(&graph_data, width, height, NetworkOptions::default());
    let iterations = network.stabilize(|_| {});
    debug!(iterations, nodes = graph_data.nodes.len(), "layout computed");

    Json(LayoutResponse { iterations, positions: network.positions() })
}

// =============================================================================
// SESSION PROTOCOL
// =============================================================================

/// Inbound client messages.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Pointer click at screen coordinates.
    Click { x: f64, y: f64 },
    /// Close the info overlay.
    Exit,
}

/// Overlay state pushed after every transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum OverlayMsg {
    Loading,
    Info { info: PersonInfo },
    None,
}

impl From<Overlay> for OverlayMsg {
    fn from(overlay: Overlay) -> Self {
        match overlay {
            Overlay::Loading => Self::Loading,
            Overlay::Info(info) => Self::Info { info },
            Overlay::None => Self::None,
        }
    }
}

/// Outbound server messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Sent once after mount, before stabilization begins.
    Mounted { nodes: usize, edges: usize },
    /// Stabilization progress report.
    Stabilization { iterations: u32 },
    /// Viewport command for the client renderer.
    Command { command: NetworkCommand },
    /// Node positions after stabilization settles.
    Positions { positions: Vec<NodePosition> },
    /// Current overlay selection.
    Overlay { overlay: OverlayMsg },
}

// =============================================================================
// SESSION
// =============================================================================

/// Host side of the touch-scroll guard. The guard is a client concern; the
/// session tracks whether it is currently registered so unmount can be
/// verified.
#[derive(Debug, Default)]
pub struct SessionHost {
    pub touch_scroll_blocked: bool,
}

impl EventHost for SessionHost {
    fn block_touch_scroll(&mut self) {
        self.touch_scroll_blocked = true;
    }

    fn unblock_touch_scroll(&mut self) {
        self.touch_scroll_blocked = false;
    }
}

pub type GraphSession = NodeMapView<ForceNetwork, SessionHost>;

/// Mount a fresh session over the current directory contents.
pub async fn mount_session(state: &AppState, width: f64, height: f64) -> GraphSession {
    let directory = state.directory.read().await;
    let graph_data = GraphData::from_directory(&directory);
    let props = ViewProps {
        data: graph_data.clone(),
        people: directory.people.values().cloned().collect(),
        relationships: directory.relationships.values().cloned().collect(),
        height,
    };
    let options = NetworkOptions::default();
    let network = ForceNetwork::new(&graph_data, width, height, options);
    NodeMapView::mount(network, SessionHost::default(), props, options)
}

fn overlay_msg(session: &GraphSession) -> ServerMsg {
    ServerMsg::Overlay { overlay: session.overlay().into() }
}

fn drain_commands(session: &mut GraphSession, out: &mut Vec<ServerMsg>) {
    for command in session.network_mut().take_commands() {
        out.push(ServerMsg::Command { command });
    }
}

/// Run stabilization, feeding each progress report through the view so the
/// one-time fit and edge reveal fire at the right moment. Answers the full
/// outbound message sequence: progress, commands, settled positions, and
/// the final overlay.
pub fn stabilize_session(session: &mut GraphSession) -> Vec<ServerMsg> {
    let mut reports = Vec::new();
    session.network_mut().stabilize(|iterations| reports.push(iterations));

    let mut out = Vec::new();
    for iterations in reports {
        out.push(ServerMsg::Stabilization { iterations });
        session.on_stabilization_progress(iterations);
        drain_commands(session, &mut out);
    }
    out.push(ServerMsg::Positions { positions: session.network_mut().positions() });
    out.push(overlay_msg(session));
    out
}

/// Apply one inbound message and answer the outbound messages it produced.
pub fn apply_client_msg(session: &mut GraphSession, msg: ClientMsg) -> Vec<ServerMsg> {
    let mut out = Vec::new();
    match msg {
        ClientMsg::Click { x, y } => {
            let hit = session.network_mut().node_at(x, y);
            session.on_click(hit);
            drain_commands(session, &mut out);
        }
        ClientMsg::Exit => session.exit(),
    }
    out.push(overlay_msg(session));
    out
}

// =============================================================================
// TRANSPORT
// =============================================================================

/// `GET /api/graph/ws` — upgrade and run a view session.
pub async fn handle_ws(
    State(state): State<AppState>,
    Query(viewport): Query<ViewportQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| run_session(socket, state, viewport))
}

async fn send(socket: &mut WebSocket, msg: &ServerMsg) -> Result<(), axum::Error> {
    let text = serde_json::to_string(msg).map_err(axum::Error::new)?;
    socket.send(Message::Text(text.into())).await
}

async fn send_all(socket: &mut WebSocket, msgs: Vec<ServerMsg>) -> Result<(), axum::Error> {
    for msg in &msgs {
        send(socket, msg).await?;
    }
    Ok(())
}

async fn run_session(mut socket: WebSocket, state: AppState, viewport: ViewportQuery) {
    let (width, height) = viewport.size();
    let mut session = mount_session(&state, width, height).await;
    let props = session.props();
    info!(
        nodes = props.data.nodes.len(),
        edges = props.data.edges.len(),
        "graph session mounted"
    );

    let mounted = ServerMsg::Mounted {
        nodes: session.props().data.nodes.len(),
        edges: session.props().data.edges.len(),
    };
    if send(&mut socket, &mounted).await.is_err() {
        session.unmount();
        return;
    }

    let startup = stabilize_session(&mut session);
    if send_all(&mut socket, startup).await.is_err() {
        session.unmount();
        return;
    }

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMsg>(&text) {
                Ok(client_msg) => {
                    let outbound = apply_client_msg(&mut session, client_msg);
                    if send_all(&mut socket, outbound).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "unparseable client message"),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    // Disconnect path and explicit close both land here; the guard must not
    // outlive the session.
    let host = session.unmount();
    debug!(touch_scroll_blocked = host.touch_scroll_blocked, "graph session unmounted");
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
