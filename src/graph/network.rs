//! Force-directed network behind a trait seam.
//!
//! DESIGN
//! ======
//! [`Network`] is the contract the view component programs against: viewport
//! commands plus option updates. [`ForceNetwork`] implements it over the
//! `force_graph` physics crate and additionally owns stabilization and hit
//! testing. Commands are recorded rather than rendered; the transport layer
//! drains them and forwards to the client, so handlers never write to the
//! socket themselves.

use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use serde::Serialize;
use uuid::Uuid;

use super::types::{Animation, GraphData, NetworkOptions};

pub const NODE_RADIUS: f64 = 5.0;
pub const HIT_RADIUS: f64 = 12.0;

/// Simulation timestep per stabilization iteration.
const STEP_DT: f32 = 0.016;
/// Report stabilization progress every this many iterations.
const PROGRESS_STRIDE: u32 = 25;
/// Mean per-node displacement below which the layout counts as settled.
const SETTLE_EPSILON: f32 = 0.05;

// =============================================================================
// TRAIT
// =============================================================================

/// The black-box visualization contract the view drives.
pub trait Network {
    /// Animated fit-to-view of the whole graph.
    fn fit(&mut self, animation: Animation);
    /// Animated focus onto one node.
    fn focus(&mut self, node: Uuid, scale: f64, animation: Animation);
    /// Replace the layout configuration.
    fn set_options(&mut self, options: NetworkOptions);
}

/// Viewport command recorded by [`ForceNetwork`] for the transport layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum NetworkCommand {
    Fit { animation: Animation },
    Focus { node: Uuid, scale: f64, animation: Animation },
    SetOptions { options: NetworkOptions },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodePosition {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
}

/// Screen-space viewport: translation plus zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewTransform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

// =============================================================================
// FORCE NETWORK
// =============================================================================

struct NodeMeta {
    id: Uuid,
}

/// Physics-backed network over the `force_graph` crate.
pub struct ForceNetwork {
    graph: ForceGraph<NodeMeta, ()>,
    id_to_idx: HashMap<Uuid, DefaultNodeIdx>,
    options: NetworkOptions,
    transform: ViewTransform,
    width: f64,
    height: f64,
    commands: Vec<NetworkCommand>,
}

impl ForceNetwork {
    /// Build the simulation from graph data, seeding nodes on a circle
    /// around the viewport center.
    #[must_use]
    pub fn new(data: &GraphData, width: f64, height: f64, options: NetworkOptions) -> Self {
        let mut graph = ForceGraph::new(SimulationParameters {
            force_charge: options.force_charge,
            force_spring: options.force_spring,
            force_max: options.force_max,
            node_speed: options.node_speed,
            damping_factor: options.damping_factor,
        });

        let mut id_to_idx = HashMap::new();
        let count = data.nodes.len().max(1);
        for (i, node) in data.nodes.iter().enumerate() {
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            let angle = (i as f64) * 2.0 * PI / count as f64;
            #[allow(clippy::cast_possible_truncation)]
            let (x, y) = (
                (width / 2.0 + 100.0 * angle.cos()) as f32,
                (height / 2.0 + 100.0 * angle.sin()) as f32,
            );
            let idx = graph.add_node(NodeData {
                x,
                y,
                mass: 10.0,
                is_anchor: false,
                user_data: NodeMeta { id: node.id },
            });
            id_to_idx.insert(node.id, idx);
        }

        for edge in &data.edges {
            if let (Some(&from), Some(&to)) = (id_to_idx.get(&edge.from), id_to_idx.get(&edge.to)) {
                graph.add_edge(from, to, EdgeData::default());
            }
        }

        Self {
            graph,
            id_to_idx,
            options,
            transform: ViewTransform { x: width / 2.0, y: height / 2.0, k: 1.0 },
            width,
            height,
            commands: Vec::new(),
        }
    }

    /// Run the physics simulation until settled, up to the configured
    /// iteration cap. `on_progress` is invoked every [`PROGRESS_STRIDE`]
    /// iterations and once at the end, with the iteration count so far.
    /// Returns the number of iterations performed.
    pub fn stabilize(&mut self, mut on_progress: impl FnMut(u32)) -> u32 {
        let mut iterations = 0;
        while iterations < self.options.stabilization_iterations {
            let before = self.raw_positions();
            self.graph.update(STEP_DT);
            iterations += 1;

            if iterations % PROGRESS_STRIDE == 0 {
                on_progress(iterations);
            }
            // Settle check only after the first full stride, so downstream
            // stabilization thresholds always see real progress.
            if iterations >= PROGRESS_STRIDE && mean_displacement(&before, &self.raw_positions()) < SETTLE_EPSILON {
                break;
            }
        }
        if iterations % PROGRESS_STRIDE != 0 {
            on_progress(iterations);
        }
        iterations
    }

    /// Current node positions in graph space.
    #[must_use]
    pub fn positions(&self) -> Vec<NodePosition> {
        let mut out = Vec::with_capacity(self.id_to_idx.len());
        self.graph.visit_nodes(|node| {
            out.push(NodePosition { id: node.data.user_data.id, x: node.x(), y: node.y() });
        });
        out
    }

    fn raw_positions(&self) -> Vec<(f32, f32)> {
        let mut out = Vec::with_capacity(self.id_to_idx.len());
        self.graph.visit_nodes(|node| out.push((node.x(), node.y())));
        out
    }

    /// Map screen coordinates into graph space under the current transform.
    #[must_use]
    pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
        (
            (sx - self.transform.x) / self.transform.k,
            (sy - self.transform.y) / self.transform.k,
        )
    }

    /// Hit test: the node under the given screen position, if any.
    #[must_use]
    pub fn node_at(&self, sx: f64, sy: f64) -> Option<Uuid> {
        let (gx, gy) = self.screen_to_graph(sx, sy);
        let mut found = None;
        self.graph.visit_nodes(|node| {
            let (dx, dy) = (f64::from(node.x()) - gx, f64::from(node.y()) - gy);
            // HIT_RADIUS is in graph space, scales with zoom like nodes.
            if (dx * dx + dy * dy).sqrt() < HIT_RADIUS {
                found = Some(node.data.user_data.id);
            }
        });
        found
    }

    #[must_use]
    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    #[must_use]
    pub fn options(&self) -> NetworkOptions {
        self.options
    }

    /// Drain commands recorded since the last call.
    pub fn take_commands(&mut self) -> Vec<NetworkCommand> {
        std::mem::take(&mut self.commands)
    }

    fn bounding_box(&self) -> Option<(f64, f64, f64, f64)> {
        let positions = self.raw_positions();
        let &(first_x, first_y) = positions.first()?;
        let (mut min_x, mut min_y) = (f64::from(first_x), f64::from(first_y));
        let (mut max_x, mut max_y) = (min_x, min_y);
        for &(x, y) in &positions {
            min_x = min_x.min(f64::from(x));
            min_y = min_y.min(f64::from(y));
            max_x = max_x.max(f64::from(x));
            max_y = max_y.max(f64::from(y));
        }
        Some((min_x, min_y, max_x, max_y))
    }
}

impl Network for ForceNetwork {
    fn fit(&mut self, animation: Animation) {
        if let Some((min_x, min_y, max_x, max_y)) = self.bounding_box() {
            let pad = 4.0 * NODE_RADIUS;
            let span_x = (max_x - min_x) + pad;
            let span_y = (max_y - min_y) + pad;
            let k = (self.width / span_x).min(self.height / span_y).clamp(0.1, 10.0);
            let (cx, cy) = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
            self.transform = ViewTransform {
                x: self.width / 2.0 - k * cx,
                y: self.height / 2.0 - k * cy,
                k,
            };
        }
        self.commands.push(NetworkCommand::Fit { animation });
    }

    fn focus(&mut self, node: Uuid, scale: f64, animation: Animation) {
        if let Some(&idx) = self.id_to_idx.get(&node) {
            let mut target = None;
            self.graph.visit_nodes(|n| {
                if n.index() == idx {
                    target = Some((f64::from(n.x()), f64::from(n.y())));
                }
            });
            if let Some((nx, ny)) = target {
                self.transform = ViewTransform {
                    x: self.width / 2.0 - scale * nx,
                    y: self.height / 2.0 - scale * ny,
                    k: scale,
                };
            }
        }
        self.commands.push(NetworkCommand::Focus { node, scale, animation });
    }

    fn set_options(&mut self, options: NetworkOptions) {
        self.options = options;
        self.commands.push(NetworkCommand::SetOptions { options });
    }
}

fn mean_displacement(before: &[(f32, f32)], after: &[(f32, f32)]) -> f32 {
    if before.is_empty() || before.len() != after.len() {
        return 0.0;
    }
    let total: f32 = before
        .iter()
        .zip(after)
        .map(|(a, b)| {
            let (dx, dy) = (b.0 - a.0, b.1 - a.1);
            (dx * dx + dy * dy).sqrt()
        })
        .sum();
    #[allow(clippy::cast_precision_loss)]
    {
        total / before.len() as f32
    }
}

#[cfg(test)]
#[path = "network_test.rs"]
mod tests;
