//! Graph wire types and the fixed layout configuration.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::{Directory, Person, Relationship};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: Uuid,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: Uuid,
    pub to: Uuid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphData {
    /// Build graph data from the live collections: one node per person,
    /// one edge per member pair of each relationship.
    #[must_use]
    pub fn from_directory(directory: &Directory) -> Self {
        let mut nodes: Vec<GraphNode> = directory.people.values().map(node_for).collect();
        nodes.sort_by(|a, b| a.label.cmp(&b.label));

        let mut edges = Vec::new();
        for rel in directory.relationships.values() {
            edges.extend(member_pairs(rel));
        }
        Self { nodes, edges }
    }
}

fn node_for(person: &Person) -> GraphNode {
    GraphNode {
        id: person.id,
        label: format!("{} {}", person.firstname, person.lastname),
    }
}

/// Expand a relationship into edges: every pair of members is connected.
fn member_pairs(rel: &Relationship) -> Vec<GraphEdge> {
    let mut pairs = Vec::new();
    for (i, &from) in rel.people.iter().enumerate() {
        for &to in &rel.people[i + 1..] {
            pairs.push(GraphEdge { from, to });
        }
    }
    pairs
}

// =============================================================================
// LAYOUT CONFIGURATION
// =============================================================================

/// Animation parameters forwarded to the client alongside view commands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub duration_ms: u64,
    pub easing: Easing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    EaseInOutQuad,
    Linear,
}

/// Fixed physics/layout configuration handed to the network.
///
/// `edges_hidden` starts true: edges are revealed by the option update the
/// view applies after stabilization settles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkOptions {
    /// Node repulsion strength.
    pub force_charge: f32,
    /// Spring constant for edges.
    pub force_spring: f32,
    /// Velocity cap per simulation step.
    pub force_max: f32,
    /// Simulation speed multiplier.
    pub node_speed: f32,
    /// Per-step velocity damping.
    pub damping_factor: f32,
    /// Upper bound on stabilization iterations.
    pub stabilization_iterations: u32,
    pub edges_hidden: bool,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self {
            force_charge: 150.0,
            force_spring: 0.05,
            force_max: 100.0,
            node_speed: 3000.0,
            damping_factor: 0.9,
            stabilization_iterations: 1000,
            edges_hidden: true,
        }
    }
}

impl NetworkOptions {
    /// The post-stabilization configuration: identical physics, edges shown.
    #[must_use]
    pub fn revealed(mut self) -> Self {
        self.edges_hidden = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(people: &[Uuid]) -> Relationship {
        Relationship { id: Uuid::new_v4(), people: people.to_vec(), kind: "friend".into(), added_by: None }
    }

    #[test]
    fn two_member_relationship_yields_one_edge() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let edges = member_pairs(&rel(&[a, b]));
        assert_eq!(edges, vec![GraphEdge { from: a, to: b }]);
    }

    #[test]
    fn three_member_relationship_yields_all_pairs() {
        let ids = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let edges = member_pairs(&rel(&ids));
        assert_eq!(edges.len(), 3);
    }

    #[test]
    fn from_directory_builds_labeled_nodes() {
        let mut dir = Directory::new();
        let person = Person {
            id: Uuid::new_v4(),
            firstname: "Ada".into(),
            lastname: "Lovelace".into(),
            added_by: None,
        };
        dir.people.insert(person.id, person);

        let data = GraphData::from_directory(&dir);
        assert_eq!(data.nodes.len(), 1);
        assert_eq!(data.nodes[0].label, "Ada Lovelace");
        assert!(data.edges.is_empty());
    }

    #[test]
    fn default_options_hide_edges_until_revealed() {
        let options = NetworkOptions::default();
        assert!(options.edges_hidden);
        assert_eq!(options.stabilization_iterations, 1000);
        assert!(!options.revealed().edges_hidden);
    }
}
