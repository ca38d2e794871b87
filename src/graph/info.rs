//! Overlay info resolution for a focused node.

use serde::Serialize;
use uuid::Uuid;

use crate::state::{Person, Relationship};

/// One relationship line in the info panel: the kind plus the other members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationEntry {
    pub kind: String,
    pub others: Vec<String>,
}

/// Display data for the info overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonInfo {
    pub id: Uuid,
    pub name: String,
    pub relations: Vec<RelationEntry>,
}

/// Resolve display data for the focused identity from the full collections.
/// Returns `None` when the id matches no person (stale focus after removal).
#[must_use]
pub fn resolve(id: Uuid, people: &[Person], relationships: &[Relationship]) -> Option<PersonInfo> {
    let person = people.iter().find(|p| p.id == id)?;

    let relations = relationships
        .iter()
        .filter(|r| r.people.contains(&id))
        .map(|r| RelationEntry {
            kind: r.kind.clone(),
            others: r
                .people
                .iter()
                .filter(|&&member| member != id)
                .map(|member| display_name(*member, people))
                .collect(),
        })
        .collect();

    Some(PersonInfo {
        id,
        name: format!("{} {}", person.firstname, person.lastname),
        relations,
    })
}

fn display_name(id: Uuid, people: &[Person]) -> String {
    people
        .iter()
        .find(|p| p.id == id)
        .map_or_else(|| "(unknown)".to_owned(), |p| format!("{} {}", p.firstname, p.lastname))
}
