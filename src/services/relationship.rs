//! Relationship service — creating the associations the graph renders.

use uuid::Uuid;

use crate::state::{AppState, Relationship};

#[derive(Debug, thiserror::Error)]
pub enum RelationshipError {
    #[error("a relationship needs at least two people")]
    TooFewPeople,
    #[error("unknown person: {0}")]
    UnknownPerson(Uuid),
}

/// Create a relationship between existing people.
///
/// # Errors
///
/// Returns `TooFewPeople` for fewer than two members and `UnknownPerson`
/// when any member id does not resolve to a person record.
pub async fn insert_relationship(
    state: &AppState,
    people: Vec<Uuid>,
    kind: &str,
    caller: Uuid,
) -> Result<Relationship, RelationshipError> {
    if people.len() < 2 {
        return Err(RelationshipError::TooFewPeople);
    }

    let mut directory = state.directory.write().await;
    for person_id in &people {
        if !directory.people.contains_key(person_id) {
            return Err(RelationshipError::UnknownPerson(*person_id));
        }
    }

    let rel = Relationship {
        id: Uuid::new_v4(),
        people,
        kind: kind.to_owned(),
        added_by: Some(caller),
    };
    let result = rel.clone();
    directory.dirty_relationships.insert(rel.id);
    directory.relationships.insert(rel.id, rel);

    Ok(result)
}
