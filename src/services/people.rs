//! People service — the `person.insert` / `people.remove` method bodies.
//!
//! DESIGN
//! ======
//! Mutations update the in-memory directory immediately and mark records
//! dirty (or tombstoned) for the deferred persistence flush. The directory
//! write lock is held across the lookup-before-insert check and the insert,
//! so the idempotency check cannot race with itself.
//!
//! ERROR HANDLING
//! ==============
//! The method contracts favor silent outcomes over errors: an
//! unauthenticated insert yields a falsy result, and removing an unknown id
//! is a logged no-op. Validation is rejected at the route layer before these
//! bodies run.

use tracing::{info, warn};
use uuid::Uuid;

use crate::state::{AppState, Person};

// =============================================================================
// TYPES
// =============================================================================

/// Wire shape of a person submitted to `person.insert`.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PersonInput {
    pub firstname: String,
    pub lastname: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("person.{0} must be non-empty text")]
    EmptyField(&'static str),
}

impl PersonInput {
    /// Schema check performed before the method body runs.
    ///
    /// # Errors
    ///
    /// Returns `EmptyField` if either name is empty or whitespace.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.firstname.trim().is_empty() {
            return Err(ValidationError::EmptyField("firstname"));
        }
        if self.lastname.trim().is_empty() {
            return Err(ValidationError::EmptyField("lastname"));
        }
        Ok(())
    }
}

/// Result of `person.insert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new record was created.
    Created(Uuid),
    /// A record with the same name pair already existed; its id is returned.
    Exists(Uuid),
    /// No authenticated caller. Surfaces as JSON `false` on the wire.
    Unauthenticated,
}

impl InsertOutcome {
    /// The identity returned to the caller, if any.
    #[must_use]
    pub fn id(&self) -> Option<Uuid> {
        match self {
            Self::Created(id) | Self::Exists(id) => Some(*id),
            Self::Unauthenticated => None,
        }
    }
}

/// Result of `people.remove`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed { relationships_removed: usize },
    Missing,
}

// =============================================================================
// INSERT
// =============================================================================

/// Insert a person, idempotent on the exact `(firstname, lastname)` pair.
///
/// Requires an authenticated caller; without one the directory is untouched
/// and `Unauthenticated` is returned rather than an error.
pub async fn insert_person(state: &AppState, input: &PersonInput, caller: Option<Uuid>) -> InsertOutcome {
    let Some(caller) = caller else {
        return InsertOutcome::Unauthenticated;
    };

    let mut directory = state.directory.write().await;
    if let Some(existing) = directory.find_by_name(&input.firstname, &input.lastname) {
        return InsertOutcome::Exists(existing.id);
    }

    let person = Person {
        id: Uuid::new_v4(),
        firstname: input.firstname.clone(),
        lastname: input.lastname.clone(),
        added_by: Some(caller),
    };
    let id = person.id;
    directory.dirty_people.insert(id);
    directory.people.insert(id, person);

    info!(person_id = %id, added_by = %caller, "person inserted");
    InsertOutcome::Created(id)
}

// =============================================================================
// REMOVE
// =============================================================================

/// Remove a person and cascade over relationships.
///
/// Every relationship whose `people` list references the person is deleted
/// before the person record itself, so no orphaned relationships remain.
/// An unknown id is a no-op.
pub async fn remove_person(state: &AppState, person_id: Uuid) -> RemoveOutcome {
    let mut directory = state.directory.write().await;
    if !directory.people.contains_key(&person_id) {
        warn!(%person_id, "remove requested for unknown person");
        return RemoveOutcome::Missing;
    }

    // Cascade: relationships first, then the person.
    let referencing: Vec<Uuid> = directory
        .relationships
        .values()
        .filter(|r| r.people.contains(&person_id))
        .map(|r| r.id)
        .collect();
    for rel_id in &referencing {
        directory.relationships.remove(rel_id);
        directory.dirty_relationships.remove(rel_id);
        directory.removed_relationships.insert(*rel_id);
    }

    directory.people.remove(&person_id);
    directory.dirty_people.remove(&person_id);
    directory.removed_people.insert(person_id);

    info!(%person_id, relationships = referencing.len(), "person removed");
    RemoveOutcome::Removed { relationships_removed: referencing.len() }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "people_test.rs"]
mod tests;
