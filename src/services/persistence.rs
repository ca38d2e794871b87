//! Persistence service — hydration and background flush for the directory.
//!
//! DESIGN
//! ======
//! A background task snapshots dirty records and tombstones under the lock,
//! writes to Postgres outside the lock, then sleeps before the next cycle.
//!
//! ERROR HANDLING
//! ==============
//! Dirty flags and tombstones are cleared only after successful writes. This
//! prioritizes durability over duplicate flush attempts: repeated upserts
//! are acceptable, silent data loss is not.

use std::collections::HashMap;
use std::time::Duration;

use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::state::{AppState, Directory, Person, Relationship};

const DEFAULT_FLUSH_INTERVAL_MS: u64 = 250;

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

// =============================================================================
// HYDRATION
// =============================================================================

/// Load the full people/relationship collections from Postgres.
///
/// Runs once at startup, before the server accepts traffic.
///
/// # Errors
///
/// Returns a database error if either query fails.
pub async fn hydrate_directory(pool: &PgPool) -> Result<Directory, sqlx::Error> {
    let people_rows = sqlx::query_as::<_, (Uuid, String, String, Option<Uuid>)>(
        "SELECT id, firstname, lastname, added_by FROM people",
    )
    .fetch_all(pool)
    .await?;

    let relationship_rows = sqlx::query_as::<_, (Uuid, Vec<Uuid>, String, Option<Uuid>)>(
        "SELECT id, people, kind, added_by FROM relationships",
    )
    .fetch_all(pool)
    .await?;

    let mut directory = Directory::new();
    directory.people = people_rows
        .into_iter()
        .map(|(id, firstname, lastname, added_by)| (id, Person { id, firstname, lastname, added_by }))
        .collect::<HashMap<_, _>>();
    directory.relationships = relationship_rows
        .into_iter()
        .map(|(id, people, kind, added_by)| (id, Relationship { id, people, kind, added_by }))
        .collect::<HashMap<_, _>>();

    info!(
        people = directory.people.len(),
        relationships = directory.relationships.len(),
        "hydrated directory from database"
    );
    Ok(directory)
}

// =============================================================================
// FLUSH TASK
// =============================================================================

/// Spawn the background persistence task. Returns a handle for shutdown.
pub fn spawn_persistence_task(state: AppState) -> JoinHandle<()> {
    let flush_interval_ms = env_parse("DIRECTORY_FLUSH_INTERVAL_MS", DEFAULT_FLUSH_INTERVAL_MS);
    info!(flush_interval_ms, "directory persistence flush configured");
    tokio::spawn(async move {
        loop {
            flush_all_dirty(&state).await;
            tokio::time::sleep(Duration::from_millis(flush_interval_ms)).await;
        }
    })
}

/// Snapshot of pending writes, taken under the directory lock.
#[derive(Debug, Default)]
pub(crate) struct FlushBatch {
    pub(crate) people: Vec<Person>,
    pub(crate) relationships: Vec<Relationship>,
    pub(crate) removed_people: Vec<Uuid>,
    pub(crate) removed_relationships: Vec<Uuid>,
}

impl FlushBatch {
    pub(crate) fn is_empty(&self) -> bool {
        self.people.is_empty()
            && self.relationships.is_empty()
            && self.removed_people.is_empty()
            && self.removed_relationships.is_empty()
    }
}

/// Collect dirty records and tombstones into a batch of clones.
pub(crate) fn snapshot_dirty(directory: &Directory) -> FlushBatch {
    FlushBatch {
        people: directory
            .dirty_people
            .iter()
            .filter_map(|id| directory.people.get(id).cloned())
            .collect(),
        relationships: directory
            .dirty_relationships
            .iter()
            .filter_map(|id| directory.relationships.get(id).cloned())
            .collect(),
        removed_people: directory.removed_people.iter().copied().collect(),
        removed_relationships: directory.removed_relationships.iter().copied().collect(),
    }
}

/// Acknowledge a successfully flushed batch.
///
/// A dirty flag is cleared only when the live record still equals the
/// snapshot that was written; records mutated mid-flush stay dirty for the
/// next cycle. Tombstones for flushed deletes are always cleared.
pub(crate) fn ack_flush(directory: &mut Directory, batch: &FlushBatch) {
    for person in &batch.people {
        if directory.people.get(&person.id) == Some(person) {
            directory.dirty_people.remove(&person.id);
        }
    }
    for rel in &batch.relationships {
        if directory.relationships.get(&rel.id) == Some(rel) {
            directory.dirty_relationships.remove(&rel.id);
        }
    }
    for id in &batch.removed_people {
        directory.removed_people.remove(id);
    }
    for id in &batch.removed_relationships {
        directory.removed_relationships.remove(id);
    }
}

async fn flush_all_dirty(state: &AppState) {
    // PHASE: SNAPSHOT UNDER LOCK
    let batch = {
        let directory = state.directory.read().await;
        snapshot_dirty(&directory)
    };
    if batch.is_empty() {
        return;
    }

    // PHASE: WRITE OUTSIDE LOCK, THEN ACK
    match flush_batch(&state.pool, &batch).await {
        Ok(()) => {
            let mut directory = state.directory.write().await;
            ack_flush(&mut directory, &batch);
        }
        Err(e) => {
            error!(
                error = %e,
                people = batch.people.len(),
                relationships = batch.relationships.len(),
                "persistence flush failed"
            );
        }
    }
}

// =============================================================================
// SQL
// =============================================================================

/// Apply one batch in a single transaction: deletes first, then upserts.
async fn flush_batch(pool: &PgPool, batch: &FlushBatch) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    if !batch.removed_relationships.is_empty() {
        sqlx::query("DELETE FROM relationships WHERE id = ANY($1)")
            .bind(&batch.removed_relationships)
            .execute(tx.as_mut())
            .await?;
    }
    if !batch.removed_people.is_empty() {
        sqlx::query("DELETE FROM people WHERE id = ANY($1)")
            .bind(&batch.removed_people)
            .execute(tx.as_mut())
            .await?;
    }

    for person in &batch.people {
        sqlx::query(
            "INSERT INTO people (id, firstname, lastname, added_by) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (id) DO UPDATE SET \
                 firstname = EXCLUDED.firstname, lastname = EXCLUDED.lastname, \
                 added_by = EXCLUDED.added_by",
        )
        .bind(person.id)
        .bind(&person.firstname)
        .bind(&person.lastname)
        .bind(person.added_by)
        .execute(tx.as_mut())
        .await?;
    }

    for rel in &batch.relationships {
        sqlx::query(
            "INSERT INTO relationships (id, people, kind, added_by) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (id) DO UPDATE SET \
                 people = EXCLUDED.people, kind = EXCLUDED.kind, \
                 added_by = EXCLUDED.added_by",
        )
        .bind(rel.id)
        .bind(&rel.people)
        .bind(&rel.kind)
        .bind(rel.added_by)
        .execute(tx.as_mut())
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;
