//! The person remote methods over HTTP.
//!
//! CONTRACTS
//! =========
//! Both routes preserve the original method semantics: `person.insert`
//! answers the new or existing id, or JSON `false` for unauthenticated
//! callers; `people.remove` always answers 204 and treats an unknown id as
//! a no-op. Both share one rate limiter, keyed per connection.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::routes::auth::{self, MaybeAuthUser};
use crate::services::people::{self, PersonInput};
use crate::state::{AppState, Person};

/// Rate-limit key for the calling connection.
///
/// HTTP has no DDP-style connection id, so the session cookie stands in:
/// its SHA-256 prefix becomes the key. Callers without a cookie share the
/// nil bucket.
pub(crate) fn connection_key(jar: &CookieJar) -> Uuid {
    let token = jar.get(auth::COOKIE_NAME).map(Cookie::value).unwrap_or_default();
    if token.is_empty() {
        return Uuid::nil();
    }
    let digest = Sha256::digest(token.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes)
}

// =============================================================================
// INSERT
// =============================================================================

#[derive(Deserialize)]
pub struct InsertBody {
    pub person: PersonInput,
}

/// `POST /api/person.insert` — idempotent authenticated insert.
pub async fn insert(
    State(state): State<AppState>,
    jar: CookieJar,
    auth: MaybeAuthUser,
    Json(body): Json<InsertBody>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    state
        .rate_limiter
        .check_and_record(connection_key(&jar))
        .map_err(|_| StatusCode::TOO_MANY_REQUESTS)?;

    body.person
        .validate()
        .map_err(|_| StatusCode::UNPROCESSABLE_ENTITY)?;

    let caller = auth.0.map(|user| user.id);
    let outcome = people::insert_person(&state, &body.person, caller).await;
    Ok(Json(match outcome.id() {
        Some(id) => serde_json::json!(id),
        None => serde_json::json!(false),
    }))
}

// =============================================================================
// REMOVE
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveBody {
    pub person_id: Uuid,
}

/// `POST /api/people.remove` — cascade removal, side effect only.
pub async fn remove(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<RemoveBody>,
) -> Result<StatusCode, StatusCode> {
    state
        .rate_limiter
        .check_and_record(connection_key(&jar))
        .map_err(|_| StatusCode::TOO_MANY_REQUESTS)?;

    // The original guarded this with an always-truthy check; removal
    // proceeds for any caller.
    people::remove_person(&state, body.person_id).await;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// LIST
// =============================================================================

/// `GET /api/people` — the full person collection.
pub async fn list(State(state): State<AppState>) -> Json<Vec<Person>> {
    let directory = state.directory.read().await;
    let mut people: Vec<Person> = directory.people.values().cloned().collect();
    people.sort_by(|a, b| (&a.lastname, &a.firstname).cmp(&(&b.lastname, &b.firstname)));
    Json(people)
}

#[cfg(test)]
#[path = "people_test.rs"]
mod tests;
