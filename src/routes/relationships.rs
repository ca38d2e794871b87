//! Relationship routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::routes::auth::AuthUser;
use crate::services::relationship::{self, RelationshipError};
use crate::state::{AppState, Relationship};

#[derive(Deserialize)]
pub struct InsertRelationshipBody {
    pub people: Vec<Uuid>,
    #[serde(default)]
    pub kind: String,
}

/// `POST /api/relationship.insert` — connect existing people.
pub async fn insert(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<InsertRelationshipBody>,
) -> Result<(StatusCode, Json<Relationship>), StatusCode> {
    let rel = relationship::insert_relationship(&state, body.people, &body.kind, auth.user.id)
        .await
        .map_err(|e| match e {
            RelationshipError::TooFewPeople => StatusCode::UNPROCESSABLE_ENTITY,
            RelationshipError::UnknownPerson(_) => StatusCode::NOT_FOUND,
        })?;
    Ok((StatusCode::CREATED, Json(rel)))
}
