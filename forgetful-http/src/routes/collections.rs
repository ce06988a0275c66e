//! `/api/v1/{projects,documents,code_artifacts,entities}` — supporting
//! resource CRUD (spec §3, §6). Thinner than the memory routes: no
//! embeddings, no linking, just validate-then-delegate-to-storage.

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::params;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use forgetful_core::types::code_artifact as code_artifact_types;
use forgetful_core::types::document as document_types;
use forgetful_core::types::entity as entity_types;
use forgetful_core::types::project as project_types;
use forgetful_core::types::{
    CodeArtifact, CodeArtifactCreate, CodeArtifactUpdate, Document, DocumentCreate, DocumentUpdate,
    Entity, EntityCreate, EntityRelationship, EntityRelationshipCreate, EntityUpdate, Id, Project,
    ProjectCreate, ProjectUpdate,
};
use std::collections::HashMap;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/projects", get(list_projects).post(create_project))
        .route(
            "/api/v1/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/api/v1/documents", get(list_documents).post(create_document))
        .route(
            "/api/v1/documents/{id}",
            get(get_document).put(update_document).delete(delete_document),
        )
        .route(
            "/api/v1/code_artifacts",
            get(list_code_artifacts).post(create_code_artifact),
        )
        .route(
            "/api/v1/code_artifacts/{id}",
            get(get_code_artifact).put(update_code_artifact).delete(delete_code_artifact),
        )
        .route("/api/v1/entities", get(list_entities).post(create_entity))
        .route(
            "/api/v1/entities/{id}",
            get(get_entity).put(update_entity).delete(delete_entity),
        )
        .route("/api/v1/entity_relationships", post(create_entity_relationship))
        .route("/api/v1/entity_relationships/{id}", axum::routing::delete(delete_entity_relationship))
}

// -- projects ----------------------------------------------------------

async fn list_projects(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Project>>, ApiError> {
    let page = params::parse_pagination(&query)?;
    Ok(Json(state.storage.list_projects(user_id, page).await?))
}

async fn create_project(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(data): Json<ProjectCreate>,
) -> Result<Json<Project>, ApiError> {
    project_types::validate_create(&data)?;
    Ok(Json(state.storage.create_project(user_id, &data).await?))
}

async fn get_project(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Id>,
) -> Result<Json<Project>, ApiError> {
    Ok(Json(state.storage.get_project(user_id, id).await?))
}

async fn update_project(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Id>,
    Json(update): Json<ProjectUpdate>,
) -> Result<Json<Project>, ApiError> {
    Ok(Json(state.storage.update_project(user_id, id, &update).await?))
}

async fn delete_project(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Id>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.storage.delete_project(user_id, id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

// -- documents -----------------------------------------------------------

async fn list_documents(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let page = params::parse_pagination(&query)?;
    Ok(Json(state.storage.list_documents(user_id, page).await?))
}

async fn create_document(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(data): Json<DocumentCreate>,
) -> Result<Json<Document>, ApiError> {
    document_types::validate_create(&data)?;
    Ok(Json(state.storage.create_document(user_id, &data).await?))
}

async fn get_document(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Id>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(state.storage.get_document(user_id, id).await?))
}

async fn update_document(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Id>,
    Json(update): Json<DocumentUpdate>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(state.storage.update_document(user_id, id, &update).await?))
}

async fn delete_document(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Id>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.storage.delete_document(user_id, id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

// -- code artifacts --------------------------------------------------------

async fn list_code_artifacts(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Vec<CodeArtifact>>, ApiError> {
    let page = params::parse_pagination(&query)?;
    Ok(Json(state.storage.list_code_artifacts(user_id, page).await?))
}

async fn create_code_artifact(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(data): Json<CodeArtifactCreate>,
) -> Result<Json<CodeArtifact>, ApiError> {
    code_artifact_types::validate_create(&data)?;
    Ok(Json(state.storage.create_code_artifact(user_id, &data).await?))
}

async fn get_code_artifact(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Id>,
) -> Result<Json<CodeArtifact>, ApiError> {
    Ok(Json(state.storage.get_code_artifact(user_id, id).await?))
}

async fn update_code_artifact(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Id>,
    Json(update): Json<CodeArtifactUpdate>,
) -> Result<Json<CodeArtifact>, ApiError> {
    Ok(Json(state.storage.update_code_artifact(user_id, id, &update).await?))
}

async fn delete_code_artifact(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Id>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.storage.delete_code_artifact(user_id, id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

// -- entities -------------------------------------------------------------

async fn list_entities(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Entity>>, ApiError> {
    let page = params::parse_pagination(&query)?;
    Ok(Json(state.storage.list_entities(user_id, page).await?))
}

async fn create_entity(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(data): Json<EntityCreate>,
) -> Result<Json<Entity>, ApiError> {
    entity_types::validate_create(&data)?;
    Ok(Json(state.storage.create_entity(user_id, &data).await?))
}

async fn get_entity(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Id>,
) -> Result<Json<Entity>, ApiError> {
    Ok(Json(state.storage.get_entity(user_id, id).await?))
}

async fn update_entity(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Id>,
    Json(update): Json<EntityUpdate>,
) -> Result<Json<Entity>, ApiError> {
    Ok(Json(state.storage.update_entity(user_id, id, &update).await?))
}

async fn delete_entity(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Id>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.storage.delete_entity(user_id, id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn create_entity_relationship(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(data): Json<EntityRelationshipCreate>,
) -> Result<Json<EntityRelationship>, ApiError> {
    entity_types::validate_relationship_create(&data)?;
    Ok(Json(state.storage.create_entity_relationship(user_id, &data).await?))
}

async fn delete_entity_relationship(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Id>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.storage.delete_entity_relationship(user_id, id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
