//! Wires [`forgetful_core::tools::ToolExecutor`] to the real domain
//! services, implementing every tool named in
//! [`forgetful_core::tools::ToolRegistry::with_defaults`].
//!
//! This is the piece the core crate deliberately leaves as a seam (spec
//! §4.J: "implemented outside this crate, in the MCP server binary, where
//! domain services are wired together") — the dispatcher only checks scope
//! and looks up metadata; the actual behavior lives here.

use async_trait::async_trait;
use forgetful_core::activity::{ActivityBus, ActivityEvent, ActivityKind};
use forgetful_core::config::Config;
use forgetful_core::embeddings::EmbeddingAdapter;
use forgetful_core::error::{Error, Result};
use forgetful_core::graph::GraphTraversal;
use forgetful_core::linking::AutoLinker;
use forgetful_core::retrieval::RetrievalPipeline;
use forgetful_core::storage::pagination::Page;
use forgetful_core::storage::StorageBackend;
use forgetful_core::tools::coercion::{coerce_to_int_list, coerce_to_str_list};
use forgetful_core::tools::ToolExecutor;
use forgetful_core::types::entity::EntityType;
use forgetful_core::types::memory::{build_embedding_text, validate_create};
use forgetful_core::types::{
    CodeArtifactCreate, DocumentCreate, EntityCreate, Id, MemoryCreate, MemoryQueryRequest,
    MemoryUpdate, ProjectCreate, UserId,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn publish(activity: &ActivityBus, user_id: UserId, entity_type: &'static str, entity_id: Option<Id>, kind: ActivityKind) {
    activity.publish(ActivityEvent {
        user_id,
        entity_type,
        entity_id,
        kind,
        timestamp: chrono::Utc::now(),
    });
}

/// Read a required string field out of the arguments object.
fn required_str<'a>(args: &'a Value, field: &str) -> Result<&'a str> {
    args.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| Error::validation(field, "is required"))
}

fn optional_str(args: &Value, field: &str) -> Option<String> {
    args.get(field).and_then(Value::as_str).map(str::to_string)
}

fn optional_u8(args: &Value, field: &str) -> Option<u8> {
    args.get(field).and_then(Value::as_u64).and_then(|v| u8::try_from(v).ok())
}

fn optional_usize(args: &Value, field: &str) -> Option<usize> {
    args.get(field).and_then(Value::as_u64).map(|v| v as usize)
}

fn required_id(args: &Value, field: &str) -> Result<Id> {
    args.get(field)
        .and_then(Value::as_i64)
        .ok_or_else(|| Error::validation(field, "is required and must be an integer id"))
}

fn str_list(args: &Value, field: &str) -> Result<Vec<String>> {
    Ok(coerce_to_str_list(args.get(field), false, field)?.unwrap_or_default())
}

fn int_list(args: &Value, field: &str) -> Result<Vec<Id>> {
    Ok(coerce_to_int_list(args.get(field), field)?.unwrap_or_default())
}

/// Everything needed to execute a domain tool against the current user's
/// data. One instance is shared across every request (the storage backend
/// and adapters are process-wide, per spec §5).
pub struct ServiceExecutor {
    pub storage: Arc<dyn StorageBackend>,
    pub embeddings: Arc<dyn EmbeddingAdapter>,
    pub pipeline: Arc<RetrievalPipeline>,
    pub linker: Arc<AutoLinker>,
    pub graph: Arc<GraphTraversal>,
    pub config: Arc<Config>,
    pub activity: ActivityBus,
}

impl ServiceExecutor {
    async fn query_memory(&self, user_id: UserId, args: Value) -> Result<Value> {
        let query = required_str(&args, "query")?.to_string();
        let request = MemoryQueryRequest {
            query,
            query_context: optional_str(&args, "query_context").unwrap_or_default(),
            k: optional_usize(&args, "k").unwrap_or(5),
            include_links: args.get("include_links").and_then(Value::as_bool).unwrap_or(true),
            max_links_per_primary: optional_usize(&args, "max_links_per_primary").unwrap_or(5),
            token_context_threshold: optional_usize(&args, "token_context_threshold"),
            max_memories: optional_usize(&args, "max_memories"),
            importance_threshold: optional_u8(&args, "importance_threshold"),
            project_ids: {
                let ids = int_list(&args, "project_ids")?;
                if ids.is_empty() { None } else { Some(ids) }
            },
            exclude_ids: None,
            strict_project_filter: args.get("strict_project_filter").and_then(Value::as_bool).unwrap_or(false),
        };

        let result = self.pipeline.query(user_id, &request, &self.config.memory).await?;
        publish(&self.activity, user_id, "memory", None, ActivityKind::Queried);
        Ok(serde_json::to_value(result)?)
    }

    async fn create_memory(&self, user_id: UserId, args: Value) -> Result<Value> {
        let data = MemoryCreate {
            title: required_str(&args, "title")?.to_string(),
            content: required_str(&args, "content")?.to_string(),
            context: optional_str(&args, "context").unwrap_or_default(),
            keywords: str_list(&args, "keywords")?,
            tags: str_list(&args, "tags")?,
            importance: optional_u8(&args, "importance").unwrap_or(7),
            project_ids: int_list(&args, "project_ids")?,
            code_artifact_ids: int_list(&args, "code_artifact_ids")?,
            document_ids: int_list(&args, "document_ids")?,
            entity_ids: int_list(&args, "entity_ids")?,
        };
        validate_create(&data, &self.config.memory)?;

        let text = build_embedding_text(&data.title, &data.content, &data.context, &data.keywords, &data.tags);
        let embedding = self.embeddings.embed(&text).await?;
        let created = self.storage.create_memory(user_id, &data, embedding.clone()).await?;
        let similar = self
            .linker
            .auto_link(user_id, created.id, &embedding, self.config.memory.num_auto_link)
            .await;
        publish(&self.activity, user_id, "memory", Some(created.id), ActivityKind::Created);

        let refetched = self.storage.get_memory(user_id, created.id).await?;
        Ok(json!({ "memory": refetched, "similar_memories": similar }))
    }

    async fn update_memory(&self, user_id: UserId, args: Value) -> Result<Value> {
        let id = required_id(&args, "memory_id")?;
        let update = MemoryUpdate {
            title: optional_str(&args, "title"),
            content: optional_str(&args, "content"),
            context: optional_str(&args, "context"),
            keywords: coerce_to_str_list(args.get("keywords"), false, "keywords")?,
            tags: coerce_to_str_list(args.get("tags"), false, "tags")?,
            importance: optional_u8(&args, "importance"),
            project_ids: coerce_to_int_list(args.get("project_ids"), "project_ids")?,
            code_artifact_ids: coerce_to_int_list(args.get("code_artifact_ids"), "code_artifact_ids")?,
            document_ids: coerce_to_int_list(args.get("document_ids"), "document_ids")?,
            entity_ids: coerce_to_int_list(args.get("entity_ids"), "entity_ids")?,
        };

        let new_embedding = if update.search_fields_changed() {
            let current = self.storage.get_memory(user_id, id).await?;
            let title = update.title.as_deref().unwrap_or(&current.title);
            let content = update.content.as_deref().unwrap_or(&current.content);
            let context = update.context.as_deref().unwrap_or(&current.context);
            let keywords = update.keywords.as_ref().unwrap_or(&current.keywords);
            let tags = update.tags.as_ref().unwrap_or(&current.tags);
            let text = build_embedding_text(title, content, context, keywords, tags);
            Some(self.embeddings.embed(&text).await?)
        } else {
            None
        };

        let updated = self.storage.update_memory(user_id, id, &update, new_embedding).await?;
        publish(&self.activity, user_id, "memory", Some(id), ActivityKind::Updated);
        Ok(serde_json::to_value(updated)?)
    }

    async fn mark_memory_obsolete(&self, user_id: UserId, args: Value) -> Result<Value> {
        let id = required_id(&args, "memory_id")?;
        let reason = optional_str(&args, "reason");
        let superseded_by = args.get("superseded_by").and_then(Value::as_i64);
        let memory = self.storage.mark_memory_obsolete(user_id, id, reason, superseded_by).await?;
        publish(&self.activity, user_id, "memory", Some(id), ActivityKind::Obsoleted);
        Ok(serde_json::to_value(memory)?)
    }

    async fn link_memories(&self, user_id: UserId, args: Value) -> Result<Value> {
        let id = required_id(&args, "memory_id")?;
        let related_ids = int_list(&args, "related_ids")?;
        let count = self.linker.link_memories(user_id, id, &related_ids).await?;
        publish(&self.activity, user_id, "memory", Some(id), ActivityKind::Linked);
        Ok(json!({ "linked_count": count }))
    }

    async fn get_subgraph(&self, user_id: UserId, args: Value) -> Result<Value> {
        let center_node_id = required_str(&args, "center_node_id")?.to_string();
        let depth = optional_u8(&args, "depth").unwrap_or(2);
        let max_nodes = optional_usize(&args, "max_nodes").unwrap_or(100);
        let node_types = coerce_to_str_list(args.get("node_types"), false, "node_types")?;
        let filter: Option<Vec<&str>> = node_types.as_ref().map(|v| v.iter().map(String::as_str).collect());

        let result = self
            .graph
            .get_subgraph(user_id, &center_node_id, depth, filter.as_deref(), max_nodes)
            .await?;
        Ok(serde_json::to_value(result)?)
    }

    async fn create_project(&self, user_id: UserId, args: Value) -> Result<Value> {
        let data = ProjectCreate {
            name: required_str(&args, "name")?.to_string(),
            description: optional_str(&args, "description"),
        };
        forgetful_core::types::project::validate_create(&data)?;
        let project = self.storage.create_project(user_id, &data).await?;
        publish(&self.activity, user_id, "project", Some(project.id), ActivityKind::Created);
        Ok(serde_json::to_value(project)?)
    }

    async fn list_projects(&self, user_id: UserId, args: Value) -> Result<Value> {
        let page = Page::new(optional_usize(&args, "offset").unwrap_or(0), optional_usize(&args, "limit").unwrap_or(20));
        let projects = self.storage.list_projects(user_id, page).await?;
        Ok(serde_json::to_value(projects)?)
    }

    async fn create_document(&self, user_id: UserId, args: Value) -> Result<Value> {
        let data = DocumentCreate {
            title: required_str(&args, "title")?.to_string(),
            content: required_str(&args, "content")?.to_string(),
            source_url: optional_str(&args, "source_url"),
            project_ids: int_list(&args, "project_ids")?,
        };
        forgetful_core::types::document::validate_create(&data)?;
        let document = self.storage.create_document(user_id, &data).await?;
        publish(&self.activity, user_id, "document", Some(document.id), ActivityKind::Created);
        Ok(serde_json::to_value(document)?)
    }

    async fn create_code_artifact(&self, user_id: UserId, args: Value) -> Result<Value> {
        let data = CodeArtifactCreate {
            name: required_str(&args, "name")?.to_string(),
            language: optional_str(&args, "language"),
            content: required_str(&args, "content")?.to_string(),
            file_path: optional_str(&args, "file_path"),
            project_ids: int_list(&args, "project_ids")?,
        };
        forgetful_core::types::code_artifact::validate_create(&data)?;
        let artifact = self.storage.create_code_artifact(user_id, &data).await?;
        publish(&self.activity, user_id, "code_artifact", Some(artifact.id), ActivityKind::Created);
        Ok(serde_json::to_value(artifact)?)
    }

    async fn create_entity(&self, user_id: UserId, args: Value) -> Result<Value> {
        let entity_type_str = required_str(&args, "entity_type")?;
        let entity_type = match entity_type_str {
            "organization" => EntityType::Organization,
            "individual" => EntityType::Individual,
            "team" => EntityType::Team,
            "device" => EntityType::Device,
            "other" => EntityType::Other,
            other => {
                return Err(Error::validation(
                    "entity_type",
                    format!("unknown entity type '{other}', expected organization, individual, team, device, or other"),
                ))
            }
        };
        let data = EntityCreate {
            name: required_str(&args, "name")?.to_string(),
            entity_type,
            custom_type: optional_str(&args, "custom_type"),
            aka: str_list(&args, "aka")?,
            description: optional_str(&args, "description"),
        };
        forgetful_core::types::entity::validate_create(&data)?;
        let entity = self.storage.create_entity(user_id, &data).await?;
        publish(&self.activity, user_id, "entity", Some(entity.id), ActivityKind::Created);
        Ok(serde_json::to_value(entity)?)
    }

    async fn list_entities(&self, user_id: UserId, args: Value) -> Result<Value> {
        let page = Page::new(optional_usize(&args, "offset").unwrap_or(0), optional_usize(&args, "limit").unwrap_or(20));
        let entities = self.storage.list_entities(user_id, page).await?;
        Ok(serde_json::to_value(entities)?)
    }

    fn whoami(&self, user_id: UserId) -> Value {
        json!({ "user_id": user_id.to_string() })
    }
}

#[async_trait]
impl ToolExecutor for ServiceExecutor {
    async fn execute(&self, user_id: UserId, tool_name: &str, arguments: Value) -> Result<Value> {
        match tool_name {
            "query_memory" => self.query_memory(user_id, arguments).await,
            "create_memory" => self.create_memory(user_id, arguments).await,
            "update_memory" => self.update_memory(user_id, arguments).await,
            "mark_memory_obsolete" => self.mark_memory_obsolete(user_id, arguments).await,
            "link_memories" => self.link_memories(user_id, arguments).await,
            "get_subgraph" => self.get_subgraph(user_id, arguments).await,
            "create_project" => self.create_project(user_id, arguments).await,
            "list_projects" => self.list_projects(user_id, arguments).await,
            "create_document" => self.create_document(user_id, arguments).await,
            "create_code_artifact" => self.create_code_artifact(user_id, arguments).await,
            "create_entity" => self.create_entity(user_id, arguments).await,
            "list_entities" => self.list_entities(user_id, arguments).await,
            "whoami" => Ok(self.whoami(user_id)),
            other => Err(Error::not_found("tool", other)),
        }
    }
}
