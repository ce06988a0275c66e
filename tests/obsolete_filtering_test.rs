//! Marking a memory obsolete removes it from semantic search (dense stage
//! of `query_memory`) without deleting it — it's still reachable by id
//! (spec §4.C: "soft delete").

mod common;

use forgetful_core::storage::StorageBackend;
use forgetful_core::tools::ToolExecutor;
use forgetful_core::types::memory::build_embedding_text;
use serde_json::json;

#[tokio::test]
async fn obsolete_memory_is_excluded_from_query_but_still_fetchable() {
    let fx = common::build().await;

    let created = fx
        .executor
        .execute(
            fx.user,
            "create_memory",
            json!({ "title": "Deprecated endpoint", "content": "The v1 webhook path is retired." }),
        )
        .await
        .unwrap();
    let id = created["memory"]["id"].as_i64().unwrap();

    fx.executor
        .execute(fx.user, "mark_memory_obsolete", json!({ "memory_id": id, "reason": "superseded by v2" }))
        .await
        .unwrap();

    let query = build_embedding_text("Deprecated endpoint", "The v1 webhook path is retired.", "", &[], &[]);
    let result = fx
        .executor
        .execute(fx.user, "query_memory", json!({ "query": query, "k": 5 }))
        .await
        .unwrap();

    let primary = result["primary_memories"].as_array().unwrap();
    assert!(
        !primary.iter().any(|m| m["id"].as_i64() == Some(id)),
        "obsolete memory should not surface in query_memory results"
    );

    let fetched = fx.storage.get_memory(fx.user, id).await.unwrap();
    assert!(fetched.is_obsolete);
    assert_eq!(fetched.obsolete_reason.as_deref(), Some("superseded by v2"));
}
