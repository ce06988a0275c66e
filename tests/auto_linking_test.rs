//! Creating a memory whose embedding text exactly matches an existing
//! memory's is the one deterministic-embedding case where auto-linking is
//! guaranteed to fire (cosine similarity 1.0), so it's the one this
//! end-to-end test can assert on without a real semantic embedder.

mod common;

use forgetful_core::tools::ToolExecutor;
use serde_json::json;

#[tokio::test]
async fn create_memory_auto_links_to_identical_sibling() {
    let fx = common::build().await;

    let first = fx
        .executor
        .execute(
            fx.user,
            "create_memory",
            json!({
                "title": "Rotate the API signing key",
                "content": "Signing keys rotate every 90 days via the ops runbook.",
            }),
        )
        .await
        .unwrap();
    let first_id = first["memory"]["id"].as_i64().unwrap();

    let second = fx
        .executor
        .execute(
            fx.user,
            "create_memory",
            json!({
                "title": "Rotate the API signing key",
                "content": "Signing keys rotate every 90 days via the ops runbook.",
            }),
        )
        .await
        .unwrap();

    let similar = second["similar_memories"].as_array().unwrap();
    assert!(
        similar.iter().any(|v| v.as_i64() == Some(first_id)),
        "expected the duplicate memory to auto-link to its identical sibling, got {similar:?}"
    );
}

#[tokio::test]
async fn auto_link_finds_no_neighbors_in_an_empty_store() {
    let fx = common::build().await;

    let created = fx
        .executor
        .execute(
            fx.user,
            "create_memory",
            json!({ "title": "Lone memory", "content": "Nothing else exists yet." }),
        )
        .await
        .unwrap();

    assert!(created["similar_memories"].as_array().unwrap().is_empty());
}
