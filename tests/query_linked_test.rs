//! `query_memory` expands the top primary hit with its one-hop linked
//! neighbors (spec §4.B/§4.G). Auto-linking is disabled here so the only
//! link in the store is the one this test creates explicitly, and a query
//! string matching one memory's embedding text exactly guarantees that
//! memory wins the `k = 1` dense search (cosine similarity 1.0 beats any
//! other deterministic hash embedding).

mod common;

use forgetful_core::config::Config;
use forgetful_core::tools::ToolExecutor;
use forgetful_core::types::memory::build_embedding_text;
use serde_json::json;

#[tokio::test]
async fn top_hit_surfaces_its_linked_neighbor() {
    let mut config = Config::default();
    config.memory.num_auto_link = 0;
    let fx = common::build_with_config(config).await;

    let a = fx
        .executor
        .execute(
            fx.user,
            "create_memory",
            json!({ "title": "Primary hit", "content": "Exact text the query below will repeat." }),
        )
        .await
        .unwrap();
    let a_id = a["memory"]["id"].as_i64().unwrap();

    let b = fx
        .executor
        .execute(
            fx.user,
            "create_memory",
            json!({ "title": "Linked neighbor", "content": "Unrelated wording entirely." }),
        )
        .await
        .unwrap();
    let b_id = b["memory"]["id"].as_i64().unwrap();

    let c = fx
        .executor
        .execute(
            fx.user,
            "create_memory",
            json!({ "title": "Distractor", "content": "Also unrelated wording." }),
        )
        .await
        .unwrap();
    let c_id = c["memory"]["id"].as_i64().unwrap();

    fx.executor
        .execute(fx.user, "link_memories", json!({ "memory_id": a_id, "related_ids": [b_id] }))
        .await
        .unwrap();

    let query = build_embedding_text("Primary hit", "Exact text the query below will repeat.", "", &[], &[]);
    let result = fx
        .executor
        .execute(fx.user, "query_memory", json!({ "query": query, "k": 1 }))
        .await
        .unwrap();

    let primary = result["primary_memories"].as_array().unwrap();
    assert_eq!(primary.len(), 1);
    assert_eq!(primary[0]["id"].as_i64(), Some(a_id));

    let linked = result["linked_memories"].as_array().unwrap();
    assert!(
        linked.iter().any(|l| l["memory"]["id"].as_i64() == Some(b_id)),
        "expected linked_memories to contain the neighbor linked to the top hit, got {linked:?}"
    );
    assert!(
        !linked.iter().any(|l| l["memory"]["id"].as_i64() == Some(c_id)),
        "unlinked distractor memory should not appear in linked_memories"
    );
}
