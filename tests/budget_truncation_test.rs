//! `query_memory`'s token-budget composition sorts candidates by
//! importance before truncating (spec §4.G) and drops linked memories
//! entirely once primary truncation happens. Requesting every memory in
//! the store as primary (`k` == total count) removes dense-ranking order
//! from the picture, so only the budget logic decides which one survives.

mod common;

use forgetful_core::tools::ToolExecutor;
use serde_json::json;

#[tokio::test]
async fn tiny_token_budget_keeps_only_the_highest_importance_memory() {
    let fx = common::build().await;

    let keep = fx
        .executor
        .execute(
            fx.user,
            "create_memory",
            json!({
                "title": "Keep this one",
                "content": "This memory has the highest importance and must survive truncation.",
                "importance": 9,
            }),
        )
        .await
        .unwrap();
    let keep_id = keep["memory"]["id"].as_i64().unwrap();

    fx.executor
        .execute(
            fx.user,
            "create_memory",
            json!({
                "title": "Drop this one",
                "content": "This memory has middling importance and should be truncated away.",
                "importance": 5,
            }),
        )
        .await
        .unwrap();

    fx.executor
        .execute(
            fx.user,
            "create_memory",
            json!({
                "title": "Drop this one too",
                "content": "This memory has the lowest importance and should also be truncated away.",
                "importance": 2,
            }),
        )
        .await
        .unwrap();

    let result = fx
        .executor
        .execute(
            fx.user,
            "query_memory",
            json!({ "query": "whichever memories match", "k": 3, "token_context_threshold": 5 }),
        )
        .await
        .unwrap();

    let primary = result["primary_memories"].as_array().unwrap();
    assert_eq!(primary.len(), 1, "tiny budget should keep exactly one memory, got {primary:?}");
    assert_eq!(primary[0]["id"].as_i64(), Some(keep_id));
    assert!(result["truncated"].as_bool().unwrap());
    assert!(result["linked_memories"].as_array().unwrap().is_empty());
}
