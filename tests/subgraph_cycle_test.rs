//! `get_subgraph` BFS must terminate and never revisit a node even when
//! the link graph contains a cycle (spec §4.F).

mod common;

use forgetful_core::config::Config;
use forgetful_core::tools::ToolExecutor;
use serde_json::json;

#[tokio::test]
async fn traversal_over_a_three_cycle_visits_each_node_once() {
    let mut config = Config::default();
    config.memory.num_auto_link = 0;
    let fx = common::build_with_config(config).await;

    let mut ids = Vec::new();
    for title in ["A", "B", "C"] {
        let created = fx
            .executor
            .execute(fx.user, "create_memory", json!({ "title": title, "content": format!("Memory {title}.") }))
            .await
            .unwrap();
        ids.push(created["memory"]["id"].as_i64().unwrap());
    }
    let (a, b, c) = (ids[0], ids[1], ids[2]);

    for (source, target) in [(a, b), (b, c), (c, a)] {
        fx.executor
            .execute(fx.user, "link_memories", json!({ "memory_id": source, "related_ids": [target] }))
            .await
            .unwrap();
    }

    let result = fx
        .executor
        .execute(
            fx.user,
            "get_subgraph",
            json!({ "center_node_id": format!("memory_{a}"), "depth": 3, "max_nodes": 100 }),
        )
        .await
        .unwrap();

    let nodes = result["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 3, "cycle must not cause a node to be visited twice, got {nodes:?}");

    let edges = result["edges"].as_array().unwrap();
    assert_eq!(edges.len(), 3, "all three cycle edges should be present exactly once, got {edges:?}");

    assert!(!result["truncated"].as_bool().unwrap());
}
