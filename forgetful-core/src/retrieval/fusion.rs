//! Reciprocal rank fusion across multiple ranked candidate lists.

use crate::constants::RRF_K;
use crate::storage::ScoredMemory;
use crate::types::Id;
use std::collections::HashMap;

/// Fuse several independently ranked candidate lists (e.g. dense + lexical)
/// into a single ranking using reciprocal rank fusion:
/// `score(d) = sum over lists containing d of 1 / (RRF_K + rank(d))`, with
/// `rank` 1-indexed. Memories absent from a list simply don't contribute a
/// term for it. The fused score replaces each memory's original score in
/// the returned [`ScoredMemory`]; callers should not compare it against raw
/// cosine similarity.
#[must_use]
pub fn reciprocal_rank_fusion(lists: &[Vec<ScoredMemory>]) -> Vec<ScoredMemory> {
    let mut scores: HashMap<Id, f64> = HashMap::new();
    let mut memories: HashMap<Id, &ScoredMemory> = HashMap::new();

    for list in lists {
        for (rank, scored) in list.iter().enumerate() {
            let id = scored.memory.id;
            *scores.entry(id).or_insert(0.0) += 1.0 / (RRF_K + (rank + 1) as f64);
            memories.entry(id).or_insert(scored);
        }
    }

    let mut fused: Vec<ScoredMemory> = scores
        .into_iter()
        .map(|(id, score)| ScoredMemory {
            memory: memories[&id].memory.clone(),
            score: score as f32,
        })
        .collect();

    fused.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    fused
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn scored(id: i64, score: f32) -> ScoredMemory {
        ScoredMemory {
            memory: crate::types::Memory {
                id,
                user_id: Uuid::nil(),
                title: "t".to_string(),
                content: "c".to_string(),
                context: String::new(),
                keywords: vec![],
                tags: vec![],
                importance: 5,
                project_ids: vec![],
                code_artifact_ids: vec![],
                document_ids: vec![],
                entity_ids: vec![],
                embedding: vec![],
                is_obsolete: false,
                obsolete_reason: None,
                superseded_by: None,
                obsoleted_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                linked_memory_ids: vec![],
            },
            score,
        }
    }

    #[test]
    fn memory_ranked_first_in_both_lists_wins() {
        let dense = vec![scored(1, 0.9), scored(2, 0.8)];
        let lexical = vec![scored(1, 10.0), scored(3, 9.0)];
        let fused = reciprocal_rank_fusion(&[dense, lexical]);
        assert_eq!(fused[0].memory.id, 1);
    }

    #[test]
    fn single_list_preserves_relative_order() {
        let dense = vec![scored(1, 0.9), scored(2, 0.5), scored(3, 0.1)];
        let fused = reciprocal_rank_fusion(&[dense]);
        let order: Vec<i64> = fused.iter().map(|s| s.memory.id).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn empty_lists_produce_empty_result() {
        let fused = reciprocal_rank_fusion(&[]);
        assert!(fused.is_empty());
    }
}
