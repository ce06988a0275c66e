//! Query composition: two-stage token-budget-aware truncation of primary
//! and linked memories (spec §4.G).

use crate::token_counter::TokenCounter;
use crate::types::memory::token_counting_text;
use crate::types::{LinkedMemory, Memory};

/// Deterministic ordering: importance descending, then `created_at`
/// ascending, then `id` ascending. The source prototype sorts by importance
/// alone, which leaves ties unordered; this refinement makes truncation
/// reproducible across runs without changing which memories are kept when
/// importances differ.
fn sort_key(memory: &Memory) -> (std::cmp::Reverse<u8>, chrono::DateTime<chrono::Utc>, i64) {
    (std::cmp::Reverse(memory.importance), memory.created_at, memory.id)
}

/// Sort `memories` by importance descending, cap at `max_count`, then greedily
/// accumulate until the next item would exceed `max_tokens`.
///
/// Returns `(selected, token_count, truncated)`. `truncated` reflects only
/// the token-budget walk stopping early; the initial `max_count` slice does
/// not by itself set it (matches the source prototype's
/// `truncate_memories_by_budget`, which only reports truncation on the
/// token-walk early-stop).
fn truncate_by_budget(
    mut memories: Vec<Memory>,
    max_tokens: usize,
    max_count: usize,
    counter: &TokenCounter,
) -> (Vec<Memory>, usize, bool) {
    if memories.is_empty() {
        return (Vec::new(), 0, false);
    }

    memories.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
    memories.truncate(max_count);

    let mut selected = Vec::with_capacity(memories.len());
    let mut running_total = 0usize;
    let mut budget_truncated = false;

    for memory in memories {
        let tokens = counter.count_cached(&token_counting_text(&memory));
        if running_total + tokens > max_tokens {
            // A single memory that alone exceeds the budget is still
            // returned when it is the first candidate (spec invariant: the
            // one-memory case may legitimately exceed token_context_threshold,
            // but no further memory may be added beyond it).
            if selected.is_empty() {
                running_total += tokens;
                selected.push(memory);
            }
            budget_truncated = true;
            break;
        }
        running_total += tokens;
        selected.push(memory);
    }

    (selected, running_total, budget_truncated)
}

/// Result of composing a primary+linked result set under a token budget.
pub struct ComposedResult {
    pub primary: Vec<Memory>,
    pub linked: Vec<LinkedMemory>,
    pub token_count: usize,
    pub truncated: bool,
}

/// Apply the two-stage token budget: primary memories are truncated first;
/// if that stage itself truncated, linked memories are dropped entirely
/// (the prototype's behavior — partial primaries never make room for
/// linked context). Otherwise linked memories fill the remaining budget.
#[must_use]
pub fn apply_token_budget(
    primary: Vec<Memory>,
    linked: Vec<LinkedMemory>,
    max_tokens: usize,
    max_memories: usize,
    counter: &TokenCounter,
) -> ComposedResult {
    let (primary_selected, primary_tokens, primary_truncated) =
        truncate_by_budget(primary, max_tokens, max_memories, counter);

    if primary_truncated {
        return ComposedResult {
            primary: primary_selected,
            linked: Vec::new(),
            token_count: primary_tokens,
            truncated: true,
        };
    }

    let remaining_tokens = max_tokens.saturating_sub(primary_tokens);
    let remaining_count = max_memories.saturating_sub(primary_selected.len());

    let linked_memories_only: Vec<Memory> = linked.iter().map(|l| l.memory.clone()).collect();
    let (linked_selected_memories, linked_tokens, linked_truncated) =
        truncate_by_budget(linked_memories_only, remaining_tokens, remaining_count, counter);

    let selected_ids: std::collections::HashSet<crate::types::Id> =
        linked_selected_memories.iter().map(|m| m.id).collect();
    let linked_selected: Vec<LinkedMemory> = linked
        .into_iter()
        .filter(|l| selected_ids.contains(&l.memory.id))
        .collect();

    ComposedResult {
        primary: primary_selected,
        linked: linked_selected,
        token_count: primary_tokens + linked_tokens,
        truncated: linked_truncated,
    }
}

/// Deduplicate linked memories that surfaced from more than one primary and
/// exclude any that coincide with a primary memory, keeping the first
/// `link_source_id` attribution seen (spec §4.G "seen_ids" behavior).
#[must_use]
pub fn dedupe_linked(
    primary: &[Memory],
    candidates: Vec<(crate::types::Id, Memory)>,
) -> Vec<LinkedMemory> {
    let mut seen: std::collections::HashSet<crate::types::Id> =
        primary.iter().map(|m| m.id).collect();
    let mut out = Vec::new();
    for (link_source_id, memory) in candidates {
        if seen.contains(&memory.id) {
            continue;
        }
        seen.insert(memory.id);
        out.push(LinkedMemory {
            memory,
            link_source_id,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn memory(id: i64, importance: u8) -> Memory {
        Memory {
            id,
            user_id: Uuid::nil(),
            title: "t".repeat(10),
            content: "content ".repeat(50),
            context: String::new(),
            keywords: vec![],
            tags: vec![],
            importance,
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
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let counter = TokenCounter::default();
        let (selected, tokens, truncated) = truncate_by_budget(vec![], 100, 10, &counter);
        assert!(selected.is_empty());
        assert_eq!(tokens, 0);
        assert!(!truncated);
    }

    #[test]
    fn higher_importance_kept_first_under_tight_budget() {
        let counter = TokenCounter::default();
        let memories = vec![memory(1, 3), memory(2, 9)];
        let (selected, _, truncated) = truncate_by_budget(memories, 20, 10, &counter);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, 2);
        assert!(truncated);
    }

    #[test]
    fn count_cap_alone_does_not_set_truncated() {
        let counter = TokenCounter::default();
        let memories = vec![memory(1, 5), memory(2, 6), memory(3, 7)];
        let (selected, _, truncated) = truncate_by_budget(memories, 1_000_000, 2, &counter);
        assert_eq!(selected.len(), 2);
        assert!(!truncated, "count cap alone, with ample token budget, should not set truncated");
    }

    #[test]
    fn primary_truncation_drops_all_linked() {
        let counter = TokenCounter::default();
        let primary = vec![memory(1, 9), memory(2, 8)];
        let linked = vec![LinkedMemory {
            memory: memory(3, 10),
            link_source_id: 1,
        }];
        let result = apply_token_budget(primary, linked, 20, 10, &counter);
        assert!(result.truncated);
        assert!(result.linked.is_empty());
    }

    #[test]
    fn dedupe_linked_excludes_primary_and_duplicate_targets() {
        let primary = vec![memory(1, 9)];
        let candidates = vec![(1, memory(1, 9)), (1, memory(2, 8)), (2, memory(2, 8))];
        let linked = dedupe_linked(&primary, candidates);
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].memory.id, 2);
        assert_eq!(linked[0].link_source_id, 1);
    }
}
