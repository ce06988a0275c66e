//! Validation and budget constants.
//!
//! Most of these mirror request-overridable defaults in [`crate::config::Config`];
//! they exist as `const` fallbacks for call sites (tests, doctests) that don't
//! thread a `Config` through.

/// Maximum length of a memory title (must be "easily scannable").
pub const MEMORY_TITLE_MAX_LEN: usize = 200;

/// Maximum length of a memory's content body (~300-400 words, one concept).
pub const MEMORY_CONTENT_MAX_LEN: usize = 2_000;

/// Maximum length of a memory's context field.
pub const MEMORY_CONTEXT_MAX_LEN: usize = 500;

/// Maximum number of keywords per memory.
pub const MEMORY_KEYWORDS_MAX_COUNT: usize = 10;

/// Maximum number of tags per memory.
pub const MEMORY_TAGS_MAX_COUNT: usize = 10;

/// Default token budget for a single `query_memory` call.
pub const DEFAULT_TOKEN_BUDGET: usize = 8_000;

/// Default cap on the total number of memories (primary + linked) returned
/// by a single query.
pub const DEFAULT_MAX_MEMORIES: usize = 20;

/// Default number of nearest neighbors to auto-link on memory creation.
pub const DEFAULT_NUM_AUTO_LINK: usize = 3;

/// Reciprocal rank fusion constant (spec Open Question #2: not
/// parameterized in the source prototype).
pub const RRF_K: f64 = 60.0;

/// Default fan-out multiplier for dense-stage candidate retrieval ahead of
/// optional lexical fusion / rerank.
pub const DEFAULT_K_FANOUT: usize = 4;

/// Minimum/maximum bounds for graph traversal depth.
pub const GRAPH_DEPTH_MIN: u8 = 1;
pub const GRAPH_DEPTH_MAX: u8 = 3;

/// Minimum/maximum bounds for graph traversal node cap.
pub const GRAPH_MAX_NODES_MIN: usize = 1;
pub const GRAPH_MAX_NODES_MAX: usize = 500;

/// Default page size for the re-embed orchestrator's batch loop.
pub const DEFAULT_REEMBED_BATCH_SIZE: usize = 20;

/// Default pagination page size / hard cap for HTTP list endpoints.
pub const DEFAULT_PAGE_LIMIT: usize = 20;
pub const MAX_PAGE_LIMIT: usize = 100;
