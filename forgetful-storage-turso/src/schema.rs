//! SQL schema for the libsql/Turso backend.
//!
//! `embedding` is stored twice: `embedding_json` is the canonical value
//! returned to callers, `embedding` is an `F32_BLOB` column kept in sync on
//! every write purely to back the `libsql_vector_idx` ANN index used by
//! [`crate::memories::semantic_search`].

/// Build the full set of `CREATE TABLE IF NOT EXISTS` / `CREATE INDEX IF NOT
/// EXISTS` statements for a given embedding dimension.
pub(crate) fn ddl_statements(dimensions: usize) -> Vec<String> {
    vec![
        format!(
            "CREATE TABLE IF NOT EXISTS memories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                context TEXT NOT NULL,
                keywords_json TEXT NOT NULL DEFAULT '[]',
                tags_json TEXT NOT NULL DEFAULT '[]',
                importance INTEGER NOT NULL,
                embedding_json TEXT NOT NULL DEFAULT '[]',
                embedding F32_BLOB({dimensions}),
                is_obsolete INTEGER NOT NULL DEFAULT 0,
                obsolete_reason TEXT,
                superseded_by INTEGER,
                obsoleted_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )"
        ),
        "CREATE INDEX IF NOT EXISTS memories_user_idx ON memories(user_id)".to_string(),
        "CREATE INDEX IF NOT EXISTS memories_user_obsolete_idx ON memories(user_id, is_obsolete)".to_string(),
        "CREATE INDEX IF NOT EXISTS memories_embedding_idx ON memories(libsql_vector_idx(embedding))".to_string(),
        "CREATE TABLE IF NOT EXISTS memory_links (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            source_id INTEGER NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
            target_id INTEGER NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL,
            UNIQUE(source_id, target_id)
        )"
        .to_string(),
        "CREATE INDEX IF NOT EXISTS memory_links_source_idx ON memory_links(source_id)".to_string(),
        "CREATE INDEX IF NOT EXISTS memory_links_target_idx ON memory_links(target_id)".to_string(),
        "CREATE TABLE IF NOT EXISTS projects (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )"
        .to_string(),
        "CREATE INDEX IF NOT EXISTS projects_user_idx ON projects(user_id)".to_string(),
        "CREATE TABLE IF NOT EXISTS documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            source_url TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )"
        .to_string(),
        "CREATE INDEX IF NOT EXISTS documents_user_idx ON documents(user_id)".to_string(),
        "CREATE TABLE IF NOT EXISTS code_artifacts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            language TEXT,
            content TEXT NOT NULL,
            file_path TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )"
        .to_string(),
        "CREATE INDEX IF NOT EXISTS code_artifacts_user_idx ON code_artifacts(user_id)".to_string(),
        "CREATE TABLE IF NOT EXISTS entities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            custom_type TEXT,
            aka_json TEXT NOT NULL DEFAULT '[]',
            description TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )"
        .to_string(),
        "CREATE INDEX IF NOT EXISTS entities_user_idx ON entities(user_id)".to_string(),
        "CREATE TABLE IF NOT EXISTS entity_relationships (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            source_entity_id INTEGER NOT NULL REFERENCES entities(id) ON DELETE CASCADE,
            target_entity_id INTEGER NOT NULL REFERENCES entities(id) ON DELETE CASCADE,
            relationship_type TEXT NOT NULL,
            strength REAL,
            confidence REAL,
            metadata_json TEXT NOT NULL DEFAULT 'null',
            created_at TEXT NOT NULL,
            UNIQUE(source_entity_id, target_entity_id, relationship_type)
        )"
        .to_string(),
        // -- junction tables for the M:N associations that the embedded
        // backend inlines as Vec<Id> fields --
        "CREATE TABLE IF NOT EXISTS memory_projects (
            memory_id INTEGER NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
            project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            PRIMARY KEY (memory_id, project_id)
        )"
        .to_string(),
        "CREATE TABLE IF NOT EXISTS memory_documents (
            memory_id INTEGER NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
            document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
            PRIMARY KEY (memory_id, document_id)
        )"
        .to_string(),
        "CREATE TABLE IF NOT EXISTS memory_code_artifacts (
            memory_id INTEGER NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
            code_artifact_id INTEGER NOT NULL REFERENCES code_artifacts(id) ON DELETE CASCADE,
            PRIMARY KEY (memory_id, code_artifact_id)
        )"
        .to_string(),
        "CREATE TABLE IF NOT EXISTS memory_entities (
            memory_id INTEGER NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
            entity_id INTEGER NOT NULL REFERENCES entities(id) ON DELETE CASCADE,
            PRIMARY KEY (memory_id, entity_id)
        )"
        .to_string(),
        "CREATE TABLE IF NOT EXISTS document_projects (
            document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
            project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            PRIMARY KEY (document_id, project_id)
        )"
        .to_string(),
        "CREATE TABLE IF NOT EXISTS code_artifact_projects (
            code_artifact_id INTEGER NOT NULL REFERENCES code_artifacts(id) ON DELETE CASCADE,
            project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            PRIMARY KEY (code_artifact_id, project_id)
        )"
        .to_string(),
    ]
}
