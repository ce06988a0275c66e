//! Code artifacts: named source-code fragments memories can reference
//! (spec §3) — e.g. a function, config block, or script worth recalling
//! verbatim rather than paraphrasing into memory content.

use super::{Id, UserId};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeArtifact {
    pub id: Id,
    pub user_id: UserId,
    pub name: String,
    pub language: Option<String>,
    pub content: String,
    pub file_path: Option<String>,
    pub project_ids: Vec<Id>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeArtifactCreate {
    pub name: String,
    pub language: Option<String>,
    pub content: String,
    pub file_path: Option<String>,
    #[serde(default)]
    pub project_ids: Vec<Id>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeArtifactUpdate {
    pub name: Option<String>,
    pub language: Option<String>,
    pub content: Option<String>,
    pub file_path: Option<String>,
    pub project_ids: Option<Vec<Id>>,
}

/// Validate a [`CodeArtifactCreate`].
///
/// # Errors
///
/// Returns [`Error::Validation`] if `name` or `content` is empty.
pub fn validate_create(data: &CodeArtifactCreate) -> Result<()> {
    if data.name.trim().is_empty() {
        return Err(Error::validation("name", "must not be empty"));
    }
    if data.content.trim().is_empty() {
        return Err(Error::validation("content", "must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_name() {
        let data = CodeArtifactCreate {
            name: String::new(),
            language: Some("rust".to_string()),
            content: "fn main() {}".to_string(),
            file_path: None,
            project_ids: vec![],
        };
        assert!(validate_create(&data).is_err());
    }
}
