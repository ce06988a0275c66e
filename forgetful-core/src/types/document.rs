//! Documents: larger bodies of reference material a small memory can point
//! to, keeping memories themselves atomic (spec §3).

use super::{Id, UserId};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Id,
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    pub source_url: Option<String>,
    pub project_ids: Vec<Id>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentCreate {
    pub title: String,
    pub content: String,
    pub source_url: Option<String>,
    #[serde(default)]
    pub project_ids: Vec<Id>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub source_url: Option<String>,
    pub project_ids: Option<Vec<Id>>,
}

/// Validate a [`DocumentCreate`].
///
/// # Errors
///
/// Returns [`Error::Validation`] if `title` or `content` is empty.
pub fn validate_create(data: &DocumentCreate) -> Result<()> {
    if data.title.trim().is_empty() {
        return Err(Error::validation("title", "must not be empty"));
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
    fn rejects_empty_content() {
        let data = DocumentCreate {
            title: "Title".to_string(),
            content: String::new(),
            source_url: None,
            project_ids: vec![],
        };
        assert!(validate_create(&data).is_err());
    }
}
