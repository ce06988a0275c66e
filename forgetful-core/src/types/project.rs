//! Projects: named groupings that memories, documents, and code artifacts
//! can be scoped to (spec §3).

use super::{Id, UserId};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Id,
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectCreate {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Validate a [`ProjectCreate`].
///
/// # Errors
///
/// Returns [`Error::Validation`] if `name` is empty.
pub fn validate_create(data: &ProjectCreate) -> Result<()> {
    if data.name.trim().is_empty() {
        return Err(Error::validation("name", "must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_name() {
        let data = ProjectCreate {
            name: String::new(),
            description: None,
        };
        assert!(validate_create(&data).is_err());
    }
}
