//! The per-tenant user identity (spec §3, §4.I).

use super::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tenant of the store. All domain rows carry a `user_id`; no query ever
/// crosses tenants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub external_subject: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}
