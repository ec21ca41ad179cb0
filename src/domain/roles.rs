use super::require_text;
use crate::error::{ParksError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub permissions: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleInput {
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "empty_permissions")]
    pub permissions: serde_json::Value,
}

fn empty_permissions() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl RoleInput {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        if !self.permissions.is_object() {
            return Err(ParksError::validation("permissions must be a JSON object"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRole {
    pub user_id: String,
    pub role_id: i64,
    pub role_name: String,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleAssignment {
    pub role_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PermissionQuery {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionCheck {
    pub path: String,
    pub granted: bool,
}
