use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{from_row_value, AdapterError, RecordStatus};

/// Row of `admin_users`, bound to an auth identity through `auth_user_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminRecord {
    pub id: Uuid,
    pub auth_user_id: Uuid,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default, alias = "full_name")]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl AdminRecord {
    pub fn from_row(row: Value) -> Result<Self, AdapterError> {
        from_row_value("admin_users", row)
    }
}
