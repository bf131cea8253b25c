use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::area::{AreaPolicy, ADMIN, BUSINESS};
use crate::database::models::{AdapterError, AdminRecord, BusinessRecord, RecordStatus};

/// A row that grants its auth identity access to one protected area
pub trait PrivilegedRecord: Clone + std::fmt::Debug + Send + Sync + Serialize + 'static {
    const POLICY: &'static AreaPolicy;

    fn from_row(row: Value) -> Result<Self, AdapterError>;

    fn status(&self) -> RecordStatus;

    fn auth_user_id(&self) -> Option<Uuid>;
}

impl PrivilegedRecord for AdminRecord {
    const POLICY: &'static AreaPolicy = &ADMIN;

    fn from_row(row: Value) -> Result<Self, AdapterError> {
        AdminRecord::from_row(row)
    }

    fn status(&self) -> RecordStatus {
        self.status
    }

    fn auth_user_id(&self) -> Option<Uuid> {
        Some(self.auth_user_id)
    }
}

impl PrivilegedRecord for BusinessRecord {
    const POLICY: &'static AreaPolicy = &BUSINESS;

    fn from_row(row: Value) -> Result<Self, AdapterError> {
        BusinessRecord::from_row(row)
    }

    fn status(&self) -> RecordStatus {
        self.status
    }

    fn auth_user_id(&self) -> Option<Uuid> {
        self.auth_user_id
    }
}
