use serde::Serialize;

use crate::database::models::RecordStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    Admin,
    Business,
}

impl std::fmt::Display for Area {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Area::Admin => f.write_str("admin"),
            Area::Business => f.write_str("business"),
        }
    }
}

/// Who may enter a protected area, and where to send everyone else
#[derive(Debug)]
pub struct AreaPolicy {
    pub area: Area,
    /// Privileged table holding one row per authorized identity
    pub table: &'static str,
    pub allowed: &'static [RecordStatus],
    pub login_route: &'static str,
    pub landing_route: &'static str,
}

impl AreaPolicy {
    /// An unknown status never satisfies any area
    pub fn allows(&self, status: RecordStatus) -> bool {
        status != RecordStatus::Unknown && self.allowed.contains(&status)
    }
}

pub const ADMIN: AreaPolicy = AreaPolicy {
    area: Area::Admin,
    table: "admin_users",
    allowed: &[RecordStatus::Active],
    login_route: "/admin/login",
    landing_route: "/admin/panel",
};

pub const BUSINESS: AreaPolicy = AreaPolicy {
    area: Area::Business,
    table: "businesses",
    allowed: &[RecordStatus::Active, RecordStatus::Pending],
    login_route: "/business/login",
    landing_route: "/business/dashboard",
};
