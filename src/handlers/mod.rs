// handlers/mod.rs - Handlers grouped by access tier
//
// public   - no session (catalog, status, sign-in/out)
// admin    - /admin/panel, behind require_admin
// business - /business/dashboard, behind require_business

pub mod admin;
pub mod business;
pub mod public;
