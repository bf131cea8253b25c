// handlers/admin/mod.rs - Admin panel handlers
//
// Everything here sits behind `require_admin`, so the request extensions
// always carry the caller's AdminRecord and SessionKey.

pub mod businesses;
pub mod dashboard;
pub mod places;
