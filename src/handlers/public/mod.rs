// handlers/public/mod.rs - Public handlers (no session required)
//
// Catalog reads, service status, and the endpoints that open or close a session.

pub mod auth;
pub mod catalog;
pub mod status;
