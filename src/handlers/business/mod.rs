// handlers/business/mod.rs - Business dashboard handlers
//
// Behind `require_business`: the caller's own BusinessRecord is in the
// request extensions.

pub mod dashboard;
pub mod profile;
