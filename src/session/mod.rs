//! Session authorization gate and role-scoped contexts.
//!
//! [`SessionResolver`] answers "may this session enter this area?",
//! [`RouteGuard`] turns that answer into a per-request state, and
//! [`ScopedContext`] keeps a live, per-session copy of the privileged record
//! that follows auth-state changes.

pub mod area;
pub mod context;
pub mod guard;
pub mod record;
pub mod registry;
pub mod resolver;

pub use area::{Area, AreaPolicy, ADMIN, BUSINESS};
pub use context::{ContextSnapshot, ScopedContext};
pub use guard::{GuardState, RouteGuard};
pub use record::PrivilegedRecord;
pub use registry::ContextRegistry;
pub use resolver::{Denial, Resolution, ResolveError, SessionResolver};
