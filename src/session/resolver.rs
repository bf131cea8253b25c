use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, warn};

use super::record::PrivilegedRecord;
use crate::auth::{AuthClient, SessionKey};
use crate::database::models::RecordStatus;
use crate::database::RecordSource;

/// Outcome of checking one session against one area
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<R> {
    Authorized(R),
    Unauthorized(Denial),
    /// The check itself could not be completed; retrying may succeed
    Failed(ResolveError),
}

impl<R> Resolution<R> {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Resolution::Authorized(_))
    }

    pub fn record(&self) -> Option<&R> {
        match self {
            Resolution::Authorized(record) => Some(record),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// No live session, or the auth service no longer recognises it
    NotAuthenticated,
    /// Signed in, but there is no privileged row for the identity
    NotRegistered,
    StatusNotAllowed(RecordStatus),
}

impl Denial {
    pub fn code(&self) -> &'static str {
        match self {
            Denial::NotAuthenticated => "NOT_AUTHENTICATED",
            Denial::NotRegistered | Denial::StatusNotAllowed(_) => "ACCESS_DENIED",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Denial::NotAuthenticated => "Please log in to continue",
            Denial::NotRegistered => "Access denied: this account has no access to this area",
            Denial::StatusNotAllowed(RecordStatus::Suspended) => "Access denied: this account is suspended",
            Denial::StatusNotAllowed(_) => "Access denied: this account is not enabled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("auth service: {0}")]
    Auth(String),

    #[error("record lookup: {0}")]
    Lookup(String),

    #[error("record adapter: {0}")]
    Adapter(String),
}

/// Decides whether a browser session may enter an area.
///
/// Never errors for "not found": missing sessions, identities and rows are all
/// [`Resolution::Unauthorized`]. Only transport, query and adapter failures
/// produce [`Resolution::Failed`]. Resolving has no side effects on the backend,
/// so it is safe to repeat.
#[derive(Clone)]
pub struct SessionResolver {
    auth: AuthClient,
    records: Arc<dyn RecordSource>,
}

impl SessionResolver {
    pub fn new(auth: AuthClient, records: Arc<dyn RecordSource>) -> Self {
        Self { auth, records }
    }

    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    pub async fn resolve<R: PrivilegedRecord>(&self, session: Option<SessionKey>) -> Resolution<R> {
        let policy = R::POLICY;

        let Some(key) = session else {
            return Resolution::Unauthorized(Denial::NotAuthenticated);
        };

        let identity = match self.auth.current_user(key).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                debug!("Session {} has no identity ({} area)", key, policy.area);
                return Resolution::Unauthorized(Denial::NotAuthenticated);
            }
            Err(e) => {
                error!("Failed to load identity for session {}: {}", key, e);
                return Resolution::Failed(ResolveError::Auth(e.to_string()));
            }
        };

        let row = match self.records.find_by_auth_user(policy.table, identity.id).await {
            Ok(Some(row)) => row,
            Ok(None) => {
                warn!("User {} has no {} row, denying {} area", identity.id, policy.table, policy.area);
                return Resolution::Unauthorized(Denial::NotRegistered);
            }
            Err(e) => {
                error!("Failed to look up {} row for user {}: {}", policy.table, identity.id, e);
                return Resolution::Failed(ResolveError::Lookup(e.to_string()));
            }
        };

        let record = match R::from_row(row) {
            Ok(record) => record,
            Err(e) => {
                error!("Unusable {} row for user {}: {}", policy.table, identity.id, e);
                return Resolution::Failed(ResolveError::Adapter(e.to_string()));
            }
        };

        let status = record.status();
        if !policy.allows(status) {
            warn!("User {} has status '{}', denying {} area", identity.id, status, policy.area);
            return Resolution::Unauthorized(Denial::StatusNotAllowed(status));
        }

        debug!("User {} authorized for {} area", identity.id, policy.area);
        Resolution::Authorized(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{AdminRecord, BusinessRecord};
    use crate::testing::{admin_row, business_row, FakeAuth, MemoryRecordSource};
    use serde_json::json;
    use uuid::Uuid;

    struct Fixture {
        auth: AuthClient,
        fake: Arc<FakeAuth>,
        records: Arc<MemoryRecordSource>,
        resolver: SessionResolver,
    }

    fn fixture() -> Fixture {
        let fake = Arc::new(FakeAuth::new());
        let auth = AuthClient::new(fake.clone());
        let records = Arc::new(MemoryRecordSource::new());
        let resolver = SessionResolver::new(auth.clone(), records.clone());
        Fixture { auth, fake, records, resolver }
    }

    async fn sign_in(f: &Fixture, email: &str) -> (SessionKey, Uuid) {
        let identity = f.fake.add_user(email, "password123");
        let (key, _) = f.auth.sign_in_with_password(email, "password123").await.unwrap();
        (key, identity.id)
    }

    #[tokio::test]
    async fn no_session_is_not_authenticated_without_lookup() {
        let f = fixture();

        let admin: Resolution<AdminRecord> = f.resolver.resolve(None).await;
        let business: Resolution<BusinessRecord> = f.resolver.resolve(Some(SessionKey::generate())).await;

        assert_eq!(admin, Resolution::Unauthorized(Denial::NotAuthenticated));
        assert_eq!(business, Resolution::Unauthorized(Denial::NotAuthenticated));
        assert_eq!(f.records.lookups(), 0);
    }

    #[tokio::test]
    async fn identity_without_row_is_not_registered() {
        let f = fixture();
        let (key, _) = sign_in(&f, "u1@caminar.ar").await;

        let outcome: Resolution<AdminRecord> = f.resolver.resolve(Some(key)).await;
        assert_eq!(outcome, Resolution::Unauthorized(Denial::NotRegistered));
        assert_eq!(Denial::NotRegistered.code(), "ACCESS_DENIED");
    }

    #[tokio::test]
    async fn suspended_admin_is_denied() {
        let f = fixture();
        let (key, user) = sign_in(&f, "admin@caminar.ar").await;
        f.records.insert("admin_users", admin_row(user, Some("suspended")));

        let outcome: Resolution<AdminRecord> = f.resolver.resolve(Some(key)).await;
        assert_eq!(
            outcome,
            Resolution::Unauthorized(Denial::StatusNotAllowed(RecordStatus::Suspended))
        );
    }

    #[tokio::test]
    async fn active_admin_is_authorized() {
        let f = fixture();
        let (key, user) = sign_in(&f, "admin@caminar.ar").await;
        f.records.insert("admin_users", admin_row(user, Some("active")));

        let outcome: Resolution<AdminRecord> = f.resolver.resolve(Some(key)).await;
        assert_eq!(outcome.record().map(|r| r.auth_user_id), Some(user));
    }

    #[tokio::test]
    async fn business_status_predicate() {
        for (status, allowed) in [
            (Some("active"), true),
            (Some("pending"), true),
            (Some("suspended"), false),
            (Some("archived"), false),
            (None, false),
        ] {
            let f = fixture();
            let (key, user) = sign_in(&f, "owner@caminar.ar").await;
            f.records.insert("businesses", business_row(user, status));

            let outcome: Resolution<BusinessRecord> = f.resolver.resolve(Some(key)).await;
            assert_eq!(outcome.is_authorized(), allowed, "status {:?}", status);
        }
    }

    #[tokio::test]
    async fn business_row_does_not_open_admin_area() {
        let f = fixture();
        let (key, user) = sign_in(&f, "owner@caminar.ar").await;
        f.records.insert("businesses", business_row(user, Some("active")));

        let outcome: Resolution<AdminRecord> = f.resolver.resolve(Some(key)).await;
        assert_eq!(outcome, Resolution::Unauthorized(Denial::NotRegistered));
    }

    #[tokio::test]
    async fn resolving_twice_gives_the_same_outcome() {
        let f = fixture();
        let (key, user) = sign_in(&f, "owner@caminar.ar").await;
        f.records.insert("businesses", business_row(user, Some("pending")));

        let first: Resolution<BusinessRecord> = f.resolver.resolve(Some(key)).await;
        let second: Resolution<BusinessRecord> = f.resolver.resolve(Some(key)).await;
        assert_eq!(first, second);
        assert!(first.is_authorized());
    }

    #[tokio::test]
    async fn lookup_failure_is_failed_not_denied() {
        let f = fixture();
        let (key, _) = sign_in(&f, "admin@caminar.ar").await;
        f.records.set_failing(true);

        let outcome: Resolution<AdminRecord> = f.resolver.resolve(Some(key)).await;
        assert!(matches!(outcome, Resolution::Failed(ResolveError::Lookup(_))));
    }

    #[tokio::test]
    async fn duplicate_rows_are_a_lookup_failure() {
        let f = fixture();
        let (key, user) = sign_in(&f, "owner@caminar.ar").await;
        f.records.insert("businesses", business_row(user, Some("active")));
        f.records.insert("businesses", business_row(user, Some("active")));

        let outcome: Resolution<BusinessRecord> = f.resolver.resolve(Some(key)).await;
        assert!(matches!(outcome, Resolution::Failed(ResolveError::Lookup(_))));
    }

    #[tokio::test]
    async fn malformed_row_is_adapter_failure() {
        let f = fixture();
        let (key, user) = sign_in(&f, "admin@caminar.ar").await;
        f.records.insert("admin_users", json!({ "auth_user_id": user, "status": "active" }));

        let outcome: Resolution<AdminRecord> = f.resolver.resolve(Some(key)).await;
        assert!(matches!(outcome, Resolution::Failed(ResolveError::Adapter(_))));
    }

    #[tokio::test]
    async fn unreachable_auth_service_is_failed() {
        let f = fixture();
        let (key, _) = sign_in(&f, "admin@caminar.ar").await;
        f.fake.set_unreachable(true);

        let outcome: Resolution<AdminRecord> = f.resolver.resolve(Some(key)).await;
        assert!(matches!(outcome, Resolution::Failed(ResolveError::Auth(_))));
        assert_eq!(f.records.lookups(), 0);
    }
}
