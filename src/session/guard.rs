use super::area::AreaPolicy;
use super::record::PrivilegedRecord;
use super::resolver::{Denial, Resolution, ResolveError, SessionResolver};
use crate::auth::SessionKey;

#[derive(Debug, Clone, PartialEq)]
pub enum GuardState<R> {
    /// Resolver call in flight; nothing protected is shown
    Resolving,
    Authorized(R),
    Unauthorized {
        redirect_to: &'static str,
        denial: Denial,
    },
    /// Could not decide; fail closed
    Failed(ResolveError),
}

/// Per-request gate in front of a protected area.
///
/// The only transitions are `Resolving -> {Authorized, Unauthorized, Failed}` on
/// resolver completion, and back to `Resolving` on [`RouteGuard::reset`].
#[derive(Debug, Clone)]
pub struct RouteGuard<R: PrivilegedRecord> {
    state: GuardState<R>,
}

impl<R: PrivilegedRecord> Default for RouteGuard<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: PrivilegedRecord> RouteGuard<R> {
    pub fn new() -> Self {
        Self {
            state: GuardState::Resolving,
        }
    }

    pub fn policy(&self) -> &'static AreaPolicy {
        R::POLICY
    }

    pub fn state(&self) -> &GuardState<R> {
        &self.state
    }

    pub fn into_state(self) -> GuardState<R> {
        self.state
    }

    pub fn apply(&mut self, resolution: Resolution<R>) {
        self.state = match resolution {
            Resolution::Authorized(record) => GuardState::Authorized(record),
            Resolution::Unauthorized(denial) => GuardState::Unauthorized {
                redirect_to: R::POLICY.login_route,
                denial,
            },
            Resolution::Failed(err) => GuardState::Failed(err),
        };
    }

    /// Start over, e.g. after an auth-state change
    pub fn reset(&mut self) {
        self.state = GuardState::Resolving;
    }

    /// Run one resolution for `session` and settle the guard on its outcome
    pub async fn evaluate(resolver: &SessionResolver, session: Option<SessionKey>) -> Self {
        let mut guard = Self::new();
        guard.apply(resolver.resolve::<R>(session).await);
        guard
    }
}
