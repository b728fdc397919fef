// Session guard
//
// One parameterized decision table for every page that waits on the session
// provider and then renders or redirects.
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const SIGN_IN_PATH: &str = "/auth/signin";
pub const UNAUTHORIZED_PATH: &str = "/auth/unauthorized";
pub const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Operator,
    Viewer,
}

/// What the session provider currently reports
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub loading: bool,
    pub authenticated: bool,
    /// `None` while the user profile has not been fetched
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardAction {
    /// Keep showing the loading screen
    Wait,
    Render,
    Redirect(String),
}

#[derive(Debug, Clone)]
pub struct SessionGuard {
    pub required_roles: Vec<Role>,
    pub redirect_to: String,
    pub unauthorized_to: String,
    /// Where authenticated users go; `None` renders the guarded page
    pub authenticated_to: Option<String>,
    /// Give up waiting on the session provider after this long
    pub redirect_timeout: Option<Duration>,
}

impl Default for SessionGuard {
    fn default() -> Self {
        Self {
            required_roles: Vec::new(),
            redirect_to: SIGN_IN_PATH.to_string(),
            unauthorized_to: UNAUTHORIZED_PATH.to_string(),
            authenticated_to: None,
            redirect_timeout: None,
        }
    }
}

impl SessionGuard {
    pub fn with_roles(roles: &[Role]) -> Self {
        Self {
            required_roles: roles.to_vec(),
            ..Self::default()
        }
    }

    pub fn admin() -> Self {
        Self::with_roles(&[Role::Admin])
    }

    pub fn operator() -> Self {
        Self::with_roles(&[Role::Admin, Role::Operator])
    }

    pub fn viewer() -> Self {
        Self::with_roles(&[Role::Admin, Role::Operator, Role::Viewer])
    }

    /// Landing page: always leaves, to the dashboard or to sign-in
    pub fn home() -> Self {
        Self {
            authenticated_to: Some(DASHBOARD_PATH.to_string()),
            ..Self::default()
        }
    }

    pub fn with_redirect_timeout(mut self, timeout: Duration) -> Self {
        self.redirect_timeout = Some(timeout);
        self
    }

    /// Decide what to do given the session state and how long it has been loading
    pub fn evaluate(&self, session: &SessionSnapshot, loading_for: Duration) -> GuardAction {
        if session.loading {
            return match self.redirect_timeout {
                Some(limit) if loading_for >= limit => {
                    tracing::warn!(
                        target: "guard",
                        waited_ms = loading_for.as_millis() as u64,
                        "Session still loading; forcing redirect"
                    );
                    GuardAction::Redirect(self.redirect_to.clone())
                }
                _ => GuardAction::Wait,
            };
        }

        if !session.authenticated {
            return GuardAction::Redirect(self.redirect_to.clone());
        }

        // Role check only once the profile is known
        if !self.required_roles.is_empty() {
            if let Some(role) = session.role {
                if !self.required_roles.contains(&role) {
                    return GuardAction::Redirect(self.unauthorized_to.clone());
                }
            }
        }

        match &self.authenticated_to {
            Some(path) => GuardAction::Redirect(path.clone()),
            None => GuardAction::Render,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_in(role: Option<Role>) -> SessionSnapshot {
        SessionSnapshot {
            loading: false,
            authenticated: true,
            role,
        }
    }

    #[test]
    fn waits_while_loading() {
        let guard = SessionGuard::default();
        let loading = SessionSnapshot {
            loading: true,
            ..Default::default()
        };
        assert_eq!(guard.evaluate(&loading, Duration::from_secs(60)), GuardAction::Wait);
    }

    #[test]
    fn forces_redirect_after_timeout() {
        let guard = SessionGuard::default().with_redirect_timeout(Duration::from_secs(5));
        let loading = SessionSnapshot {
            loading: true,
            ..Default::default()
        };
        assert_eq!(guard.evaluate(&loading, Duration::from_secs(4)), GuardAction::Wait);
        assert_eq!(
            guard.evaluate(&loading, Duration::from_secs(5)),
            GuardAction::Redirect(SIGN_IN_PATH.into())
        );
    }

    #[test]
    fn anonymous_goes_to_sign_in() {
        let guard = SessionGuard::admin();
        assert_eq!(
            guard.evaluate(&SessionSnapshot::default(), Duration::ZERO),
            GuardAction::Redirect(SIGN_IN_PATH.into())
        );
    }

    #[test]
    fn role_requirements() {
        let guard = SessionGuard::operator();
        assert_eq!(
            guard.evaluate(&signed_in(Some(Role::Viewer)), Duration::ZERO),
            GuardAction::Redirect(UNAUTHORIZED_PATH.into())
        );
        assert_eq!(
            guard.evaluate(&signed_in(Some(Role::Operator)), Duration::ZERO),
            GuardAction::Render
        );
        // Profile not fetched yet
        assert_eq!(
            guard.evaluate(&signed_in(None), Duration::ZERO),
            GuardAction::Render
        );
    }

    #[test]
    fn home_routes_by_session() {
        let guard = SessionGuard::home();
        assert_eq!(
            guard.evaluate(&signed_in(Some(Role::Viewer)), Duration::ZERO),
            GuardAction::Redirect(DASHBOARD_PATH.into())
        );
        assert_eq!(
            guard.evaluate(&SessionSnapshot::default(), Duration::ZERO),
            GuardAction::Redirect(SIGN_IN_PATH.into())
        );
    }
}
