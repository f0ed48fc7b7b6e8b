//! Route guard: decides where every navigation lands.
//!
//! DESIGN
//! ======
//! [`decide`] is total: every `(path, GuardState)` pair maps to exactly one
//! [`Decision`], with `Allow` as the fallthrough. It reads nothing but its
//! arguments, so identical inputs always give identical outputs. Callers that
//! want the final landing page use [`resolve`], which follows redirects.
//!
//! Admin namespace rules, in order:
//! 1. `/admin/login` bounces an already signed-in admin to the dashboard.
//! 2. Any other admin page needs an admin session.
//! 3. Lecturers only see lectures, dashboard and profile.
//! 4. Pages that declare `SUPER_ADMIN` send everyone else to the dashboard.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use super::{
    ADMIN_DASHBOARD, ADMIN_KNOWLEDGE, ADMIN_LECTURES, ADMIN_LOGIN, ADMIN_PROFILE, CHAT, LOGIN, Navigator, ROOT,
    is_admin_path, normalize_path,
};
use crate::session::{Role, Scope, SessionState};

/// Upper bound on redirects followed by [`resolve`].
const MAX_REDIRECTS: usize = 8;

/// Pages a lecturer may open.
const LECTURER_ALLOWED: [&str; 3] = [ADMIN_LECTURES, ADMIN_DASHBOARD, ADMIN_PROFILE];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(String),
}

impl Decision {
    fn redirect(path: &str) -> Self {
        Self::Redirect(path.to_owned())
    }
}

/// Session facts the guard needs. Snapshotted per navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuardState {
    pub user_authenticated: bool,
    pub admin_authenticated: bool,
    /// Role from the stored admin identity. `None` when unknown.
    pub admin_role: Option<Role>,
}

impl GuardState {
    #[must_use]
    pub fn signed_out() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn user() -> Self {
        Self { user_authenticated: true, ..Self::default() }
    }

    #[must_use]
    pub fn admin(role: Role) -> Self {
        Self { admin_authenticated: true, admin_role: Some(role), ..Self::default() }
    }

    /// Snapshot the current sessions.
    #[must_use]
    pub fn from_sessions(sessions: &SessionState) -> Self {
        Self {
            user_authenticated: sessions.is_authenticated(Scope::User),
            admin_authenticated: sessions.is_authenticated(Scope::Admin),
            admin_role: sessions.identity(Scope::Admin).map(|identity| identity.role),
        }
    }
}

/// Per-route requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteMeta {
    pub requires_auth: bool,
    pub requires_admin_auth: bool,
    pub roles: &'static [Role],
}

const SUPER_ADMIN_ONLY: &[Role] = &[Role::SuperAdmin];

/// Requirements declared by the route table for `path`.
#[must_use]
pub fn route_meta(path: &str) -> RouteMeta {
    let path = normalize_path(path);
    match path {
        CHAT => RouteMeta { requires_auth: true, ..RouteMeta::default() },
        ADMIN_LOGIN => RouteMeta::default(),
        ADMIN_KNOWLEDGE => RouteMeta { requires_admin_auth: true, roles: SUPER_ADMIN_ONLY, ..RouteMeta::default() },
        p if is_admin_path(p) => RouteMeta { requires_admin_auth: true, ..RouteMeta::default() },
        _ => RouteMeta::default(),
    }
}

/// Decide the outcome of navigating to `target`.
#[must_use]
pub fn decide(target: &str, state: &GuardState) -> Decision {
    let path = normalize_path(target);
    if is_admin_path(path) {
        decide_admin(path, state)
    } else {
        decide_user(path, state)
    }
}

fn decide_admin(path: &str, state: &GuardState) -> Decision {
    if path == ADMIN_LOGIN {
        return if state.admin_authenticated { Decision::redirect(ADMIN_DASHBOARD) } else { Decision::Allow };
    }
    if !state.admin_authenticated {
        return Decision::redirect(ADMIN_LOGIN);
    }

    let meta = route_meta(path);
    match state.admin_role {
        Some(Role::Lecturer) => {
            if !LECTURER_ALLOWED.contains(&path) {
                return Decision::redirect(ADMIN_LECTURES);
            }
        }
        Some(Role::SuperAdmin) => {}
        _ => {
            if meta.roles.contains(&Role::SuperAdmin) {
                return Decision::redirect(ADMIN_DASHBOARD);
            }
        }
    }
    Decision::Allow
}

fn decide_user(path: &str, state: &GuardState) -> Decision {
    if path == ROOT {
        return Decision::redirect(LOGIN);
    }
    let meta = route_meta(path);
    if meta.requires_auth && !state.user_authenticated {
        return Decision::redirect(LOGIN);
    }
    if path == LOGIN && state.user_authenticated {
        return Decision::redirect(CHAT);
    }
    Decision::Allow
}

/// Follow redirects from `target` until a page is allowed.
///
/// Stops after a fixed number of hops and returns the last target reached.
#[must_use]
pub fn resolve(target: &str, state: &GuardState) -> String {
    let mut current = target.to_owned();
    for _ in 0..MAX_REDIRECTS {
        match decide(&current, state) {
            Decision::Allow => return current,
            Decision::Redirect(next) => {
                if next == current {
                    return current;
                }
                current = next;
            }
        }
    }
    tracing::warn!(%target, landed = %current, "redirect limit reached");
    current
}

/// Navigate to `target` through the guard. Returns the page actually shown.
pub fn navigate_guarded(navigator: &dyn Navigator, sessions: &SessionState, target: &str) -> String {
    let state = GuardState::from_sessions(sessions);
    let landed = resolve(target, &state);
    if landed != target {
        tracing::debug!(%target, %landed, "navigation redirected");
    }
    navigator.push(&landed);
    landed
}
