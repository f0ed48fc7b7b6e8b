//! Navigation: the route table, the pure route guard, and the navigator port.
//!
//! DESIGN
//! ======
//! The guard is a pure function of `(target, GuardState)`. Anything that
//! touches the current location goes through [`Navigator`], so the HTTP
//! client's forced-logout path and the UI share one notion of "where we are".

pub mod guard;
pub mod navigator;

pub use guard::{Decision, GuardState, decide, navigate_guarded, resolve};
pub use navigator::{MemoryNavigator, Navigator};

pub const ROOT: &str = "/";
pub const LOGIN: &str = "/login";
pub const CHAT: &str = "/chat";

pub const ADMIN_ROOT: &str = "/admin";
pub const ADMIN_LOGIN: &str = "/admin/login";
pub const ADMIN_DASHBOARD: &str = "/admin/dashboard";
pub const ADMIN_ADMINS: &str = "/admin/admins";
pub const ADMIN_STUDENTS: &str = "/admin/students";
pub const ADMIN_LECTURES: &str = "/admin/lectures";
pub const ADMIN_PROFILE: &str = "/admin/profile";
pub const ADMIN_KNOWLEDGE: &str = "/admin/knowledge-management";

/// Whether `path` is inside the admin namespace (`/admin` or `/admin/...`).
#[must_use]
pub fn is_admin_path(path: &str) -> bool {
    path == ADMIN_ROOT || path.starts_with("/admin/")
}

/// Strip query string, fragment and trailing slashes so route matching only
/// sees the path. The root stays `/`.
#[must_use]
pub fn normalize_path(raw: &str) -> &str {
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    let path = raw[..end].trim_end_matches('/');
    if path.is_empty() { ROOT } else { path }
}
