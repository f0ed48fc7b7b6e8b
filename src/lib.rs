//! Authenticated request and session layer for the lecture console.
//!
//! Two front ends share this crate: the admin console (lecturers and super
//! admins) and the user chat client. Both talk to the same backend, which
//! wraps every response in a `{code, message, data}` envelope and signs
//! sessions with bearer tokens.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`net`] | Transport seam and the authenticated [`net::ApiClient`] |
//! | [`session`] | User and admin sessions: login, logout, hydration |
//! | [`routing`] | Route table, the pure route guard, the navigator port |
//! | [`api`] | Typed lecture, knowledge-base and profile endpoints |
//! | [`storage`] | Durable key/value store for tokens and identities |
//! | [`notify`] | User-visible notices |
//! | [`config`] | Base URL, timeouts and state file from the environment |
//! | [`error`] | [`error::ApiError`] taxonomy |

pub mod api;
pub mod config;
pub mod error;
pub mod net;
pub mod notify;
pub mod routing;
pub mod session;
pub mod storage;

#[cfg(test)]
mod test_helpers;

pub use config::ClientConfig;
pub use error::{ApiError, ErrorCode};
pub use net::{ApiClient, ApiRequest};
pub use session::{Credentials, Identity, Registration, Role, Scope, Session, SessionState, SessionStore};
