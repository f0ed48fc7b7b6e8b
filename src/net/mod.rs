//! Network layer: the transport seam and the authenticated API client.

pub mod client;
pub mod transport;

pub use client::{ApiClient, ApiRequest, CallState};
pub use transport::{Body, HttpRequest, HttpResponse, Method, Part, ReqwestTransport, Transport, TransportError};
