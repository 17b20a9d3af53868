//! A small HTTP service that holds AWS credentials server-side and forwards
//! agent invocations on behalf of browser clients.
//!
//! Routes:
//!
//! - `GET /health`
//! - `POST /api/agent/invoke`
//! - `POST /api/agent/session`

mod config;
mod error;
mod routes;

pub use config::ProxyConfig;
pub use error::ApiError;
pub use routes::{InvokeRequest, InvokeResponse, ProxyState, router};
