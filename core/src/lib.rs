//! Blocking client for the ERCx token evaluation API.
//!
//! # Overview
//! `RequestDispatcher` turns a `RequestDescriptor` (method, endpoint, query,
//! body) into one authenticated HTTP call and classifies the answer into a
//! JSON payload or an `ApiError`. `ErcxClient` layers the service's typed
//! operations on top of it. Inputs are validated through the closed domain
//! types in `types` before anything is sent.
//!
//! # Design
//! - The dispatcher holds only an immutable `ClientConfig` and a `Transport`;
//!   there is no retry, caching or shared mutable state.
//! - Request building and response parsing are pure. The `Transport` trait is
//!   the only I/O seam, with `UreqTransport` as the default implementation.
//! - Failures are always returned as `ApiError`, never logged and dropped.

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::ErcxClient;
pub use config::ClientConfig;
pub use dispatcher::{RequestDescriptor, RequestDispatcher, API_KEY_HEADER};
pub use error::{ApiError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use transport::UreqTransport;
pub use types::{Network, Permission, TestLevel, TokenInfo};
