//! Authenticated request dispatch for the ERCx API.
//!
//! # Design
//! `RequestDispatcher` holds only an immutable `ClientConfig` and a
//! `Transport`. A call is split the same way the wire exchange is:
//! `build_request` turns a `RequestDescriptor` into an `HttpRequest`,
//! the transport performs the round-trip, and `parse_response` classifies the
//! `HttpResponse`. `execute` chains the three. Building and parsing never do
//! I/O, so each half can be exercised on its own.
//!
//! Payloads come back as untyped `serde_json::Value`; decoding into domain
//! records happens at the call site.

use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::transport::UreqTransport;

/// Header carrying the pre-shared key.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Characters left unescaped in query keys and values.
const QUERY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// One pending API call: method, endpoint relative to the base url, and the
/// optional query and JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub endpoint: String,
    pub query: Option<BTreeMap<String, String>>,
    pub body: Option<Value>,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            query: None,
            body: None,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, endpoint)
    }

    /// Add one query parameter. Only sent on GET.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Attach a JSON body. Only sent on POST and DELETE.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Stateless executor of authenticated API calls.
///
/// Safe to share across threads whenever the transport is; every `execute`
/// is an independent round-trip.
#[derive(Debug, Clone)]
pub struct RequestDispatcher<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl RequestDispatcher<UreqTransport> {
    /// Dispatcher over the default blocking transport.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T: Transport> RequestDispatcher<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the wire request for `descriptor`.
    ///
    /// The url is `api_url + endpoint` with no slash handling. GET carries
    /// the query and never a body; POST and DELETE carry the body, if any,
    /// and never a query.
    pub fn build_request(&self, descriptor: &RequestDescriptor) -> Result<HttpRequest> {
        let mut url = format!("{}{}", self.config.api_url(), descriptor.endpoint);
        let mut headers = vec![(API_KEY_HEADER.to_string(), self.config.api_key().to_string())];

        let body = match descriptor.method {
            HttpMethod::Get => {
                if let Some(query) = descriptor.query.as_ref().filter(|q| !q.is_empty()) {
                    url.push('?');
                    url.push_str(&encode_query(query));
                }
                None
            }
            HttpMethod::Post | HttpMethod::Delete => match &descriptor.body {
                Some(body) => {
                    let encoded = serde_json::to_string(body)
                        .map_err(|e| ApiError::SerializationError(e.to_string()))?;
                    headers.push(("content-type".to_string(), "application/json".to_string()));
                    Some(encoded)
                }
                None => None,
            },
            other => return Err(ApiError::UnsupportedMethod(other.to_string())),
        };

        Ok(HttpRequest {
            method: descriptor.method,
            url,
            headers,
            body,
        })
    }

    /// Classify a response: 200 and 201 yield the parsed JSON body, anything
    /// else is an `HttpError` and the body is not looked at.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value> {
        check_status(&response)?;
        serde_json::from_slice(&response.body).map_err(|e| ApiError::DecodeError(e.to_string()))
    }

    /// Perform exactly one authenticated call.
    pub fn execute(&self, descriptor: &RequestDescriptor) -> Result<Value> {
        let request = self.build_request(descriptor)?;
        debug!(method = %request.method, endpoint = %descriptor.endpoint, "sending request");

        let response = self.transport.send(&request).map_err(|e| {
            warn!(method = %request.method, endpoint = %descriptor.endpoint, error = %e, "transport failure");
            ApiError::Transport(e)
        })?;

        let status = response.status;
        self.parse_response(response).inspect_err(|e| {
            warn!(method = %request.method, endpoint = %descriptor.endpoint, status, error = %e, "request failed");
        })
    }
}

fn check_status(response: &HttpResponse) -> Result<()> {
    match response.status {
        200 | 201 => Ok(()),
        status => Err(ApiError::HttpError { status }),
    }
}

fn encode_query(query: &BTreeMap<String, String>) -> String {
    query
        .iter()
        .map(|(k, v)| format!("{}={}", utf8_percent_encode(k, QUERY), utf8_percent_encode(v, QUERY)))
        .collect::<Vec<_>>()
        .join("&")
}
