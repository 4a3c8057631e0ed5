//! Incoming HTTP request type.

use std::collections::HashMap;
use std::net::IpAddr;

use bytes::Bytes;
use http::{HeaderMap, Method};

/// An incoming HTTP request.
///
/// Immutable once received: every pipeline stage reads the same method,
/// path, headers, body, and client IP. The only things added along the way
/// are *annotations* — path parameters bound by the router and the parsed
/// JSON document attached by the body-parsing stage.
pub struct Request {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Bytes,
    client_ip: IpAddr,
    params: HashMap<String, String>,
    json: Option<serde_json::Value>,
}

impl Request {
    pub(crate) fn new(
        method: Method,
        path: String,
        headers: HeaderMap,
        body: Bytes,
        client_ip: IpAddr,
    ) -> Self {
        Self {
            method,
            path,
            headers,
            body,
            client_ip,
            params: HashMap::new(),
            json: None,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header lookup by name; returns `None` for absent or non-UTF-8 values.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Raw request body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Address of the peer socket this request arrived on.
    pub fn client_ip(&self) -> IpAddr {
        self.client_ip
    }

    /// Returns a named path parameter bound by the router.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns
    /// `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The parsed JSON body, if the body-parsing stage ran and the request
    /// carried a JSON content type.
    pub fn json(&self) -> Option<&serde_json::Value> {
        self.json.as_ref()
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    pub(crate) fn with_json(mut self, value: serde_json::Value) -> Self {
        self.json = Some(value);
        self
    }
}

#[cfg(test)]
impl Request {
    /// Bare request for stage and router tests.
    pub(crate) fn test(method: Method, path: &str) -> Self {
        Self::new(
            method,
            path.to_owned(),
            HeaderMap::new(),
            Bytes::new(),
            std::net::Ipv4Addr::LOCALHOST.into(),
        )
    }

    pub(crate) fn with_test_header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.insert(
            http::header::HeaderName::from_static(name),
            value.parse().unwrap(),
        );
        self
    }

    pub(crate) fn with_test_body(mut self, body: &[u8]) -> Self {
        self.body = Bytes::copy_from_slice(body);
        self
    }

    pub(crate) fn with_test_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = ip;
        self
    }
}
