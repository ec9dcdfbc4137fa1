//! Captured HTTP request records.
//!
//! A [`RequestRecord`] is the interceptor's view of an outgoing call: what was
//! sent, to where, and with which headers. It is immutable once captured.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// HTTP request method.
///
/// Represents all standard HTTP methods as defined in RFC 7231 and RFC 5789.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    /// HTTP GET method - retrieve a resource
    GET,
    /// HTTP POST method - submit data to create a resource
    POST,
    /// HTTP PUT method - replace a resource
    PUT,
    /// HTTP DELETE method - remove a resource
    DELETE,
    /// HTTP PATCH method - partially modify a resource
    PATCH,
    /// HTTP OPTIONS method - describe communication options
    OPTIONS,
    /// HTTP HEAD method - retrieve headers only
    HEAD,
    /// HTTP TRACE method - perform a message loop-back test
    TRACE,
    /// HTTP CONNECT method - establish a tunnel to the server
    CONNECT,
}

impl HttpMethod {
    /// All methods, in declaration order.
    pub const ALL: [HttpMethod; 9] = [
        HttpMethod::GET,
        HttpMethod::POST,
        HttpMethod::PUT,
        HttpMethod::DELETE,
        HttpMethod::PATCH,
        HttpMethod::OPTIONS,
        HttpMethod::HEAD,
        HttpMethod::TRACE,
        HttpMethod::CONNECT,
    ];

    /// Returns the canonical upper-case name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::TRACE => "TRACE",
            HttpMethod::CONNECT => "CONNECT",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name an HTTP method.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown HTTP method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for HttpMethod {
    type Err = UnknownMethod;

    /// Parses a method name case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        HttpMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == upper)
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

/// An outgoing HTTP request as observed by the capture interceptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// HTTP method (GET, POST, PUT, DELETE, etc.).
    pub method: HttpMethod,

    /// Fully resolved target URL.
    pub url: String,

    /// Request headers as sent.
    ///
    /// Header names keep the casing the client used; lookups through
    /// [`RequestRecord::header`] are case-insensitive.
    pub headers: HashMap<String, String>,

    /// Raw request body, if one was sent.
    pub body: Option<Vec<u8>>,
}

impl RequestRecord {
    /// Creates a request record with no headers and no body.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Builder-style header insertion.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Builder-style body assignment.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Looks up a header value, ignoring the case of the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if the request carried a non-empty body.
    pub fn has_body(&self) -> bool {
        self.body.as_ref().is_some_and(|body| !body.is_empty())
    }

    /// Returns the body as UTF-8 text when it is valid UTF-8.
    pub fn body_text(&self) -> Option<&str> {
        self.body
            .as_deref()
            .and_then(|body| std::str::from_utf8(body).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_from_str_is_case_insensitive() {
        assert_eq!("get".parse::<HttpMethod>(), Ok(HttpMethod::GET));
        assert_eq!(" Patch ".parse::<HttpMethod>(), Ok(HttpMethod::PATCH));
        assert_eq!(
            "FETCH".parse::<HttpMethod>(),
            Err(UnknownMethod("FETCH".to_string()))
        );
    }

    #[test]
    fn test_method_display() {
        assert_eq!(HttpMethod::DELETE.to_string(), "DELETE");
        for method in HttpMethod::ALL {
            assert_eq!(method.to_string().parse::<HttpMethod>(), Ok(method));
        }
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let request = RequestRecord::new(HttpMethod::GET, "https://api.example.com/users")
            .with_header("Content-Type", "application/json");

        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("Accept"), None);
    }

    #[test]
    fn test_body_helpers() {
        let request = RequestRecord::new(HttpMethod::POST, "https://api.example.com/users");
        assert!(!request.has_body());
        assert_eq!(request.body_text(), None);

        let request = request.with_body(b"{\"name\":\"John\"}".to_vec());
        assert!(request.has_body());
        assert_eq!(request.body_text(), Some("{\"name\":\"John\"}"));

        let binary = RequestRecord::new(HttpMethod::PUT, "https://x").with_body(vec![0xff, 0xfe]);
        assert!(binary.has_body());
        assert_eq!(binary.body_text(), None);
    }
}
