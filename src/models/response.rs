//! Captured HTTP response records.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Phase breakdown reported by the interceptor for a finished call.
///
/// Phases the transport could not measure stay at zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseTiming {
    /// DNS resolution.
    pub dns_lookup: Duration,

    /// TCP connection establishment.
    pub connect: Duration,

    /// TLS handshake, only present for HTTPS calls.
    pub tls_handshake: Option<Duration>,

    /// Time to first byte after the request was written.
    pub first_byte: Duration,

    /// Body download after the first byte.
    pub download: Duration,
}

impl ResponseTiming {
    /// Sum of every measured phase.
    pub fn total(&self) -> Duration {
        let base = self.dns_lookup + self.connect + self.first_byte + self.download;
        match self.tls_handshake {
            Some(tls) => base + tls,
            None => base,
        }
    }
}

/// A response received for a captured request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// HTTP status code (e.g., 200, 404, 500).
    pub status_code: u16,

    /// Reason phrase sent by the server, possibly empty.
    pub status_text: String,

    /// Response headers as received.
    pub headers: HashMap<String, String>,

    /// Raw response body.
    ///
    /// Kept as bytes so binary payloads (images, protobuf) survive capture.
    pub body: Vec<u8>,

    /// Per-phase timing, when the transport reports it.
    pub timing: ResponseTiming,
}

impl ResponseRecord {
    /// Creates a response with empty headers, body and timing.
    pub fn new(status_code: u16, status_text: impl Into<String>) -> Self {
        Self {
            status_code,
            status_text: status_text.into(),
            headers: HashMap::new(),
            body: Vec::new(),
            timing: ResponseTiming::default(),
        }
    }

    /// Builder-style header insertion.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Builder-style body assignment.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Builder-style timing assignment.
    pub fn with_timing(mut self, timing: ResponseTiming) -> Self {
        self.timing = timing;
        self
    }

    /// `true` for 2xx status codes.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// `true` for 3xx status codes.
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status_code)
    }

    /// `true` for 4xx status codes.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }

    /// `true` for 5xx status codes.
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }

    /// Looks up a header value, ignoring the case of the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Content-Type header, if the server sent one.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Approximate wire size: headers plus body.
    pub fn size(&self) -> usize {
        let headers: usize = self
            .headers
            .iter()
            .map(|(k, v)| k.len() + v.len() + 4) // ": " and "\r\n"
            .sum();
        headers + self.body.len()
    }
}
