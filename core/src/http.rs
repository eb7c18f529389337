//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe the outbound GET and its response as plain data.
//! `BdlClient` builds `HttpRequest` values and parses `HttpResponse` values
//! without touching the network; whoever executes the round-trip (a
//! `Transport` implementation, a test stub, or a C host through the FFI
//! crate) sits in between.
//!
//! Every upstream call is a GET, so no method field is carried. All fields
//! use owned types so values can cross FFI boundaries without lifetime
//! concerns.

/// An outbound GET described as plain data.
///
/// `url` is absolute and already carries the encoded query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
