//! HTTP request header handling.
//!
//! Wraps the standard `http::Request<()>` so that the header can be inspected before the body
//! has been read, and attached to the body afterwards.

use std::net::SocketAddr;

use http::{HeaderMap, Method, Request, Uri, Version};

/// Represents an HTTP request header.
#[derive(Debug)]
pub struct RequestHeader {
    inner: Request<()>,
}

/// The address of the peer that sent a request.
///
/// The connection inserts it into every request's extensions when it knows the address.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RemoteAddr(pub SocketAddr);

impl RequestHeader {
    /// Attaches a body to this header, converting it into a full `Request<T>`.
    pub fn body<T>(self, body: T) -> Request<T> {
        self.inner.map(|()| body)
    }

    /// Returns a reference to the request's HTTP method.
    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    /// Returns a reference to the request's URI.
    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    /// Returns the request's HTTP version.
    pub fn version(&self) -> Version {
        self.inner.version()
    }

    /// Returns a reference to the request's headers.
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Whether the client sent `Expect: 100-continue`.
    pub fn expects_continue(&self) -> bool {
        self.headers()
            .get(http::header::EXPECT)
            .is_some_and(|value| value.as_bytes().eq_ignore_ascii_case(b"100-continue"))
    }

    /// Whether the connection should stay open after this request is answered.
    ///
    /// HTTP/1.1 defaults to keep-alive unless `Connection: close` is sent, HTTP/1.0 defaults to
    /// close unless `Connection: keep-alive` is sent.
    pub fn is_keep_alive(&self) -> bool {
        let connection = self.headers().get(http::header::CONNECTION).map(http::HeaderValue::as_bytes);
        match self.version() {
            Version::HTTP_11 => !connection.is_some_and(|v| v.eq_ignore_ascii_case(b"close")),
            _ => connection.is_some_and(|v| v.eq_ignore_ascii_case(b"keep-alive")),
        }
    }
}

/// Converts a bodyless request into a RequestHeader.
impl From<Request<()>> for RequestHeader {
    #[inline]
    fn from(inner: Request<()>) -> Self {
        Self { inner }
    }
}
