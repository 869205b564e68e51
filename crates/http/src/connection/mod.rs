//! HTTP connection handling.
//!
//! [`HttpConnection`] reads requests off a stream, hands each one to a
//! [`Handler`](crate::handler::Handler), and writes the response back, keeping the connection
//! alive between requests when the client allows it.

mod http_connection;

pub use http_connection::HttpConnection;
