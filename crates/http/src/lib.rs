//! The HTTP/1.1 wire layer of minnow.
//!
//! This crate turns a byte stream into buffered `http::Request<Bytes>` values, hands them to a
//! [`handler::Handler`], and writes the returned `http::Response<Bytes>` back to the peer. It is
//! deliberately small: the interesting work (routing, middleware chaining, deadlines) lives in
//! `minnow-web`, which implements [`handler::Handler`] on top of this crate.
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use http::{Request, Response, StatusCode};
//! use std::convert::Infallible;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use minnow_http::connection::HttpConnection;
//! use minnow_http::handler::make_handler;
//!
//! #[tokio::main]
//! async fn main() {
//!     let tcp_listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     let handler = Arc::new(make_handler(hello_world));
//!
//!     loop {
//!         let (tcp_stream, remote_addr) = tcp_listener.accept().await.unwrap();
//!         let handler = Arc::clone(&handler);
//!
//!         tokio::spawn(async move {
//!             let (reader, writer) = tcp_stream.into_split();
//!             let connection = HttpConnection::new(reader, writer).with_remote_addr(remote_addr);
//!             let _ = connection.process(handler).await;
//!         });
//!     }
//! }
//!
//! async fn hello_world(request: Request<Bytes>) -> Result<Response<Bytes>, Infallible> {
//!     let body = format!("hello {}\r\n", request.uri().path());
//!     Ok(Response::builder().status(StatusCode::OK).body(Bytes::from(body)).unwrap())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`connection`]: per-connection read/dispatch/write loop with keep-alive
//! - [`codec`]: `tokio-util` decoder for requests and encoder for responses
//! - [`protocol`]: message types and error types
//! - [`handler`]: the [`handler::Handler`] trait connecting the wire to an application
//! - [`date`]: the cached `Date` header value
//!
//! # Limitations
//!
//! - HTTP/1.1 only
//! - Request bodies must be delimited by `Content-Length`; chunked uploads are rejected
//! - Maximum header size: 8KB, maximum number of headers: 64, maximum body size: 4MB

pub mod codec;
pub mod connection;
pub mod date;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
