//! HTTP codec module for decoding requests and encoding responses.
//!
//! - [`RequestDecoder`]: decodes a request header, then its `Content-Length` body
//! - [`ResponseEncoder`]: encodes a fully buffered response
//!
//! # Example
//!
//! ```no_run
//! use minnow_http::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from("GET / HTTP/1.1\r\nHost: localhost\r\n\r\n");
//! let header = decoder.decode(&mut buffer);
//! ```

mod header_decoder;
mod request_decoder;
mod response_encoder;

pub use header_decoder::HeaderDecoder;
pub use header_decoder::{MAX_BODY_BYTES, MAX_HEADER_BYTES, MAX_HEADER_NUM};
pub use request_decoder::RequestDecoder;
pub use response_encoder::ResponseEncoder;
