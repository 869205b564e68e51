//! Core HTTP protocol types.
//!
//! - [`Message`]: what the request decoder produces, either a header or a buffered body
//! - [`PayloadSize`]: how the body of a request is delimited
//! - [`RequestHeader`]: wraps `http::Request<()>` with a few helpers
//! - [`RemoteAddr`]: request extension carrying the peer address
//! - [`HttpError`], [`ParseError`], [`SendError`]: error types of this crate

mod message;
pub use message::Message;
pub use message::PayloadSize;

mod request;
pub use request::RemoteAddr;
pub use request::RequestHeader;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
