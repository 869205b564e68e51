//! HTTP header decoder for parsing request headers.
//!
//! Parses method, URI, version and header fields with `httparse`, then decides how the body is
//! delimited from the `Content-Length` and `Transfer-Encoding` headers.
//!
//! # Limits
//!
//! - Maximum number of headers: 64
//! - Maximum header size: 8KB
//! - Maximum body size: 4MB
//! - Only HTTP/1.0 and HTTP/1.1

use bytes::{Buf, BytesMut};
use http::Request;
use httparse::{Error, Status};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;

use crate::protocol::{ParseError, PayloadSize, RequestHeader};

/// Maximum number of headers allowed in a request
pub const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the entire header section
pub const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Maximum size in bytes allowed for a request body
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Decoder for HTTP request headers implementing the [`Decoder`] trait.
#[derive(Debug, Default, Copy, Clone)]
pub struct HeaderDecoder;

impl Decoder for HeaderDecoder {
    type Item = (RequestHeader, PayloadSize);
    type Error = ParseError;

    /// Attempts to decode HTTP headers from the provided bytes buffer.
    ///
    /// Returns `Ok(None)` when more data is needed. On success the header bytes are consumed
    /// from `src`, leaving the body (if any) at the front of the buffer.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Minimum valid HTTP request needs at least "GET / HTTP/1.1\r\n\r\n"
        if src.len() < 14 {
            return Ok(None);
        }

        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let mut req = httparse::Request::new(&mut headers);

        let parsed_result = req.parse(src.as_ref()).map_err(|e| match e {
            Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
            e => ParseError::invalid_header(e),
        });

        match parsed_result? {
            Status::Complete(body_offset) => {
                trace!(header_size = body_offset, "parsed request header");
                ensure!(body_offset <= MAX_HEADER_BYTES, ParseError::too_large_header(body_offset, MAX_HEADER_BYTES));

                let version = match req.version {
                    Some(0) => http::Version::HTTP_10,
                    Some(1) => http::Version::HTTP_11,
                    // Currently HTTP/2 and HTTP/3 not supported
                    _ => return Err(ParseError::InvalidVersion(req.version)),
                };

                let mut builder = Request::builder()
                    .method(req.method.ok_or(ParseError::InvalidMethod)?)
                    .uri(req.path.ok_or(ParseError::InvalidUri)?)
                    .version(version);

                for header in req.headers.iter() {
                    builder = builder.header(header.name, header.value);
                }

                let header = RequestHeader::from(builder.body(()).map_err(ParseError::invalid_header)?);
                let payload_size = parse_payload(&header)?;

                src.advance(body_offset);
                Ok(Some((header, payload_size)))
            }
            // If parsing incomplete, ensure current buffer size does not exceed limit
            Status::Partial => {
                ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                Ok(None)
            }
        }
    }
}

/// Determines how the request body is delimited.
///
/// Any `Transfer-Encoding` is rejected: request bodies must carry a `Content-Length`.
/// Sending both headers is an error per RFC 9112 section 6.3.
fn parse_payload(header: &RequestHeader) -> Result<PayloadSize, ParseError> {
    // refer: https://www.rfc-editor.org/rfc/rfc9112.html#name-transfer-encoding
    let te_header = header.headers().get(http::header::TRANSFER_ENCODING);
    let cl_header = header.headers().get(http::header::CONTENT_LENGTH);

    match (te_header, cl_header) {
        (None, None) => Ok(PayloadSize::new_empty()),

        (Some(te_value), None) => Err(ParseError::unsupported_transfer_encoding(String::from_utf8_lossy(te_value.as_bytes()))),

        (None, Some(cl_value)) => {
            let cl_str = cl_value.to_str().map_err(ParseError::invalid_content_length)?;

            let length = cl_str
                .trim()
                .parse::<u64>()
                .map_err(|e| ParseError::invalid_content_length(format!("value {cl_str} is not u64: {e}")))?;

            ensure!(length <= MAX_BODY_BYTES as u64, ParseError::too_large_body(length, MAX_BODY_BYTES));

            Ok(PayloadSize::new_length(length))
        }

        (Some(_), Some(_)) => Err(ParseError::invalid_content_length("transfer_encoding and content_length both present in headers")),
    }
}
