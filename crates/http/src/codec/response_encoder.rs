//! HTTP response encoder.
//!
//! Serializes the status line, the headers and the buffered body of a response. The
//! `Content-Length` header always reflects the body, and a `Date` header is added when the
//! response does not carry one.

use crate::date::DateService;
use crate::protocol::SendError;

use bytes::{BufMut, Bytes, BytesMut};
use http::{header, HeaderValue, Response};
use std::io;
use std::io::Write;
use tokio_util::codec::Encoder;

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

/// Encoder for fully buffered HTTP/1.1 responses.
#[derive(Debug, Default)]
pub struct ResponseEncoder;

impl ResponseEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<Response<Bytes>> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, response: Response<Bytes>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (mut parts, body) = response.into_parts();

        dst.reserve(INIT_HEADER_SIZE + body.len());
        write!(
            FastWrite(dst),
            "HTTP/1.1 {} {}\r\n",
            parts.status.as_str(),
            parts.status.canonical_reason().unwrap_or("<unknown status code>")
        )?;

        // an empty body keeps an explicit Content-Length, which is how HEAD responses
        // advertise the size of the representation they omit
        if !body.is_empty() || !parts.headers.contains_key(header::CONTENT_LENGTH) {
            parts.headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
        }

        if !parts.headers.contains_key(header::DATE) {
            if let Some(date) = DateService::get_global_instance().http_date() {
                parts.headers.insert(header::DATE, date);
            }
        }

        for (header_name, header_value) in &parts.headers {
            dst.put_slice(header_name.as_ref());
            dst.put_slice(b": ");
            dst.put_slice(header_value.as_ref());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        dst.put_slice(&body);
        Ok(())
    }
}

/// Writer over `BytesMut` used for the formatted status line.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    fn encode(response: Response<Bytes>) -> String {
        let mut dst = BytesMut::new();
        ResponseEncoder::new().encode(response, &mut dst).unwrap();
        String::from_utf8(dst.to_vec()).unwrap()
    }

    #[test]
    fn encodes_status_headers_and_body() {
        let response = Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Bytes::from_static(b"missing"))
            .unwrap();

        let encoded = encode(response);

        assert!(encoded.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(encoded.contains("content-type: text/plain\r\n"));
        assert!(encoded.contains("content-length: 7\r\n"));
        assert!(encoded.contains("date: "));
        assert!(encoded.ends_with("\r\n\r\nmissing"));
    }

    #[test]
    fn empty_body_has_zero_length() {
        let encoded = encode(Response::new(Bytes::new()));

        assert!(encoded.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(encoded.contains("content-length: 0\r\n"));
        assert!(encoded.ends_with("\r\n\r\n"));
    }

    #[test]
    fn explicit_length_kept_for_empty_body() {
        let response = Response::builder().header(header::CONTENT_LENGTH, 42).body(Bytes::new()).unwrap();

        let encoded = encode(response);
        assert!(encoded.contains("content-length: 42\r\n"));
    }
}
