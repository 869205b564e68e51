//! HTTP request decoder.
//!
//! Decodes a request in two phases: the header through [`HeaderDecoder`], then, when the header
//! announced a `Content-Length`, the whole body as a single [`Message::Payload`]. The body is
//! not decoded until the connection asks for the next frame, which lets the connection answer
//! `Expect: 100-continue` in between.

use crate::codec::header_decoder::HeaderDecoder;
use crate::protocol::{Message, ParseError, PayloadSize};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// A decoder for HTTP requests that handles both headers and payload
///
/// The decoder keeps its state in `remaining_payload`:
/// - `None`: currently parsing headers
/// - `Some(n)`: waiting for an `n` byte body
#[derive(Debug, Default)]
pub struct RequestDecoder {
    header_decoder: HeaderDecoder,
    remaining_payload: Option<usize>,
}

impl RequestDecoder {
    /// Creates a new `RequestDecoder` instance
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for RequestDecoder {
    type Item = Message;
    type Error = ParseError;

    /// Attempts to decode an HTTP request from the provided buffer
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Message::Header(_)))`: Successfully decoded request headers
    /// - `Ok(Some(Message::Payload(_)))`: Successfully decoded the complete body
    /// - `Ok(None)`: Need more data to proceed
    /// - `Err(_)`: Encountered a parsing error
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(length) = self.remaining_payload {
            if src.len() < length {
                src.reserve(length - src.len());
                return Ok(None);
            }

            self.remaining_payload = None;
            return Ok(Some(Message::Payload(src.split_to(length).freeze())));
        }

        let message = match self.header_decoder.decode(src)? {
            Some((header, payload_size)) => {
                if let PayloadSize::Length(length) = payload_size {
                    let length = usize::try_from(length).map_err(ParseError::invalid_content_length)?;
                    self.remaining_payload = Some(length);
                }
                Some(Message::Header((header, payload_size)))
            }
            None => None,
        };

        Ok(message)
    }
}
