use bytes::Bytes;

use crate::protocol::RequestHeader;

/// An item produced by the request decoder.
///
/// A request always yields a `Header` first. When its [`PayloadSize`] is `Length`, the decoder
/// then yields exactly one `Payload` holding the whole body.
#[derive(Debug)]
pub enum Message {
    /// The parsed request header and how its body is delimited
    Header((RequestHeader, PayloadSize)),
    /// The complete request body
    Payload(Bytes),
}

/// Represents the size information of an HTTP payload.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Payload with known length in bytes
    Length(u64),
    /// Empty payload (no body)
    Empty,
}

impl PayloadSize {
    #[inline]
    pub fn new_length(length: u64) -> Self {
        if length == 0 { PayloadSize::Empty } else { PayloadSize::Length(length) }
    }

    #[inline]
    pub fn new_empty() -> Self {
        PayloadSize::Empty
    }

    /// Returns true if the payload is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, PayloadSize::Empty)
    }
}

impl Message {
    /// Returns true if this message contains header information
    #[inline]
    pub fn is_header(&self) -> bool {
        matches!(self, Message::Header(_))
    }

    /// Returns true if this message contains payload data
    #[inline]
    pub fn is_payload(&self) -> bool {
        matches!(self, Message::Payload(_))
    }
}
