use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::{Method, Response, StatusCode};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, error, info};

use crate::codec::{RequestDecoder, ResponseEncoder};
use crate::handler::Handler;
use crate::protocol::{HttpError, Message, ParseError, PayloadSize, RemoteAddr, RequestHeader, SendError};

/// An HTTP connection that manages request processing
///
/// `HttpConnection` handles the full lifecycle of an HTTP/1.1 connection:
/// - Reading and decoding requests
/// - Handling the expect-continue mechanism
/// - Dispatching each request to the handler
/// - Writing responses and honouring keep-alive
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, ResponseEncoder>,
    remote_addr: Option<SocketAddr>,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::new(), 8 * 1024),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
            remote_addr: None,
        }
    }

    /// Attaches the peer address, exposed to handlers as a [`RemoteAddr`] request extension.
    #[must_use]
    pub fn with_remote_addr(mut self, remote_addr: SocketAddr) -> Self {
        self.remote_addr = Some(remote_addr);
        self
    }

    pub async fn process<H: Handler>(mut self, handler: Arc<H>) -> Result<(), HttpError> {
        loop {
            match self.framed_read.next().await {
                Some(Ok(Message::Header((header, payload_size)))) => {
                    let keep_alive = self.do_process(header, payload_size, handler.as_ref()).await?;
                    if !keep_alive {
                        debug!("client asked to close, connection shutdown");
                        return Ok(());
                    }
                }

                Some(Ok(Message::Payload(_))) => {
                    error!("receive payload while expecting a request header");
                    self.send_error_response(StatusCode::BAD_REQUEST).await?;
                    return Err(ParseError::invalid_body("need header while receive body").into());
                }

                Some(Err(e)) => {
                    error!(cause = %e, "can't receive next request");
                    self.send_error_response(StatusCode::BAD_REQUEST).await?;
                    return Err(e.into());
                }

                None => {
                    info!("cant read more request, break this connection down");
                    return Ok(());
                }
            }
        }
    }

    /// Processes one request and returns whether the connection should stay open.
    async fn do_process<H: Handler>(&mut self, header: RequestHeader, payload_size: PayloadSize, handler: &H) -> Result<bool, HttpError> {
        let body = match payload_size {
            PayloadSize::Empty => Bytes::new(),
            PayloadSize::Length(_) => {
                if header.expects_continue() {
                    let writer = self.framed_write.get_mut();
                    writer.write_all(b"HTTP/1.1 100 Continue\r\n\r\n").await.map_err(SendError::io)?;
                    writer.flush().await.map_err(SendError::io)?;
                    info!("receive expect request header, sent continue response");
                }
                self.read_payload().await?
            }
        };

        let keep_alive = header.is_keep_alive();
        let is_head = header.method() == Method::HEAD;

        let mut request = header.body(body);
        if let Some(remote_addr) = self.remote_addr {
            request.extensions_mut().insert(RemoteAddr(remote_addr));
        }

        let mut response = match handler.call(request).await {
            Ok(response) => response,
            Err(e) => {
                let e: Box<dyn Error + Send + Sync> = e.into();
                error!(cause = %e, "handle response error");
                build_error_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        };

        if is_head {
            let length = response.body().len();
            response.headers_mut().insert(http::header::CONTENT_LENGTH, length.into());
            *response.body_mut() = Bytes::new();
        }

        self.framed_write.send(response).await?;
        Ok(keep_alive)
    }

    async fn read_payload(&mut self) -> Result<Bytes, HttpError> {
        match self.framed_read.next().await {
            Some(Ok(Message::Payload(bytes))) => Ok(bytes),
            Some(Ok(Message::Header(_))) => Err(ParseError::invalid_body("receive header while expecting a body").into()),
            Some(Err(e)) => Err(e.into()),
            None => Err(ParseError::invalid_body("connection closed before the body was complete").into()),
        }
    }

    async fn send_error_response(&mut self, status_code: StatusCode) -> Result<(), HttpError> {
        self.framed_write.send(build_error_response(status_code)).await?;
        Ok(())
    }
}

fn build_error_response(status_code: StatusCode) -> Response<Bytes> {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = status_code;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::make_handler;
    use http::Request;
    use std::convert::Infallible;
    use tokio::io::{duplex, AsyncReadExt};

    async fn echo(request: Request<Bytes>) -> Result<Response<Bytes>, Infallible> {
        let peer = request.extensions().get::<RemoteAddr>().map(|addr| addr.0.to_string()).unwrap_or_default();
        let body = format!("{} {} {} {}", request.method(), request.uri().path(), request.body().len(), peer);
        Ok(Response::new(Bytes::from(body)))
    }

    async fn run(input: &'static [u8]) -> String {
        let (client, server) = duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server);
        let connection = HttpConnection::new(server_read, server_write).with_remote_addr("10.0.0.1:4000".parse().unwrap());

        let task = tokio::spawn(connection.process(Arc::new(make_handler(echo))));

        let (mut client_read, mut client_write) = tokio::io::split(client);
        client_write.write_all(input).await.unwrap();
        client_write.shutdown().await.unwrap();

        let mut output = String::new();
        client_read.read_to_string(&mut output).await.unwrap();
        let _ = task.await.unwrap();
        output
    }

    #[tokio::test]
    async fn keep_alive_serves_pipelined_requests() {
        let output = run(b"GET /a HTTP/1.1\r\nHost: x\r\n\r\nPOST /b HTTP/1.1\r\nContent-Length: 3\r\nConnection: close\r\n\r\nabc").await;

        assert_eq!(output.matches("HTTP/1.1 200 OK").count(), 2);
        assert!(output.contains("GET /a 0 10.0.0.1:4000"));
        assert!(output.contains("POST /b 3 10.0.0.1:4000"));
    }

    #[tokio::test]
    async fn expect_continue_is_answered() {
        let output = run(b"PUT /up HTTP/1.1\r\nExpect: 100-continue\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok").await;

        assert!(output.starts_with("HTTP/1.1 100 Continue\r\n\r\n"));
        assert!(output.contains("PUT /up 2"));
    }

    #[tokio::test]
    async fn head_response_has_no_body() {
        let output = run(b"HEAD /h HTTP/1.1\r\nConnection: close\r\n\r\n").await;

        // "HEAD /h 0 10.0.0.1:4000"
        assert!(output.contains("content-length: 23\r\n"));
        assert!(output.ends_with("\r\n\r\n"));
    }

    #[tokio::test]
    async fn malformed_request_gets_bad_request() {
        let output = run(b"POST /x HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n").await;

        assert!(output.starts_with("HTTP/1.1 400 Bad Request"));
    }
}
