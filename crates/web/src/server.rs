use std::convert::Infallible;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::FutureExt;
use http::{HeaderValue, Request, Response, StatusCode};
use minnow_http::connection::HttpConnection;
use minnow_http::handler::Handler;
use tokio::net::TcpListener;
use tokio::time::Instant;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::context::{Context, CONTENT_TYPE_JSON};
use crate::error::ServerBuildError;
use crate::middleware::{panic_message, INTERNAL_ERROR_MESSAGE};
use crate::router::Router;

const NOT_FOUND_MESSAGE: &str = "not found router";
const INNER_ERROR_MESSAGE: &str = "inner error";

pub struct ServerBuilder {
    router: Option<Router>,
    address: Option<io::Result<Vec<SocketAddr>>>,
    request_timeout: Option<Duration>,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { router: None, address: None, request_timeout: None }
    }

    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(Iterator::collect));
        self
    }

    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    /// Gives every request a deadline `timeout` after it is dispatched.
    ///
    /// The deadline caps the budget of every [`Timeout`](crate::middleware::Timeout) middleware.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let router = self.router.ok_or(ServerBuildError::MissingRouter)?;
        let address = self.address.ok_or(ServerBuildError::MissingAddress)??;
        if address.is_empty() {
            return Err(ServerBuildError::MissingAddress);
        }
        Ok(Server { router, address, request_timeout: self.request_timeout })
    }
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("router", &self.router)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct Server {
    router: Router,
    address: Vec<SocketAddr>,
    request_timeout: Option<Duration>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub async fn start(self) {
        let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            warn!(cause = %e, "global tracing subscriber already set");
        }

        info!("start listening at {:?}", self.address);
        let tcp_listener = match TcpListener::bind(self.address.as_slice()).await {
            Ok(tcp_listener) => tcp_listener,
            Err(e) => {
                error!(cause = %e, "bind server error");
                return;
            }
        };

        let handler = Arc::new(self);
        loop {
            let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let handler = Arc::clone(&handler);

            tokio::spawn(async move {
                let (reader, writer) = tcp_stream.into_split();
                let connection = HttpConnection::new(reader, writer).with_remote_addr(remote_addr);
                match connection.process(handler).await {
                    Ok(()) => {
                        info!("finished process, connection shutdown");
                    }
                    Err(e) => {
                        error!("service has error, cause {}, connection shutdown", e);
                    }
                }
            });
        }
    }

    /// Routes `request` through its pipeline and returns the single committed response.
    ///
    /// - no route: `404`
    /// - a handler error nobody answered: `500`
    /// - a panic that no middleware contained: `500`
    pub async fn dispatch(&self, request: Request<Bytes>) -> Response<Bytes> {
        let Some(matched) = self.router.resolve(request.method(), request.uri().path()) else {
            info!(method = %request.method(), uri = %request.uri(), "no router matched");
            return message_response(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE);
        };

        let (pipeline, params) = matched.into_parts();
        let mut ctx = Context::new(request, pipeline, params);
        if let Some(timeout) = self.request_timeout {
            ctx = ctx.with_deadline(Instant::now() + timeout);
        }
        let ctx = Arc::new(ctx);

        match AssertUnwindSafe(ctx.next()).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(cause = %e, method = %ctx.method(), uri = %ctx.uri(), "handle request error");
                ctx.commit_failure(StatusCode::INTERNAL_SERVER_ERROR, INNER_ERROR_MESSAGE);
            }
            Err(panic) => {
                error!(cause = panic_message(panic.as_ref()), method = %ctx.method(), uri = %ctx.uri(), "handler panicked");
                ctx.cancel();
                ctx.commit_failure(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE);
            }
        }

        ctx.take_response()
    }
}

fn message_response(status: StatusCode, message: &str) -> Response<Bytes> {
    let body = serde_json::json!({ "message": message }).to_string();
    let mut response = Response::new(Bytes::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(http::header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
    response
}

#[async_trait]
impl Handler for Server {
    type Error = Infallible;

    async fn call(&self, req: Request<Bytes>) -> Result<Response<Bytes>, Self::Error> {
        Ok(self.dispatch(req).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::handler_fn;
    use crate::middleware::{Recovery, Timeout};
    use http::Method;
    use indoc::indoc;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

    async fn hello(ctx: Arc<Context>) -> Result<(), HandlerError> {
        let (name, _) = ctx.param_string("name", String::new());
        ctx.text(format!("hello {name}"))
    }

    async fn twice(ctx: Arc<Context>) -> Result<(), HandlerError> {
        ctx.text("once")?;
        ctx.text("twice")
    }

    async fn failing(_ctx: Arc<Context>) -> Result<(), HandlerError> {
        Err(HandlerError::custom("database is gone"))
    }

    async fn explode(_ctx: Arc<Context>) -> Result<(), HandlerError> {
        panic!("unexpected state")
    }

    async fn sleepy(ctx: Arc<Context>) -> Result<(), HandlerError> {
        tokio::time::sleep(Duration::from_millis(150)).await;
        ctx.text("slept")
    }

    fn server(router: Router) -> Server {
        Server::builder().router(router).address("127.0.0.1:0").build().unwrap()
    }

    fn get(path: &str) -> Request<Bytes> {
        Request::builder().method(Method::GET).uri(path).body(Bytes::new()).unwrap()
    }

    fn default_router() -> Router {
        let mut router = Router::new();
        router.get("/hello/:name", handler_fn(hello)).unwrap();
        router.get("/twice", handler_fn(twice)).unwrap();
        router.get("/failing", handler_fn(failing)).unwrap();
        router.get("/explode", handler_fn(explode)).unwrap();
        router
    }

    #[test]
    fn builder_requires_router_and_address() {
        assert!(matches!(Server::builder().address("127.0.0.1:0").build(), Err(ServerBuildError::MissingRouter)));
        assert!(matches!(Server::builder().router(Router::new()).build(), Err(ServerBuildError::MissingAddress)));
    }

    #[tokio::test]
    async fn dispatch_to_matching_route() {
        let response = server(default_router()).dispatch(get("/HELLO/Ferris")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), b"hello Ferris");
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let server = server(default_router());

        let response = server.dispatch(get("/nowhere")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.body().as_ref(), br#"{"message":"not found router"}"#);

        let post = Request::builder().method(Method::POST).uri("/twice").body(Bytes::new()).unwrap();
        assert_eq!(server.dispatch(post).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn double_emission_sends_the_first() {
        let response = server(default_router()).dispatch(get("/twice")).await;
        assert_eq!(response.body().as_ref(), b"once");
    }

    #[tokio::test]
    async fn unhandled_error_is_inner_error() {
        let response = server(default_router()).dispatch(get("/failing")).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body().as_ref(), br#"{"message":"inner error"}"#);
    }

    #[tokio::test]
    async fn panic_is_contained_without_middleware() {
        let server = server(default_router());

        let response = server.dispatch(get("/explode")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        // the server keeps serving
        assert_eq!(server.dispatch(get("/hello/again")).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn recovery_middleware_answers_panics() {
        let mut router = Router::new();
        router.use_middleware(Recovery);
        router.get("/explode", handler_fn(explode)).unwrap();

        let response = server(router).dispatch(get("/explode")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body().as_ref(), br#"{"message":"internal error"}"#);
    }

    #[tokio::test(start_paused = true)]
    async fn request_timeout_caps_timeout_middleware() {
        let mut router = Router::new();
        router.use_middleware(Timeout::new(Duration::from_secs(60)));
        router.get("/sleepy", handler_fn(sleepy)).unwrap();

        let server = Server::builder()
            .router(router)
            .address("127.0.0.1:0")
            .request_timeout(Duration::from_millis(50))
            .build()
            .unwrap();

        let response = server.dispatch(get("/sleepy")).await;
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(response.body().as_ref(), br#"{"message":"time out"}"#);
    }

    #[tokio::test]
    async fn serves_requests_over_a_connection() {
        let server = Arc::new(server(default_router()));
        let (client, stream) = duplex(64 * 1024);
        let (reader, writer) = tokio::io::split(stream);
        let task = tokio::spawn(HttpConnection::new(reader, writer).process(server));

        let request = indoc! {r##"
        GET /hello/wire HTTP/1.1
        Host: 127.0.0.1:8080

        GET /missing HTTP/1.1
        Host: 127.0.0.1:8080
        Connection: close

        "##};

        let (mut client_read, mut client_write) = tokio::io::split(client);
        client_write.write_all(request.as_bytes()).await.unwrap();
        client_write.shutdown().await.unwrap();

        let mut output = String::new();
        client_read.read_to_string(&mut output).await.unwrap();
        task.await.unwrap().unwrap();

        assert!(output.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(output.contains("hello wire"));
        assert!(output.contains("HTTP/1.1 404 Not Found\r\n"));
        assert!(output.ends_with(r#"{"message":"not found router"}"#));
    }
}
