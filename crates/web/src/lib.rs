//! The dispatch core of minnow: a prefix-tree router, a cursor-driven middleware chain and a
//! deadline wrapper that commits exactly one response per request.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use minnow_web::middleware::{Cost, Timeout};
//! use minnow_web::{handler_fn, Router, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut router = Router::new();
//!     router.use_middleware(Cost).use_middleware(Timeout::new(Duration::from_secs(1)));
//!     router
//!         .get("/user/:id", handler_fn(|ctx| async move {
//!             let (id, _) = ctx.param_int64("id", 0);
//!             ctx.json(&serde_json::json!({ "id": id }))
//!         }))
//!         .unwrap();
//!
//!     Server::builder().router(router).address("127.0.0.1:8080").build().unwrap().start().await;
//! }
//! ```
//!
//! # Request flow
//!
//! 1. [`Router::resolve`] maps the method and path to a pipeline: process-wide middlewares,
//!    group middlewares, then the route's handlers.
//! 2. A [`Context`] is built around the request and the pipeline.
//! 3. Each handler advances the chain with [`Context::next`] and may run more logic after it
//!    returns.
//! 4. The first body emission commits the response; later emissions are discarded.

mod context;
mod error;
mod handler;
mod router;
mod server;

pub mod middleware;

pub use context::Context;
pub use context::FromParam;
pub use context::PathParams;
pub use error::{BindError, HandlerError, RegistrationError, ServerBuildError};
pub use handler::handler_fn;
pub use handler::FnHandler;
pub use handler::Handler;
pub use handler::Pipeline;
pub use handler::SharedHandler;
pub use router::{Group, RouteMatch, Router};
pub use server::{Server, ServerBuilder};

// re-exported for `Context::set_cookie`
pub use cookie::Cookie;
