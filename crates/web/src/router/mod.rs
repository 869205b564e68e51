//! Route registration and resolution.
//!
//! A [`Router`] keeps one prefix tree per HTTP method. Registering a route snapshots the
//! pipeline at that moment: process-wide middlewares, then group middlewares, then the route's
//! own handlers. Middlewares added later only apply to routes registered later.
//!
//! # Example
//!
//! ```
//! use minnow_web::{handler_fn, Router};
//! use minnow_web::middleware::Recovery;
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.use_middleware(Recovery);
//! router.get("/user/:id", handler_fn(|ctx| async move { ctx.text("user") })).unwrap();
//!
//! let mut api = router.group("/api");
//! api.post("/login", handler_fn(|ctx| async move { ctx.text("login") })).unwrap();
//!
//! let matched = router.resolve(&Method::GET, "/USER/Alice").unwrap();
//! assert_eq!(matched.params().get("id"), Some("Alice"));
//! assert!(router.resolve(&Method::POST, "/api/login").is_some());
//! ```

macro_rules! method_routes {
    ($($name:ident => $method:ident),* $(,)?) => {
        $(
            #[doc = concat!("Registers a `", stringify!($method), "` route served by `handler`.")]
            pub fn $name<H: Handler + 'static>(&mut self, path: &str, handler: H) -> Result<(), RegistrationError> {
                let handler: $crate::SharedHandler = Arc::new(handler);
                self.handle(Method::$method, path, vec![handler])
            }
        )*
    };
}

mod group;
mod tree;

pub use group::Group;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::Method;
use tracing::debug;

use crate::context::PathParams;
use crate::error::RegistrationError;
use crate::handler::{Handler, Pipeline, SharedHandler};
use tree::Tree;

#[derive(Default)]
pub struct Router {
    trees: HashMap<Method, Tree>,
    middlewares: Vec<SharedHandler>,
}

/// The outcome of a successful resolution.
#[derive(Clone)]
pub struct RouteMatch {
    pipeline: Pipeline,
    params: PathParams,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a middleware in front of every route registered after this call.
    pub fn use_middleware<H: Handler + 'static>(&mut self, middleware: H) -> &mut Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Registers `handlers` for `method` and `path`, after the process-wide middlewares.
    pub fn handle(&mut self, method: Method, path: &str, handlers: Vec<SharedHandler>) -> Result<(), RegistrationError> {
        self.register(method, path, &[], handlers)
    }

    method_routes!(
        get => GET,
        post => POST,
        put => PUT,
        delete => DELETE,
        patch => PATCH,
        head => HEAD,
        options => OPTIONS,
    );

    /// Opens a group whose routes share `prefix` and the group's middlewares.
    pub fn group(&mut self, prefix: &str) -> Group<'_> {
        Group::new(self, prefix.to_owned(), Vec::new())
    }

    pub(crate) fn register(
        &mut self,
        method: Method,
        path: &str,
        scoped: &[SharedHandler],
        handlers: Vec<SharedHandler>,
    ) -> Result<(), RegistrationError> {
        let pipeline: Pipeline = self.middlewares.iter().chain(scoped).cloned().chain(handlers).collect();
        let handler_count = pipeline.len();

        self.trees.entry(method.clone()).or_default().insert(&method, path, pipeline)?;
        debug!(%method, path, handler_count, "add router");
        Ok(())
    }

    /// Finds the pipeline registered for `method` and `path`.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let (pipeline, params) = self.trees.get(method)?.resolve(path)?;
        Some(RouteMatch { pipeline, params })
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("trees", &self.trees).field("middlewares", &self.middlewares.len()).finish()
    }
}

impl RouteMatch {
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub fn into_parts(self) -> (Pipeline, PathParams) {
        (self.pipeline, self.params)
    }
}

impl fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch").field("handlers", &self.pipeline.len()).field("params", &self.params).finish()
    }
}
