use std::fmt;
use std::sync::Arc;

use http::Method;

use super::Router;
use crate::error::RegistrationError;
use crate::handler::{Handler, SharedHandler};

/// Routes sharing a path prefix and a list of middlewares.
///
/// The prefix is prepended verbatim: group `/api` with route `/users` registers `/api/users`.
/// Group middlewares run after the router's process-wide middlewares and before the route's
/// own handlers.
pub struct Group<'r> {
    router: &'r mut Router,
    prefix: String,
    middlewares: Vec<SharedHandler>,
}

impl<'r> Group<'r> {
    pub(super) fn new(router: &'r mut Router, prefix: String, middlewares: Vec<SharedHandler>) -> Self {
        Self { router, prefix, middlewares }
    }

    /// Adds a middleware in front of every route registered on this group after this call.
    pub fn use_middleware<H: Handler + 'static>(&mut self, middleware: H) -> &mut Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn handle(&mut self, method: Method, path: &str, handlers: Vec<SharedHandler>) -> Result<(), RegistrationError> {
        let full_path = format!("{}{}", self.prefix, path);
        self.router.register(method, &full_path, &self.middlewares, handlers)
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

    /// Opens a sub-group inheriting this group's prefix and middlewares.
    pub fn group(&mut self, prefix: &str) -> Group<'_> {
        Group::new(&mut *self.router, format!("{}{}", self.prefix, prefix), self.middlewares.clone())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl fmt::Debug for Group<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group").field("prefix", &self.prefix).field("middlewares", &self.middlewares.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::handler::handler_fn;
    use crate::{RegistrationError, Router};
    use http::Method;
    use std::sync::Arc;

    async fn ok(ctx: Arc<Context>) -> Result<(), crate::HandlerError> {
        ctx.text("ok")
    }

    #[test]
    fn nested_groups_join_prefixes_and_middlewares() {
        let mut router = Router::new();
        let mut api = router.group("/api");
        api.use_middleware(handler_fn(ok));
        let mut v1 = api.group("/v1");
        v1.use_middleware(handler_fn(ok));
        v1.get("/users/:id", handler_fn(ok)).unwrap();
        assert_eq!(v1.prefix(), "/api/v1");

        let matched = router.resolve(&Method::GET, "/API/V1/users/3").unwrap();
        assert_eq!(matched.pipeline().len(), 3);
        assert_eq!(matched.params().get("id"), Some("3"));
    }

    #[test]
    fn group_routes_conflict_with_router_routes() {
        let mut router = Router::new();
        router.get("/api/ping", handler_fn(ok)).unwrap();

        let mut api = router.group("/api");
        assert!(matches!(api.get("/ping", handler_fn(ok)), Err(RegistrationError::RouteConflict { .. })));
        assert!(api.get("/pong", handler_fn(ok)).is_ok());
    }

    #[test]
    fn group_without_leading_slash_is_invalid() {
        let mut router = Router::new();
        let mut api = router.group("api");

        assert!(matches!(api.get("/ping", handler_fn(ok)), Err(RegistrationError::InvalidPath { .. })));
    }
}
