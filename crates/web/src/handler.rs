use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::HandlerError;

/// One stage of a request pipeline.
///
/// Middlewares and endpoints share this trait. A handler continues the chain by awaiting
/// [`Context::next`]; whatever it does after that await runs once every later handler has
/// returned. Not calling `next` skips the rest of the pipeline.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, ctx: Arc<Context>) -> Result<(), HandlerError>;
}

/// A handler shared between every route whose pipeline contains it.
pub type SharedHandler = Arc<dyn Handler>;

/// An ordered, immutable list of handlers attached to a route.
pub type Pipeline = Arc<[SharedHandler]>;

/// a `Fn` holder which represents any async closure taking the request context
pub struct FnHandler<F> {
    f: F,
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Arc<Context>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    async fn call(&self, ctx: Arc<Context>) -> Result<(), HandlerError> {
        (self.f)(ctx).await
    }
}

pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Arc<Context>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    FnHandler { f }
}

/// Collects handlers of different types into a `Vec<SharedHandler>`.
///
/// ```
/// use minnow_web::{handler_fn, handlers, middleware::Cost};
///
/// let pipeline = handlers![Cost, handler_fn(|ctx| async move { ctx.text("ok") })];
/// assert_eq!(pipeline.len(), 2);
/// ```
#[macro_export]
macro_rules! handlers {
    ($($handler:expr),* $(,)?) => {
        vec![$(::std::sync::Arc::new($handler) as $crate::SharedHandler),*]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_is_handler<T: Handler>(_handler: &T) {
        // no op
    }

    #[test]
    fn closure_is_handler() {
        let handler = handler_fn(|ctx: Arc<Context>| async move { ctx.next().await });
        assert_is_handler(&handler);
    }

    #[test]
    fn handlers_macro_erases_types() {
        let pipeline = handlers![
            handler_fn(|ctx: Arc<Context>| async move { ctx.next().await }),
            handler_fn(|ctx: Arc<Context>| async move { ctx.text("done") }),
        ];
        assert_eq!(pipeline.len(), 2);
    }
}
