use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use http::StatusCode;
use tracing::error;

use super::INTERNAL_ERROR_MESSAGE;
use crate::context::Context;
use crate::error::HandlerError;
use crate::handler::Handler;

/// Catches a panic raised by the rest of the chain on the current task.
///
/// The panic is answered with `500` unless a response was already committed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recovery;

#[async_trait]
impl Handler for Recovery {
    async fn call(&self, ctx: Arc<Context>) -> Result<(), HandlerError> {
        match AssertUnwindSafe(ctx.next()).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                error!(cause = panic_message(panic.as_ref()), uri = %ctx.uri(), "handler panicked");
                ctx.commit_failure(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE);
                Ok(())
            }
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PathParams;
    use crate::{handler_fn, handlers};
    use bytes::Bytes;
    use http::Request;

    async fn explode(_ctx: Arc<Context>) -> Result<(), HandlerError> {
        panic!("boom")
    }

    async fn send_then_explode(ctx: Arc<Context>) -> Result<(), HandlerError> {
        ctx.text("already sent")?;
        panic!("after emission")
    }

    fn run(pipeline: Vec<crate::SharedHandler>) -> Arc<Context> {
        let request = Request::builder().uri("/boom").body(Bytes::new()).unwrap();
        Arc::new(Context::new(request, Arc::from(pipeline), PathParams::empty()))
    }

    #[tokio::test]
    async fn panic_becomes_internal_error() {
        let ctx = run(handlers![Recovery, handler_fn(explode)]);

        ctx.next().await.unwrap();

        let response = ctx.take_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body().as_ref(), br#"{"message":"internal error"}"#);
    }

    #[tokio::test]
    async fn committed_response_survives_a_later_panic() {
        let ctx = run(handlers![Recovery, handler_fn(send_then_explode)]);

        ctx.next().await.unwrap();

        let response = ctx.take_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), b"already sent");
    }

    #[test]
    fn panic_payload_text() {
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
