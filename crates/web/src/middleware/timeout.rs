use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use tokio::time::Instant;
use tokio_util::task::AbortOnDropHandle;
use tracing::{error, warn};

use super::recovery::panic_message;
use super::{INTERNAL_ERROR_MESSAGE, TIME_OUT_MESSAGE};
use crate::context::Context;
use crate::error::HandlerError;
use crate::handler::Handler;

/// Runs the rest of the chain on its own task under a time budget.
///
/// The budget is capped by the request deadline, if one was set. Whichever happens first
/// decides the response:
/// - the chain completes: its own response and result stand
/// - the chain panics: `500` with an internal error message
/// - the budget elapses: `504` with a time out message
///
/// The forced responses are committed only if the chain did not commit one already. After a
/// panic or a time out the request is cancelled and the task is aborted, so any later write
/// from the chain is discarded. The task is also aborted when the wrapper itself is dropped.
#[derive(Debug, Clone, Copy)]
pub struct Timeout {
    budget: Duration,
}

impl Timeout {
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }

    fn deadline_for(&self, ctx: &Context) -> Instant {
        let own = Instant::now() + self.budget;
        match ctx.deadline() {
            Some(request_deadline) => own.min(request_deadline),
            None => own,
        }
    }
}

#[async_trait]
impl Handler for Timeout {
    async fn call(&self, ctx: Arc<Context>) -> Result<(), HandlerError> {
        let deadline = self.deadline_for(&ctx);

        let chain = Arc::clone(&ctx);
        // dropping this future, e.g. under an outer timeout, aborts the chain as well
        let mut task = AbortOnDropHandle::new(tokio::spawn(async move { chain.next().await }));

        tokio::select! {
            biased;

            joined = &mut task => match joined {
                Ok(result) => result,
                Err(e) if e.is_panic() => {
                    let panic = e.into_panic();
                    error!(cause = panic_message(panic.as_ref()), uri = %ctx.uri(), "handler panicked");
                    ctx.cancel();
                    ctx.commit_failure(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE);
                    Ok(())
                }
                Err(e) => {
                    error!(cause = %e, uri = %ctx.uri(), "handler task was cancelled");
                    ctx.cancel();
                    ctx.commit_failure(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE);
                    Ok(())
                }
            },

            () = tokio::time::sleep_until(deadline) => {
                warn!(uri = %ctx.uri(), budget = ?self.budget, "request timed out");
                ctx.cancel();
                task.abort();
                ctx.commit_failure(StatusCode::GATEWAY_TIMEOUT, TIME_OUT_MESSAGE);
                Ok(())
            }
        }
    }
}
