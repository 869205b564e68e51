use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::info;

use crate::context::Context;
use crate::error::HandlerError;
use crate::handler::Handler;

/// Logs the latency of everything after it in the pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cost;

#[async_trait]
impl Handler for Cost {
    async fn call(&self, ctx: Arc<Context>) -> Result<(), HandlerError> {
        let start = Instant::now();
        let result = ctx.next().await;
        info!(method = %ctx.method(), uri = %ctx.uri(), cost = ?start.elapsed(), "request finished");
        result
    }
}
