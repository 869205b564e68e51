//! The per-request execution context.
//!
//! A [`Context`] is created for every resolved request and shared by all handlers of its
//! pipeline through an `Arc`. It carries:
//! - the buffered inbound request and the captured [`PathParams`]
//! - the pipeline together with a forward cursor, advanced by [`Context::next`]
//! - the response sink, written at most once under a single-write guard
//! - an optional deadline and a cancellation token observed by cooperative handlers

mod params;
mod request;
mod response;

pub use params::FromParam;
pub use params::PathParams;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Request, Response, StatusCode};
use once_cell::sync::OnceCell;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::debug;

use crate::error::HandlerError;
use crate::handler::Pipeline;

type ParamMap = HashMap<String, Vec<String>>;

pub struct Context {
    request: Request<Bytes>,
    params: PathParams,
    pipeline: Pipeline,
    cursor: AtomicUsize,
    sink: Mutex<ResponseSink>,
    deadline: Option<Instant>,
    cancellation: CancellationToken,
    query: OnceCell<ParamMap>,
    form: OnceCell<ParamMap>,
}

#[derive(Debug, Default)]
struct ResponseSink {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Bytes>,
    finalized: bool,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("method", self.request.method())
            .field("uri", self.request.uri())
            .field("params", &self.params)
            .field("cursor", &self.cursor)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl Context {
    pub fn new(request: Request<Bytes>, pipeline: Pipeline, params: PathParams) -> Self {
        Self {
            request,
            params,
            pipeline,
            cursor: AtomicUsize::new(0),
            sink: Mutex::new(ResponseSink::default()),
            deadline: None,
            cancellation: CancellationToken::new(),
            query: OnceCell::new(),
            form: OnceCell::new(),
        }
    }

    /// Sets the instant after which the request is considered timed out.
    ///
    /// Every [`Timeout`](crate::middleware::Timeout) in the pipeline is capped by this deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Runs the next handler of the pipeline, if any.
    ///
    /// Returns once that handler, and everything it advanced into, has returned. Calling `next`
    /// after the last handler is a no-op.
    pub async fn next(self: &Arc<Self>) -> Result<(), HandlerError> {
        let index = self.cursor.fetch_add(1, Ordering::AcqRel);
        match self.pipeline.get(index) {
            Some(handler) => handler.call(Arc::clone(self)).await,
            None => {
                debug!(index, "advanced past the end of the pipeline");
                Ok(())
            }
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Resolves once the request has been abandoned, by a timeout or a fault in another task.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancellation.cancelled()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub(crate) fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Whether a response body has already been committed.
    pub fn is_finalized(&self) -> bool {
        self.sink().finalized
    }

    fn sink(&self) -> MutexGuard<'_, ResponseSink> {
        // the sink stays consistent even if a holder panicked: every write is a single assignment
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Commits `body` after letting `shape` adjust the pending status and headers.
    ///
    /// Returns `false` without touching the sink when a response was already committed.
    fn commit_with(&self, body: Bytes, shape: impl FnOnce(&mut ResponseSink)) -> bool {
        let mut sink = self.sink();
        if sink.finalized {
            debug!("response already committed, discard later write");
            return false;
        }
        shape(&mut sink);
        sink.body = Some(body);
        sink.finalized = true;
        true
    }

    fn commit(&self, content_type: &'static str, body: Bytes) -> bool {
        self.commit_with(body, |sink| {
            sink.headers.insert(http::header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        })
    }

    /// Commits a JSON `{"message": ..}` response with `status`, unless something was committed.
    pub(crate) fn commit_failure(&self, status: StatusCode, message: &str) -> bool {
        let body = serde_json::json!({ "message": message }).to_string();
        self.commit_with(Bytes::from(body), |sink| {
            sink.status = status;
            sink.headers.insert(http::header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
        })
    }

    /// Applies `update` to the pending head; a no-op once a response is committed.
    fn update_head(&self, update: impl FnOnce(&mut ResponseSink)) {
        let mut sink = self.sink();
        if sink.finalized {
            debug!("response already committed, ignore head update");
            return;
        }
        update(&mut sink);
    }

    /// Takes the committed response out of the sink.
    ///
    /// When nothing was committed the pending status and headers are returned with an empty body.
    /// The context stays finalized afterwards, so later emissions are still discarded.
    pub fn take_response(&self) -> Response<Bytes> {
        let mut sink = self.sink();
        sink.finalized = true;
        let mut response = Response::new(sink.body.take().unwrap_or_default());
        *response.status_mut() = std::mem::take(&mut sink.status);
        *response.headers_mut() = std::mem::take(&mut sink.headers);
        response
    }
}

pub(crate) const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";
