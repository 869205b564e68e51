//! The seam between the wire layer and an application.
//!
//! A [`Handler`] receives a fully buffered request and produces a fully buffered response.
//! Errors returned by a handler are logged by the connection and answered with `500`.

use std::error::Error;
use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};

#[async_trait]
pub trait Handler: Send + Sync {
    type Error: Into<Box<dyn Error + Send + Sync>>;

    async fn call(&self, req: Request<Bytes>) -> Result<Response<Bytes>, Self::Error>;
}

pub struct HandlerFn<F> {
    f: F,
}

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}

#[async_trait]
impl<Err, F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request<Bytes>) -> Fut + Send + Sync,
    Err: Into<Box<dyn Error + Send + Sync>>,
    Fut: Future<Output = Result<Response<Bytes>, Err>> + Send,
{
    type Error = Err;

    async fn call(&self, req: Request<Bytes>) -> Result<Response<Bytes>, Self::Error> {
        (self.f)(req).await
    }
}

/// Turns an async function into a [`Handler`].
pub fn make_handler<F, Err, Ret>(f: F) -> HandlerFn<F>
where
    Err: Into<Box<dyn Error + Send + Sync>>,
    Ret: Future<Output = Result<Response<Bytes>, Err>>,
    F: Fn(Request<Bytes>) -> Ret,
{
    HandlerFn { f }
}
