//! Built-in middlewares.
//!
//! Each is a [`Handler`](crate::Handler) meant to sit in front of the handlers it wraps, usually
//! registered with [`Router::use_middleware`](crate::Router::use_middleware):
//! - [`Timeout`] bounds the rest of the chain and isolates its panics on a separate task
//! - [`Recovery`] turns a panic in the rest of the chain into a `500`
//! - [`Cost`] logs how long the rest of the chain took

mod cost;
mod recovery;
mod timeout;

pub use cost::Cost;
pub use recovery::Recovery;
pub use timeout::Timeout;

pub(crate) use recovery::panic_message;

pub(crate) const INTERNAL_ERROR_MESSAGE: &str = "internal error";
pub(crate) const TIME_OUT_MESSAGE: &str = "time out";
