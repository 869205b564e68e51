//! Error types surfaced by the router, the request context and handlers.

use std::error::Error;

use http::Method;
use thiserror::Error;

/// Returned when a route cannot be added to the [`Router`](crate::Router).
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("route {method} {path} conflicts with an already registered route")]
    RouteConflict { method: Method, path: String },

    #[error("invalid route path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },
}

impl RegistrationError {
    pub(crate) fn route_conflict(method: &Method, path: impl Into<String>) -> Self {
        Self::RouteConflict { method: method.clone(), path: path.into() }
    }

    pub(crate) fn invalid_path(path: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidPath { path: path.into(), reason }
    }
}

/// Decoding the request body into a typed value failed.
#[derive(Error, Debug)]
pub enum BindError {
    #[error("request body is empty")]
    EmptyBody,

    #[error("malformed json body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed xml body: {0}")]
    Xml(#[from] quick_xml::DeError),
}

/// The failure a handler returns to the handler that advanced into it.
///
/// A `HandlerError` that reaches the dispatcher is logged and answered with `500` unless a
/// response was already committed.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error(transparent)]
    Bind(#[from] BindError),

    #[error("render response error: {reason}")]
    Render { reason: String },

    #[error(transparent)]
    Custom(Box<dyn Error + Send + Sync>),
}

impl HandlerError {
    pub fn render(reason: impl ToString) -> Self {
        Self::Render { reason: reason.to_string() }
    }

    pub fn custom<E: Into<Box<dyn Error + Send + Sync>>>(error: E) -> Self {
        Self::Custom(error.into())
    }
}

/// Missing configuration when building a [`Server`](crate::Server).
#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("router must be set")]
    MissingRouter,

    #[error("address must be set")]
    MissingAddress,

    #[error("address can't be resolved: {0}")]
    InvalidAddress(#[from] std::io::Error),
}
