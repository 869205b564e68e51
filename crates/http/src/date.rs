//! HTTP `Date` header value management.
//!
//! Formatting the date for every response is wasteful when thousands of responses share the
//! same second. [`DateService`] keeps the last formatted value and refreshes it at most once
//! per [`UPDATE_INTERVAL`], so concurrent connections read it without locking.

use arc_swap::ArcSwap;
use bytes::Bytes;
use http::HeaderValue;
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// How long a formatted date stays valid before it is formatted again
pub const UPDATE_INTERVAL: Duration = Duration::from_millis(800);

static DATE_SERVICE: Lazy<DateService> = Lazy::new(DateService::new);

/// Caches the current HTTP date string.
#[derive(Debug)]
pub struct DateService {
    current: ArcSwap<CachedDate>,
}

#[derive(Debug)]
struct CachedDate {
    formatted_at: Instant,
    value: Option<HeaderValue>,
}

impl DateService {
    /// Returns a reference to the global singleton instance of `DateService`.
    pub fn get_global_instance() -> &'static DateService {
        &DATE_SERVICE
    }

    fn new() -> Self {
        Self { current: ArcSwap::from_pointee(CachedDate::now()) }
    }

    /// Returns the current date formatted for the `Date` header.
    ///
    /// Returns `None` only if the formatted date could not be turned into a header value.
    pub fn http_date(&self) -> Option<HeaderValue> {
        let cached = self.current.load();
        if cached.formatted_at.elapsed() < UPDATE_INTERVAL {
            return cached.value.clone();
        }

        let fresh = CachedDate::now();
        let value = fresh.value.clone();
        self.current.store(Arc::new(fresh));
        value
    }
}

impl CachedDate {
    fn now() -> Self {
        let mut buf = faf_http_date::get_date_buff_no_key();
        faf_http_date::get_date_no_key(&mut buf);

        let value = match HeaderValue::from_maybe_shared(Bytes::from_owner(buf)) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(cause = %e, "formatted http date is not a valid header value");
                None
            }
        };

        Self { formatted_at: Instant::now(), value }
    }
}
