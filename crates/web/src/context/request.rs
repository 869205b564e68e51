//! Read access to the inbound request.
//!
//! Typed accessors never fail: a missing or malformed value yields the caller's default
//! together with `false`.

use std::collections::HashMap;

use bytes::Bytes;
use cookie::Cookie;
use http::{HeaderMap, Method, Request, Uri};
use minnow_http::protocol::RemoteAddr;
use serde::de::DeserializeOwned;
use tracing::warn;

use super::{Context, FromParam, ParamMap, PathParams};
use crate::error::BindError;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

fn parse_pairs(raw: &[u8]) -> ParamMap {
    let pairs: Vec<(String, String)> = match serde_urlencoded::from_bytes(raw) {
        Ok(pairs) => pairs,
        Err(e) => {
            warn!(cause = %e, "can't decode urlencoded parameters");
            Vec::new()
        }
    };

    let mut map = ParamMap::new();
    for (key, value) in pairs {
        map.entry(key).or_default().push(value);
    }
    map
}

fn lookup<T: FromParam>(value: Option<&str>, default: T) -> (T, bool) {
    match value.and_then(T::from_param) {
        Some(value) => (value, true),
        None => (default, false),
    }
}

macro_rules! typed_accessors {
    ($source:ident => $($name:ident: $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("`", stringify!($source), "` converted to `", stringify!($ty), "`.")]
            pub fn $name(&self, key: &str, default: $ty) -> ($ty, bool) {
                self.$source(key, default)
            }
        )*
    };
}

impl Context {
    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn uri(&self) -> &Uri {
        self.request.uri()
    }

    /// The `Host` header, falling back to the authority of the request target.
    pub fn host(&self) -> Option<&str> {
        self.header(http::header::HOST.as_str()).or_else(|| self.request.uri().host())
    }

    /// The address of the client: the first `X-Forwarded-For` entry, then `X-Real-IP`, then
    /// the peer address of the connection.
    pub fn client_ip(&self) -> Option<String> {
        if let Some(forwarded) = self.header(X_FORWARDED_FOR) {
            if let Some(first) = forwarded.split(',').map(str::trim).find(|ip| !ip.is_empty()) {
                return Some(first.to_owned());
            }
        }

        if let Some(real_ip) = self.header(X_REAL_IP).map(str::trim).filter(|ip| !ip.is_empty()) {
            return Some(real_ip.to_owned());
        }

        self.request.extensions().get::<RemoteAddr>().map(|addr| addr.0.ip().to_string())
    }

    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    /// The first value of header `key`, if it is valid visible ASCII.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.request.headers().get(key).and_then(|value| value.to_str().ok())
    }

    /// All cookies sent with the request, by name.
    pub fn cookies(&self) -> HashMap<String, String> {
        self.request
            .headers()
            .get_all(http::header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .map(|cookie| (cookie.name().to_owned(), cookie.value().to_owned()))
            .collect()
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies().remove(name)
    }

    /// The raw request body.
    pub fn raw_body(&self) -> &Bytes {
        self.request.body()
    }

    /// Decodes the body as JSON.
    pub fn bind_json<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        let body = self.non_empty_body()?;
        Ok(serde_json::from_slice(body)?)
    }

    /// Decodes the body as XML.
    pub fn bind_xml<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        let body = self.non_empty_body()?;
        Ok(quick_xml::de::from_reader(body)?)
    }

    fn non_empty_body(&self) -> Result<&[u8], BindError> {
        let body = self.request.body();
        if body.is_empty() {
            return Err(BindError::EmptyBody);
        }
        Ok(body)
    }

    pub fn path_params(&self) -> &PathParams {
        &self.params
    }

    /// Query parameters, decoded once per request.
    pub fn query_all(&self) -> &HashMap<String, Vec<String>> {
        self.query.get_or_init(|| parse_pairs(self.request.uri().query().unwrap_or_default().as_bytes()))
    }

    /// Form fields of an `application/x-www-form-urlencoded` body, decoded once per request.
    ///
    /// Any other body yields no fields.
    pub fn form_all(&self) -> &HashMap<String, Vec<String>> {
        self.form.get_or_init(|| {
            let is_form = self
                .header(http::header::CONTENT_TYPE.as_str())
                .and_then(|value| value.parse::<mime::Mime>().ok())
                .is_some_and(|content_type| content_type.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str());

            if is_form { parse_pairs(self.request.body()) } else { ParamMap::new() }
        })
    }

    /// The first value of query parameter `key`, converted to `T`.
    pub fn query<T: FromParam>(&self, key: &str, default: T) -> (T, bool) {
        lookup(first(self.query_all(), key), default)
    }

    /// The first value of form field `key`, converted to `T`.
    pub fn form<T: FromParam>(&self, key: &str, default: T) -> (T, bool) {
        lookup(first(self.form_all(), key), default)
    }

    /// Path parameter `key`, converted to `T`.
    pub fn param<T: FromParam>(&self, key: &str, default: T) -> (T, bool) {
        lookup(self.params.get(key), default)
    }

    /// Every value of query parameter `key`.
    pub fn query_string_slice(&self, key: &str, default: Vec<String>) -> (Vec<String>, bool) {
        match self.query_all().get(key) {
            Some(values) => (values.clone(), true),
            None => (default, false),
        }
    }

    /// Every value of form field `key`.
    pub fn form_string_slice(&self, key: &str, default: Vec<String>) -> (Vec<String>, bool) {
        match self.form_all().get(key) {
            Some(values) => (values.clone(), true),
            None => (default, false),
        }
    }

    typed_accessors!(query =>
        query_int: isize,
        query_int64: i64,
        query_float32: f32,
        query_float64: f64,
        query_bool: bool,
        query_string: String,
    );

    typed_accessors!(form =>
        form_int: isize,
        form_int64: i64,
        form_float32: f32,
        form_float64: f64,
        form_bool: bool,
        form_string: String,
    );

    typed_accessors!(param =>
        param_int: isize,
        param_int64: i64,
        param_float32: f32,
        param_float64: f64,
        param_bool: bool,
        param_string: String,
    );
}

fn first<'a>(map: &'a HashMap<String, Vec<String>>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(|values| values.first()).map(String::as_str)
}
