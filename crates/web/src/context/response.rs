//! Response emission.
//!
//! Body emitters commit through the single-write guard: the first one wins and every later
//! emission is silently discarded. Head setters shape the response until it is committed and
//! are ignored afterwards.

use bytes::Bytes;
use cookie::Cookie;
use http::{HeaderName, HeaderValue, StatusCode};
use serde::Serialize;
use tracing::warn;

use super::{CONTENT_TYPE_JSON, Context};
use crate::error::HandlerError;

const CONTENT_TYPE_JAVASCRIPT: &str = "application/javascript; charset=utf-8";
const CONTENT_TYPE_XML: &str = "application/xml; charset=utf-8";
const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";
const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

const JSONP_CALLBACK_QUERY: &str = "callback";
const JSONP_DEFAULT_CALLBACK: &str = "callback_function";

/// Keeps only characters allowed in a dotted JavaScript identifier.
fn sanitize_callback(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$')).collect()
}

impl Context {
    pub fn set_status(&self, status: StatusCode) -> &Self {
        self.update_head(|sink| sink.status = status);
        self
    }

    /// Sets a response header, replacing any previous value.
    ///
    /// Invalid names or values are logged and ignored.
    pub fn set_header<K, V>(&self, key: K, value: V) -> &Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: std::fmt::Display,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: std::fmt::Display,
    {
        let name = match HeaderName::try_from(key) {
            Ok(name) => name,
            Err(e) => {
                warn!(cause = %e, "invalid response header name");
                return self;
            }
        };
        let value = match HeaderValue::try_from(value) {
            Ok(value) => value,
            Err(e) => {
                warn!(cause = %e, header = %name, "invalid response header value");
                return self;
            }
        };

        self.update_head(|sink| {
            sink.headers.insert(name, value);
        });
        self
    }

    /// Appends a `Set-Cookie` header. A cookie without a path gets `/`.
    pub fn set_cookie(&self, mut cookie: Cookie<'_>) -> &Self {
        if cookie.path().is_none() {
            cookie.set_path("/");
        }

        match HeaderValue::try_from(cookie.to_string()) {
            Ok(value) => self.update_head(|sink| {
                sink.headers.append(http::header::SET_COOKIE, value);
            }),
            Err(e) => warn!(cause = %e, name = cookie.name(), "invalid cookie"),
        }
        self
    }

    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), HandlerError> {
        let body = serde_json::to_vec(value).map_err(HandlerError::render)?;
        self.commit(CONTENT_TYPE_JSON, Bytes::from(body));
        Ok(())
    }

    /// Emits `value` as JSON wrapped in the function named by the `callback` query parameter.
    pub fn jsonp<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), HandlerError> {
        let (callback, _) = self.query_string(JSONP_CALLBACK_QUERY, JSONP_DEFAULT_CALLBACK.to_owned());
        let mut callback = sanitize_callback(&callback);
        if callback.is_empty() {
            callback = JSONP_DEFAULT_CALLBACK.to_owned();
        }

        let json = serde_json::to_string(value).map_err(HandlerError::render)?;
        self.commit(CONTENT_TYPE_JAVASCRIPT, Bytes::from(format!("{callback}({json});")));
        Ok(())
    }

    pub fn xml<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), HandlerError> {
        let body = quick_xml::se::to_string(value).map_err(HandlerError::render)?;
        self.commit(CONTENT_TYPE_XML, Bytes::from(body));
        Ok(())
    }

    /// Renders the template `source` with `data` and emits it as HTML.
    pub fn html<T: Serialize>(&self, source: &str, data: T) -> Result<(), HandlerError> {
        let env = minijinja::Environment::new();
        let body = env.render_str(source, data).map_err(HandlerError::render)?;
        self.commit(CONTENT_TYPE_HTML, Bytes::from(body));
        Ok(())
    }

    pub fn text(&self, body: impl Into<String>) -> Result<(), HandlerError> {
        self.commit(CONTENT_TYPE_TEXT, Bytes::from(body.into()));
        Ok(())
    }

    /// Emits a `302 Found` pointing at `location`.
    pub fn redirect(&self, location: &str) -> Result<(), HandlerError> {
        let location = HeaderValue::try_from(location).map_err(HandlerError::render)?;
        self.commit_with(Bytes::new(), |sink| {
            sink.status = StatusCode::FOUND;
            sink.headers.insert(http::header::LOCATION, location);
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PathParams;
    use http::Request;
    use std::sync::Arc;

    #[derive(Serialize)]
    struct Greeting {
        name: &'static str,
    }

    fn context(uri: &str) -> Context {
        let request = Request::builder().uri(uri).body(Bytes::new()).unwrap();
        Context::new(request, Arc::from(Vec::new()), PathParams::empty())
    }

    fn header<'a>(response: &'a http::Response<Bytes>, name: http::header::HeaderName) -> &'a str {
        response.headers().get(name).unwrap().to_str().unwrap()
    }

    #[test]
    fn json_with_status_and_header() {
        let ctx = context("/");
        ctx.set_status(StatusCode::CREATED).set_header("x-request-id", "abc");
        ctx.json(&Greeting { name: "minnow" }).unwrap();

        let response = ctx.take_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(header(&response, http::header::CONTENT_TYPE), CONTENT_TYPE_JSON);
        assert_eq!(header(&response, HeaderName::from_static("x-request-id")), "abc");
        assert_eq!(response.body().as_ref(), br#"{"name":"minnow"}"#);
    }

    #[test]
    fn second_emission_is_discarded() {
        let ctx = context("/");
        ctx.text("first").unwrap();
        ctx.json(&Greeting { name: "second" }).unwrap();
        ctx.set_status(StatusCode::IM_A_TEAPOT).set_header("x-late", "1");

        let response = ctx.take_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response, http::header::CONTENT_TYPE), CONTENT_TYPE_TEXT);
        assert!(response.headers().get("x-late").is_none());
        assert_eq!(response.body().as_ref(), b"first");
    }

    #[test]
    fn invalid_header_is_ignored() {
        let ctx = context("/");
        ctx.set_header("bad header", "v").set_header("x-ok", "line\nbreak");
        ctx.text("body").unwrap();

        let response = ctx.take_response();
        assert!(response.headers().get("x-ok").is_none());
    }

    #[test]
    fn jsonp_uses_sanitized_callback() {
        let ctx = context("/?callback=app.handle%28alert%29");
        ctx.jsonp(&Greeting { name: "x" }).unwrap();
        let response = ctx.take_response();
        assert_eq!(response.body().as_ref(), br#"app.handlealert({"name":"x"});"#);
        assert_eq!(header(&response, http::header::CONTENT_TYPE), CONTENT_TYPE_JAVASCRIPT);

        let ctx = context("/");
        ctx.jsonp(&Greeting { name: "x" }).unwrap();
        assert_eq!(ctx.take_response().body().as_ref(), br#"callback_function({"name":"x"});"#);
    }

    #[test]
    fn xml_body() {
        let ctx = context("/");
        ctx.xml(&Greeting { name: "minnow" }).unwrap();

        let response = ctx.take_response();
        assert_eq!(response.body().as_ref(), b"<Greeting><name>minnow</name></Greeting>");
    }

    #[test]
    fn html_template() {
        let ctx = context("/");
        ctx.html("<h1>Hello {{ name }}</h1>", Greeting { name: "minnow" }).unwrap();

        let response = ctx.take_response();
        assert_eq!(header(&response, http::header::CONTENT_TYPE), CONTENT_TYPE_HTML);
        assert_eq!(response.body().as_ref(), b"<h1>Hello minnow</h1>");
    }

    #[test]
    fn broken_template_is_a_render_error() {
        let ctx = context("/");
        let result = ctx.html("{% if %}", Greeting { name: "x" });

        assert!(matches!(result, Err(HandlerError::Render { .. })));
        assert!(!ctx.is_finalized());
    }

    #[test]
    fn redirect_is_found() {
        let ctx = context("/");
        ctx.redirect("/login").unwrap();

        let response = ctx.take_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(header(&response, http::header::LOCATION), "/login");
        assert!(response.body().is_empty());
    }

    #[test]
    fn cookies_default_to_root_path() {
        let ctx = context("/");
        ctx.set_cookie(Cookie::new("session", "abc")).set_cookie(Cookie::build(("theme", "dark")).path("/app").build());
        ctx.text("ok").unwrap();

        let response = ctx.take_response();
        let cookies = response.headers().get_all(http::header::SET_COOKIE).iter().map(|v| v.to_str().unwrap()).collect::<Vec<_>>();
        assert_eq!(cookies, ["session=abc; Path=/", "theme=dark; Path=/app"]);
    }
}
