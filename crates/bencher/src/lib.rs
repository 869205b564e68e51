//! Shared fixtures for the minnow benchmarks.

/// A raw HTTP request used as decoder input.
#[derive(Debug, Copy, Clone)]
pub struct RequestFixture {
    name: &'static str,
    content: &'static str,
}

impl RequestFixture {
    pub const fn new(name: &'static str, content: &'static str) -> Self {
        Self { name, content }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn has_body(&self) -> bool {
        self.content.split_once("\r\n\r\n").is_some_and(|(_, body)| !body.is_empty())
    }
}

pub const SMALL_GET: RequestFixture =
    RequestFixture::new("small_get", "GET /index.html HTTP/1.1\r\nHost: 127.0.0.1:8080\r\nAccept: */*\r\n\r\n");

pub const LARGE_GET: RequestFixture = RequestFixture::new(
    "large_get",
    concat!(
        "GET /repos/rust-lang/cargo/issues?state=open&sort=updated&per_page=100 HTTP/1.1\r\n",
        "Host: api.example.com\r\n",
        "User-Agent: Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36\r\n",
        "Accept: text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8\r\n",
        "Accept-Language: en-US,en;q=0.9,zh-CN;q=0.8\r\n",
        "Accept-Encoding: gzip, deflate, br\r\n",
        "Cache-Control: max-age=0\r\n",
        "Connection: keep-alive\r\n",
        "Cookie: session=4f1c2a9d8e7b6a5f; theme=dark; lang=en; tracking=off\r\n",
        "Referer: https://example.com/dashboard/projects/minnow/settings\r\n",
        "X-Forwarded-For: 203.0.113.7, 198.51.100.2\r\n",
        "X-Request-Id: 0b3d7c55-6a1e-4c8f-9f2e-51b7d0e6c4aa\r\n",
        "Sec-Fetch-Dest: document\r\n",
        "Sec-Fetch-Mode: navigate\r\n",
        "Sec-Fetch-Site: same-origin\r\n",
        "Upgrade-Insecure-Requests: 1\r\n",
        "\r\n"
    ),
);

pub const JSON_POST: RequestFixture = RequestFixture::new(
    "json_post",
    concat!(
        "POST /user HTTP/1.1\r\n",
        "Host: 127.0.0.1:8080\r\n",
        "Content-Type: application/json\r\n",
        "Content-Length: 30\r\n",
        "\r\n",
        r#"{"name":"hello","zip":"world"}"#
    ),
);

pub const REQUEST_FIXTURES: [RequestFixture; 3] = [SMALL_GET, LARGE_GET, JSON_POST];

/// Routes registered on the benchmark router, shaped like a typical REST API.
pub const ROUTES: &[&str] = &[
    "/",
    "/login",
    "/logout",
    "/user",
    "/user/:id",
    "/user/:id/profile",
    "/user/:id/followers",
    "/user/:id/following",
    "/user/me",
    "/user/me/settings",
    "/repos/:owner/:repo",
    "/repos/:owner/:repo/issues",
    "/repos/:owner/:repo/issues/:number",
    "/repos/:owner/:repo/issues/:number/comments",
    "/repos/:owner/:repo/pulls",
    "/repos/:owner/:repo/pulls/:number",
    "/repos/:owner/:repo/contents/:path",
    "/orgs/:org",
    "/orgs/:org/members",
    "/orgs/:org/repos",
    "/search/code",
    "/search/issues",
    "/search/users",
    "/static/css/site.css",
    "/static/js/app.js",
];

/// A request path to resolve and a short name for reports.
#[derive(Debug, Copy, Clone)]
pub struct Lookup {
    pub name: &'static str,
    pub path: &'static str,
}

pub const LOOKUPS: &[Lookup] = &[
    Lookup { name: "root", path: "/" },
    Lookup { name: "static", path: "/static/js/app.js" },
    Lookup { name: "literal_over_param", path: "/user/me/settings" },
    Lookup { name: "one_param", path: "/user/42" },
    Lookup { name: "deep_params", path: "/repos/rust-lang/cargo/issues/1234/comments" },
    Lookup { name: "mixed_case", path: "/SEARCH/Issues" },
    Lookup { name: "miss", path: "/repos/rust-lang/cargo/unknown" },
];
