use std::sync::Arc;
use std::time::Duration;

use minnow_web::middleware::{Cost, Recovery, Timeout};
use minnow_web::{handler_fn, Context, Cookie, HandlerError, Router, Server};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Deserialize, Serialize, Debug)]
pub struct User {
    name: String,
    zip: String,
}

// curl -v http://127.0.0.1:8080/user/42?verbose=true
async fn get_user(ctx: Arc<Context>) -> Result<(), HandlerError> {
    let (id, _) = ctx.param_int64("id", 0);
    let (verbose, _) = ctx.query_bool("verbose", false);
    ctx.json(&serde_json::json!({ "id": id, "verbose": verbose, "client": ctx.client_ip() }))
}

// curl -v -H 'Content-Type: application/json' -d '{"name":"hello","zip":"world"}' http://127.0.0.1:8080/user
async fn create_user(ctx: Arc<Context>) -> Result<(), HandlerError> {
    let user: User = ctx.bind_json()?;
    ctx.set_status(http::StatusCode::CREATED).set_cookie(Cookie::new("user", user.name.clone()));
    ctx.json(&user)
}

// curl -v -d "name=hello&zip=world" http://127.0.0.1:8080/form
async fn submit_form(ctx: Arc<Context>) -> Result<(), HandlerError> {
    let (name, present) = ctx.form_string("name", "anonymous".to_owned());
    ctx.text(format!("receive name: {name}, present: {present}\r\n"))
}

// curl -v http://127.0.0.1:8080/slow
async fn slow(ctx: Arc<Context>) -> Result<(), HandlerError> {
    tokio::select! {
        () = tokio::time::sleep(Duration::from_secs(5)) => ctx.text("finished\r\n"),
        () = ctx.cancelled() => {
            info!("request abandoned, stop working");
            Ok(())
        }
    }
}

// curl -v http://127.0.0.1:8080/admin/hello?callback=show
async fn admin_hello(ctx: Arc<Context>) -> Result<(), HandlerError> {
    ctx.jsonp(&serde_json::json!({ "hello": "admin" }))
}

async fn admin_audit(ctx: Arc<Context>) -> Result<(), HandlerError> {
    info!(uri = %ctx.uri(), "admin access");
    ctx.next().await
}

#[tokio::main]
async fn main() {
    let mut router = Router::new();
    router.use_middleware(Cost).use_middleware(Recovery).use_middleware(Timeout::new(Duration::from_secs(1)));

    router.get("/user/:id", handler_fn(get_user)).unwrap();
    router.post("/user", handler_fn(create_user)).unwrap();
    router.post("/form", handler_fn(submit_form)).unwrap();
    router.get("/slow", handler_fn(slow)).unwrap();

    let mut admin = router.group("/admin");
    admin.use_middleware(handler_fn(admin_audit));
    admin.get("/hello", handler_fn(admin_hello)).unwrap();

    Server::builder()
        .router(router)
        .address("127.0.0.1:8080")
        .request_timeout(Duration::from_secs(3))
        .build()
        .unwrap()
        .start()
        .await;
}
