//! Runs a few in-memory requests through a pipeline and prints the responses.
//!
//! cargo run -p relay-web --example getting_started

use bytes::Bytes;
use http::{Method, StatusCode};
use relay_http::protocol::Body;
use relay_web::interceptor::{Next, TraceInterceptor, interceptor_fn};
use relay_web::responder::{Json, Responder};
use relay_web::router::{Router, get, post};
use relay_web::{Pipeline, Request, handler_fn, try_handler_fn};
use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Deserialize, Serialize, Debug)]
struct User {
    name: String,
    zip: String,
}

async fn show_user(req: Request) -> String {
    format!("user {}\n", req.param("id").unwrap_or_default())
}

async fn create_user(req: Request) -> Result<Json<User>, relay_web::WebError> {
    let user = req.body_as::<User>()?;
    Ok(Json(user))
}

async fn upload(req: Request) -> String {
    match req.body() {
        Body::Multipart(multipart) => multipart
            .files()
            .iter()
            .map(|file| format!("{} ({}, {} bytes)\n", file.filename(), file.content_type(), file.size()))
            .collect(),
        _ => "expected a multipart body\n".to_string(),
    }
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let require_token = interceptor_fn(|req: Request, next: Next| async move {
        if req.header("authorization").is_none() {
            return Ok((StatusCode::UNAUTHORIZED, "missing token\n").response_to());
        }
        next.run(req).await
    });

    let router = Router::builder()
        .prefix("/api")
        .intercept(TraceInterceptor)
        .route("/users/{id}", get(handler_fn(show_user)))
        .route("/users", post(try_handler_fn(create_user)))
        .route("/uploads", post(handler_fn(upload)).with(require_token))
        .build()
        .expect("routes are valid");

    let pipeline = Pipeline::builder().router(router).build().expect("router is set");

    let upload_body = "--x\r\nContent-Disposition: form-data; name=\"doc\"; filename=\"a.txt\"\r\n\r\nhello\r\n--x--\r\n";
    let requests = [
        http::Request::get("/api/users/42").body(Bytes::new()),
        http::Request::post("/api/users")
            .header("content-type", "application/json")
            .body(Bytes::from_static(br#"{"name":"hello","zip":"world"}"#)),
        http::Request::post("/api/users").header("content-type", "application/json").body(Bytes::from_static(b"{invalid")),
        http::Request::post("/api/uploads")
            .header("content-type", "multipart/form-data; boundary=x")
            .body(Bytes::from_static(upload_body.as_bytes())),
        http::Request::post("/api/uploads")
            .header("authorization", "Bearer demo")
            .header("content-type", "multipart/form-data; boundary=x")
            .body(Bytes::from_static(upload_body.as_bytes())),
        http::Request::builder().method(Method::DELETE).uri("/api/users/42").body(Bytes::new()),
    ];

    for request in requests {
        let request = request.expect("demo request is valid");
        let line = format!("{} {}", request.method(), request.uri());

        let response = pipeline.handle(request).await;
        println!("{line} -> {}\n{}", response.status(), String::from_utf8_lossy(response.body().bytes()));
    }
}
