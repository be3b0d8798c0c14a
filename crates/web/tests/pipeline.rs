use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderValue, Method, StatusCode};
use indoc::indoc;
use relay_http::codec::{DecoderRegistry, MultipartConfig, fn_decoder};
use relay_http::protocol::Body;
use relay_web::interceptor::{Interceptor, Next, interceptor_fn};
use relay_web::responder::{Json, Responder};
use relay_web::router::{Router, get, post, put};
use relay_web::{HandlerResult, Pipeline, Request, handler_fn};
use serde_json::{Value, json};

type Log = Arc<Mutex<Vec<&'static str>>>;

struct Mark {
    name: &'static str,
    log: Log,
}

#[async_trait]
impl Interceptor for Mark {
    async fn intercept(&self, req: Request, next: Next) -> HandlerResult {
        self.log.lock().unwrap().push(self.name);
        next.run(req).await
    }
}

fn mark(name: &'static str, log: &Log) -> Mark {
    Mark { name, log: Arc::clone(log) }
}

fn crlf(payload: &str) -> Bytes {
    Bytes::from(payload.replace('\n', "\r\n"))
}

fn request(method: Method, uri: &str, content_type: Option<&str>, body: Bytes) -> http::Request<Bytes> {
    let mut builder = http::Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header(http::header::CONTENT_TYPE, content_type);
    }
    builder.body(body).unwrap()
}

/// Echoes the decoded body back as json.
async fn echo(req: Request) -> Value {
    match req.into_body() {
        Body::Map(map) => json!({ "kind": "map", "value": map }),
        Body::Json(value) => json!({ "kind": "json", "value": value }),
        Body::Text(text) => json!({ "kind": "text", "value": text }),
        Body::Bytes(bytes) => json!({ "kind": "bytes", "len": bytes.len() }),
        Body::Multipart(multipart) => {
            let files = multipart
                .files()
                .iter()
                .map(|file| json!({ "field": file.field_name(), "filename": file.filename(), "size": file.size() }))
                .collect::<Vec<_>>();
            json!({ "kind": "multipart", "fields": multipart.fields(), "files": files })
        }
    }
}

fn echo_pipeline(config: MultipartConfig) -> Pipeline {
    let router = Router::builder().route("/echo", post(handler_fn(echo))).build().unwrap();
    Pipeline::builder().router(router).decoders(DecoderRegistry::with_defaults(config)).build().unwrap()
}

fn json_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn json_body_is_decoded_once_before_dispatch() {
    let pipeline = echo_pipeline(MultipartConfig::default());

    let response = pipeline.handle(request(Method::POST, "/echo", Some("application/json"), Bytes::from_static(br#"{"a":1}"#))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(http::header::CONTENT_TYPE).unwrap(), "application/json");
    assert_eq!(json_body(response.body().bytes()), json!({ "kind": "map", "value": { "a": 1 } }));
}

#[tokio::test]
async fn malformed_json_is_400() {
    let pipeline = echo_pipeline(MultipartConfig::default());

    let response = pipeline.handle(request(Method::POST, "/echo", Some("application/json"), Bytes::from_static(b"{invalid"))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn form_and_text_bodies() {
    let pipeline = echo_pipeline(MultipartConfig::default());

    let response = pipeline
        .handle(request(
            Method::POST,
            "/echo",
            Some("application/x-www-form-urlencoded"),
            Bytes::from_static(b"name=juan&city=bogota"),
        ))
        .await;
    assert_eq!(json_body(response.body().bytes()), json!({ "kind": "map", "value": { "name": "juan", "city": "bogota" } }));

    let response =
        pipeline.handle(request(Method::POST, "/echo", Some("text/plain; charset=utf-8"), Bytes::from_static(b"hi there"))).await;
    assert_eq!(json_body(response.body().bytes()), json!({ "kind": "text", "value": "hi there" }));
}

#[tokio::test]
async fn text_body_never_fails_to_decode() {
    let pipeline = echo_pipeline(MultipartConfig::default());

    let response =
        pipeline.handle(request(Method::POST, "/echo", Some("text/plain; charset=iso-8859-1"), Bytes::from_static(b"caf\xe9"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response.body().bytes()), json!({ "kind": "text", "value": "café" }));

    let response = pipeline.handle(request(Method::POST, "/echo", Some("text/plain"), Bytes::from_static(b"caf\xe9"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response.body().bytes()), json!({ "kind": "text", "value": "caf\u{fffd}" }));
}

#[tokio::test]
async fn unknown_content_type_keeps_raw_bytes() {
    let pipeline = echo_pipeline(MultipartConfig::default());

    let response =
        pipeline.handle(request(Method::POST, "/echo", Some("application/octet-stream"), Bytes::from_static(&[0, 159, 146, 150]))).await;
    assert_eq!(json_body(response.body().bytes()), json!({ "kind": "bytes", "len": 4 }));
}

#[tokio::test]
async fn empty_body_is_an_empty_map() {
    let pipeline = echo_pipeline(MultipartConfig::default());

    let response = pipeline.handle(request(Method::POST, "/echo", Some("application/json"), Bytes::new())).await;
    assert_eq!(json_body(response.body().bytes()), json!({ "kind": "map", "value": {} }));
}

#[tokio::test]
async fn multipart_fields_and_files() {
    let pipeline = echo_pipeline(MultipartConfig::default());
    let payload = crlf(indoc! {r#"
        --XyZ
        Content-Disposition: form-data; name="name"

        juan
        --XyZ
        Content-Disposition: form-data; name="file"; filename="a.txt"
        Content-Type: text/plain

        hello
        --XyZ--
    "#});

    let response = pipeline.handle(request(Method::POST, "/echo", Some("multipart/form-data; boundary=XyZ"), payload)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response.body().bytes()),
        json!({
            "kind": "multipart",
            "fields": { "name": "juan" },
            "files": [{ "field": "file", "filename": "a.txt", "size": 5 }],
        })
    );
}

#[tokio::test]
async fn multipart_limits_map_to_status_codes() {
    let pipeline = echo_pipeline(MultipartConfig::default().with_max_file_size(4).with_max_header_size(128));
    let content_type = Some("multipart/form-data; boundary=XyZ");

    let file = crlf(indoc! {r#"
        --XyZ
        Content-Disposition: form-data; name="file"; filename="a.txt"

        hello
        --XyZ--
    "#});
    let response = pipeline.handle(request(Method::POST, "/echo", content_type, file)).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let long_header = format!(
        "--XyZ\r\nContent-Disposition: form-data; name=\"a\"\r\nX-Padding: {}\r\n\r\nv\r\n--XyZ--\r\n",
        "p".repeat(256)
    );
    let response = pipeline.handle(request(Method::POST, "/echo", content_type, Bytes::from(long_header))).await;
    assert_eq!(response.status(), StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE);

    let missing_boundary = pipeline.handle(request(Method::POST, "/echo", Some("multipart/form-data"), Bytes::from_static(b"x"))).await;
    assert_eq!(missing_boundary.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn custom_decoder_takes_priority() {
    let router = Router::builder().route("/echo", post(handler_fn(echo))).build().unwrap();
    let mut decoders = DecoderRegistry::default();
    decoders.register(fn_decoder(
        |content_type: &str| content_type.contains("json"),
        |_bytes: Bytes, _content_type: &str| Ok(Body::Text("overridden".to_string())),
    ));
    let pipeline = Pipeline::builder().router(router).decoders(decoders).build().unwrap();

    for _ in 0..2 {
        let response =
            pipeline.handle(request(Method::POST, "/echo", Some("application/json"), Bytes::from_static(b"{\"a\":1}"))).await;
        assert_eq!(json_body(response.body().bytes()), json!({ "kind": "text", "value": "overridden" }));
    }
}

#[tokio::test]
async fn route_not_found_for_other_method() {
    let pipeline = echo_pipeline(MultipartConfig::default());

    let response = pipeline.handle(request(Method::GET, "/echo", None, Bytes::new())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.body().bytes(), b"no route matched: GET /echo");
}

#[tokio::test]
async fn params_query_and_prefix() {
    let router = Router::builder()
        .prefix("/api/")
        .route(
            "/users/{id}/posts/{post}",
            get(handler_fn(|req: Request| async move {
                Json(json!({
                    "id": req.param("id"),
                    "post": req.param("post"),
                    "page": req.query().get("page"),
                    "template": req.matcher().map(|matcher| matcher.template().to_string()),
                }))
            })),
        )
        .build()
        .unwrap();
    let pipeline = Pipeline::builder().router(router).build().unwrap();

    let response = pipeline.handle(request(Method::GET, "/api/users/7/posts/abc/?page=2", None, Bytes::new())).await;
    assert_eq!(
        json_body(response.body().bytes()),
        json!({ "id": "7", "post": "abc", "page": "2", "template": "/api/users/{id}/posts/{post}" })
    );
}

#[tokio::test]
async fn short_circuit_passes_back_unmodified() {
    let log = Log::default();
    let c_log = Arc::clone(&log);
    let short_circuit = interceptor_fn(move |_req: Request, _next: Next| {
        let log = Arc::clone(&c_log);
        async move {
            log.lock().unwrap().push("c");
            Ok((StatusCode::ACCEPTED, "from c").response_to())
        }
    });

    let router = Router::builder()
        .intercept(mark("a", &log))
        .intercept(mark("b", &log))
        .route("/", get(handler_fn(|_req: Request| async { "from handler" })).with(short_circuit))
        .build()
        .unwrap();
    let pipeline = Pipeline::builder().router(router).build().unwrap();

    let response = pipeline.handle(request(Method::GET, "/", None, Bytes::new())).await;

    assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(response.body().bytes(), b"from c");
}

#[tokio::test]
async fn group_routes_through_pipeline() {
    let log = Log::default();
    let mut builder = Router::builder().intercept(mark("global", &log));
    {
        let mut admin = builder.group("/admin");
        admin.with(mark("admin", &log));
        admin
            .route(
                "/settings",
                put(handler_fn(|req: Request| async move { req.body().get("theme").cloned().unwrap_or_default() }))
                    .with(interceptor_fn(|req: Request, next: Next| async move {
                        let mut response = next.run(req).await?;
                        response.headers_mut().insert("x-route", HeaderValue::from_static("settings"));
                        Ok(response)
                    })),
            )
            .unwrap();
    }
    let pipeline = Pipeline::builder().router(builder.build().unwrap()).build().unwrap();

    let response = pipeline
        .handle(request(Method::PUT, "/admin/settings", Some("application/json"), Bytes::from_static(br#"{"theme":"dark"}"#)))
        .await;

    assert_eq!(*log.lock().unwrap(), vec!["global", "admin"]);
    assert_eq!(response.headers().get("x-route").unwrap(), "settings");
    assert_eq!(response.body().bytes(), b"\"dark\"");
}

#[tokio::test]
async fn handler_errors_are_500_without_details() {
    let router = Router::builder()
        .route(
            "/fail",
            get(relay_web::try_handler_fn(|_req: Request| async { Err::<(), _>(std::io::Error::other("db password is hunter2")) })),
        )
        .build()
        .unwrap();
    let pipeline = Pipeline::builder().router(router).build().unwrap();

    let response = pipeline.handle(request(Method::GET, "/fail", None, Bytes::new())).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body().bytes(), b"internal server error");
}
