//! Routing, interceptor chains and the request pipeline of the relay framework.
//!
//! A request flows leaf to root through:
//!
//! 1. the [`Pipeline`]: decodes the body once with a
//!    [`DecoderRegistry`](relay_http::codec::DecoderRegistry) and builds the [`Request`]
//! 2. the [`Router`]: picks the first matching [`PathMatcher`](router::PathMatcher)
//!    registered for the method and binds the path parameters
//! 3. the [`interceptor`] chain: global interceptors, then route-level ones
//! 4. the route's [`RequestHandler`], whose output is turned into a response by a
//!    [`Responder`](responder::Responder)
//!
//! # Example
//! ```
//! use bytes::Bytes;
//! use relay_web::router::{get, Router};
//! use relay_web::{handler_fn, Pipeline, Request};
//!
//! async fn hello(req: Request) -> String {
//!     format!("hello {}", req.param("name").unwrap_or("world"))
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let router = Router::builder().route("/hello/{name}", get(handler_fn(hello))).build().unwrap();
//! let pipeline = Pipeline::builder().router(router).build().unwrap();
//!
//! let request = http::Request::get("/hello/relay").body(Bytes::new()).unwrap();
//! let response = pipeline.handle(request).await;
//! assert_eq!(response.body().bytes(), b"hello relay");
//! # }
//! ```

mod body;
mod error;
mod handler;
mod pipeline;
mod request;

pub mod interceptor;
pub mod responder;
pub mod router;

pub use body::ResponseBody;
pub use error::{BoxError, HandlerResult, RouterError, WebError};
pub use handler::{FnHandler, RequestHandler, TryFnHandler, handler_fn, try_handler_fn};
pub use pipeline::{Pipeline, PipelineBuildError, PipelineBuilder};
pub use request::{PathParams, Request};
pub use router::Router;
