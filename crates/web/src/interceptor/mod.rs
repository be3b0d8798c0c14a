//! Interceptor chains (onion model).
//!
//! An [`Interceptor`] receives the request together with a [`Next`] continuation that
//! runs the rest of the chain and finally the handler. It can:
//!
//! - pass the request through: `next.run(req).await`
//! - act before and after: change the request, call `next`, then change the response
//! - short-circuit: return a response without calling `next`
//!
//! `Next` is consumed by [`Next::run`], so each interceptor runs at most once per request.
//! Interceptors run strictly in registration order, global ones before route ones.
//! Errors travel back to the caller untouched, the chain never retries or recovers.
//!
//! # Example
//! ```
//! use relay_web::interceptor::{interceptor_fn, Next};
//! use relay_web::Request;
//! use http::{HeaderValue, StatusCode};
//!
//! let require_token = interceptor_fn(|req: Request, next: Next| async move {
//!     if req.header("authorization").is_none() {
//!         return Ok(relay_web::responder::Responder::response_to((StatusCode::UNAUTHORIZED, "missing token")));
//!     }
//!     let mut response = next.run(req).await?;
//!     response.headers_mut().insert("x-checked", HeaderValue::from_static("1"));
//!     Ok(response)
//! });
//! # let _ = require_token;
//! ```

mod trace;

pub use trace::TraceInterceptor;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::handler::RequestHandler;
use crate::{HandlerResult, Request};

#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn intercept(&self, req: Request, next: Next) -> HandlerResult;
}

/// The continuation handed to an [`Interceptor`]: the remaining interceptors plus the handler.
pub struct Next {
    chain: Arc<[Arc<dyn Interceptor>]>,
    index: usize,
    handler: Arc<dyn RequestHandler>,
}

impl Next {
    pub(crate) fn new(chain: Arc<[Arc<dyn Interceptor>]>, handler: Arc<dyn RequestHandler>) -> Self {
        Self { chain, index: 0, handler }
    }

    /// Number of interceptors still ahead of the handler.
    pub fn remaining(&self) -> usize {
        self.chain.len().saturating_sub(self.index)
    }

    /// Runs the rest of the chain.
    pub fn run(mut self, req: Request) -> BoxFuture<'static, HandlerResult> {
        match self.chain.get(self.index).cloned() {
            Some(interceptor) => {
                self.index += 1;
                Box::pin(async move { interceptor.intercept(req, self).await })
            }
            None => {
                let handler = Arc::clone(&self.handler);
                Box::pin(async move { handler.invoke(req).await })
            }
        }
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").field("index", &self.index).field("len", &self.chain.len()).finish_non_exhaustive()
    }
}

/// Runs `req` through `interceptors` in order, then through `handler`.
pub async fn run(req: Request, interceptors: Arc<[Arc<dyn Interceptor>]>, handler: Arc<dyn RequestHandler>) -> HandlerResult {
    Next::new(interceptors, handler).run(req).await
}

/// An interceptor backed by an async closure.
#[derive(Debug, Clone, Copy)]
pub struct FnInterceptor<F> {
    f: F,
}

/// Creates an interceptor from an async fn taking the request and the continuation.
pub fn interceptor_fn<F, Fut>(f: F) -> FnInterceptor<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    FnInterceptor { f }
}

#[async_trait]
impl<F, Fut> Interceptor for FnInterceptor<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn intercept(&self, req: Request, next: Next) -> HandlerResult {
        (self.f)(req, next).await
    }
}
