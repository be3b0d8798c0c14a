use crate::responder::Responder;
use crate::{BoxError, HandlerResult, Request, WebError};
use async_trait::async_trait;

/// The terminal target of an interceptor chain.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn invoke(&self, req: Request) -> HandlerResult;
}

/// A handler backed by an async fn whose output is a [`Responder`].
#[derive(Debug, Clone, Copy)]
pub struct FnHandler<F> {
    f: F,
}

/// Creates a handler from an infallible async fn.
///
/// # Example
/// ```
/// use relay_web::{handler_fn, Request};
///
/// async fn hello(req: Request) -> String {
///     format!("hello {}", req.param("name").unwrap_or("world"))
/// }
///
/// let _handler = handler_fn(hello);
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future + Send,
    Fut::Output: Responder,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> RequestHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future + Send,
    Fut::Output: Responder,
{
    async fn invoke(&self, req: Request) -> HandlerResult {
        let responder = (self.f)(req).await;
        Ok(responder.response_to())
    }
}

/// A handler backed by a fallible async fn.
#[derive(Debug, Clone, Copy)]
pub struct TryFnHandler<F> {
    f: F,
}

/// Creates a handler from an async fn returning `Result`.
///
/// The error is wrapped into [`WebError::Handler`] unless it already is a [`WebError`],
/// and travels back through the interceptor chain unchanged.
pub fn try_handler_fn<F, Fut, R, E>(f: F) -> TryFnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, E>> + Send,
    R: Responder,
    E: Into<BoxError>,
{
    TryFnHandler { f }
}

#[async_trait]
impl<F, Fut, R, E> RequestHandler for TryFnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, E>> + Send,
    R: Responder,
    E: Into<BoxError>,
{
    async fn invoke(&self, req: Request) -> HandlerResult {
        match (self.f)(req).await {
            Ok(responder) => Ok(responder.response_to()),
            Err(e) => Err(WebError::handler(e)),
        }
    }
}
