use std::fmt;
use std::sync::Arc;

use http::Method;

use super::{PathMatcher, RouteBuilder, RouterBuilder, join_paths};
use crate::RouterError;
use crate::handler::RequestHandler;
use crate::interceptor::Interceptor;

/// Routes sharing a path prefix and a list of interceptors.
///
/// Group interceptors run after the global ones and before route-level ones. They apply
/// to routes registered after they were added. Registration itself is delegated to the
/// [`RouterBuilder`] the group borrows.
///
/// # Example
/// ```
/// use relay_web::router::{get, Router};
/// use relay_web::interceptor::TraceInterceptor;
/// use relay_web::{handler_fn, Request};
///
/// let mut builder = Router::builder();
/// let mut admin = builder.group("/admin");
/// admin.with(TraceInterceptor);
/// admin.route("/users", get(handler_fn(|_req: Request| async { "users" }))).unwrap();
/// admin.group("/reports").route("/{year}", get(handler_fn(|_req: Request| async { "report" }))).unwrap();
///
/// let router = builder.build().unwrap();
/// assert!(router.resolve(&http::Method::GET, "/admin/reports/2024").is_ok());
/// ```
pub struct RouteGroup<'r> {
    router: &'r mut RouterBuilder,
    prefix: String,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl<'r> RouteGroup<'r> {
    pub(super) fn new(router: &'r mut RouterBuilder, prefix: String) -> Self {
        Self { router, prefix, interceptors: vec![] }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Adds a group interceptor.
    pub fn with<I: Interceptor + 'static>(&mut self, interceptor: I) -> &mut Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Registers `handler` at `prefix + "/" + path`, with the group interceptors attached.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidTemplate`] when the joined template does not compile.
    pub fn register<H: RequestHandler + 'static>(
        &mut self,
        method: Method,
        path: &str,
        handler: H,
    ) -> Result<&mut PathMatcher, RouterError> {
        self.register_handler(method, path, Arc::new(handler))
    }

    /// Registers a route built with [`get`](super::get), [`post`](super::post) and friends.
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub fn route(&mut self, path: &str, route: RouteBuilder) -> Result<&mut Self, RouterError> {
        let RouteBuilder { method, handler, interceptors } = route;
        self.register_handler(method, path, handler)?.push_interceptors(interceptors);
        Ok(self)
    }

    /// Opens a nested group: prefixes are joined and this group's interceptors run first.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_> {
        RouteGroup { router: &mut *self.router, prefix: join_paths(&self.prefix, prefix), interceptors: self.interceptors.clone() }
    }

    fn register_handler(
        &mut self,
        method: Method,
        path: &str,
        handler: Arc<dyn RequestHandler>,
    ) -> Result<&mut PathMatcher, RouterError> {
        let template = join_paths(&self.prefix, path);
        let matcher = self.router.register_handler(method, &template, handler)?;
        matcher.push_interceptors(self.interceptors.iter().cloned());
        Ok(matcher)
    }
}

impl fmt::Debug for RouteGroup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteGroup")
            .field("prefix", &self.prefix)
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}
