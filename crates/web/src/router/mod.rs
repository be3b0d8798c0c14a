//! Route table: per-method ordered matchers, a global prefix and global interceptors.
//!
//! Routes are registered on a [`RouterBuilder`] and frozen into a [`Router`]. For each
//! method the matchers are kept in registration order and the first matching one wins,
//! so more specific templates have to be registered before more general ones.
//!
//! # Example
//! ```
//! use relay_web::router::{get, post, Router};
//! use relay_web::interceptor::TraceInterceptor;
//! use relay_web::{handler_fn, Request};
//!
//! async fn show(req: Request) -> String {
//!     format!("user {}", req.param("id").unwrap_or_default())
//! }
//!
//! async fn create(_req: Request) -> &'static str {
//!     "created"
//! }
//!
//! let router = Router::builder()
//!     .prefix("/api")
//!     .intercept(TraceInterceptor)
//!     .route("/users/{id}", get(handler_fn(show)))
//!     .route("/users", post(handler_fn(create)))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(router.routes(&http::Method::GET)[0].template(), "/api/users/{id}");
//! ```

mod group;
mod matcher;

pub use group::RouteGroup;
pub use matcher::PathMatcher;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::Method;
use tracing::{debug, trace};

use crate::handler::RequestHandler;
use crate::interceptor::{self, Interceptor};
use crate::{HandlerResult, Request, RouterError, WebError};

/// An immutable route table, shared between request tasks.
pub struct Router {
    prefix: String,
    routes: HashMap<Method, Vec<Arc<PathMatcher>>>,
    chains: HashMap<Method, Vec<Arc<[Arc<dyn Interceptor>]>>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Matchers registered for `method`, in priority order.
    pub fn routes(&self, method: &Method) -> &[Arc<PathMatcher>] {
        self.routes.get(method).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn interceptors(&self) -> &[Arc<dyn Interceptor>] {
        &self.interceptors
    }

    /// Finds the first matcher registered for `method` that matches `path`.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::RouteNotFound`] when nothing matches, even if a matcher of
    /// another method would.
    pub fn resolve(&self, method: &Method, path: &str) -> Result<&Arc<PathMatcher>, WebError> {
        self.position(method, path).map(|index| &self.routes(method)[index])
    }

    /// Resolves the route and runs the request through global interceptors, route
    /// interceptors and finally the route's handler.
    ///
    /// # Errors
    ///
    /// Returns route-not-found when resolution fails, otherwise whatever the chain returns.
    /// A request that was dispatched before is rejected with [`WebError::AlreadyRouted`].
    pub async fn dispatch(&self, req: Request) -> HandlerResult {
        let index = self.position(req.method(), req.path())?;
        self.dispatch_to(index, req).await
    }

    /// Runs `req` through the route at `index` of its method's table.
    pub(crate) async fn dispatch_to(&self, index: usize, mut req: Request) -> HandlerResult {
        let matcher = Arc::clone(&self.routes(req.method())[index]);
        let chain = self.chains.get(req.method()).and_then(|chains| chains.get(index)).cloned();

        let params = matcher.extract_parameters(req.path());
        trace!(template = matcher.template(), params = ?params, "route resolved");
        req.bind(Arc::clone(&matcher), params)?;

        match chain {
            Some(chain) if !chain.is_empty() => interceptor::run(req, chain, Arc::clone(matcher.handler())).await,
            _ => matcher.handler().invoke(req).await,
        }
    }

    pub(crate) fn position(&self, method: &Method, path: &str) -> Result<usize, WebError> {
        match self.routes(method).iter().position(|matcher| matcher.matches(path)) {
            Some(index) => Ok(index),
            None => {
                debug!(%method, path, "no route matched");
                Err(WebError::route_not_found(method.clone(), path))
            }
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("prefix", &self.prefix)
            .field("routes", &self.routes)
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

/// Collects routes and interceptors before the table is frozen.
///
/// The global prefix applies to routes registered after it is set.
#[derive(Default)]
pub struct RouterBuilder {
    prefix: String,
    routes: HashMap<Method, Vec<PathMatcher>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    error: Option<RouterError>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Adds a global interceptor, it runs for every route after the ones added before it.
    pub fn intercept<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Registers a route, keeping the first registration error for [`build`](Self::build).
    pub fn route(mut self, template: &str, route: RouteBuilder) -> Self {
        if self.error.is_none()
            && let Err(e) = self.add_route(template, route)
        {
            self.error = Some(e);
        }
        self
    }

    /// Registers routes under `prefix` through a [`RouteGroup`].
    pub fn scope<F>(mut self, prefix: &str, f: F) -> Self
    where
        F: FnOnce(&mut RouteGroup<'_>) -> Result<(), RouterError>,
    {
        if self.error.is_none() {
            let mut group = self.group(prefix);
            if let Err(e) = f(&mut group) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Registers `handler` for `method` and `template`, the global prefix is prepended.
    ///
    /// The returned matcher accepts route-level interceptors.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidTemplate`] when the template does not compile.
    pub fn register<H: RequestHandler + 'static>(
        &mut self,
        method: Method,
        template: &str,
        handler: H,
    ) -> Result<&mut PathMatcher, RouterError> {
        self.register_handler(method, template, Arc::new(handler))
    }

    /// Opens a group whose routes share `prefix` and the group's interceptors.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_> {
        RouteGroup::new(self, join_paths("", prefix))
    }

    pub(crate) fn register_handler(
        &mut self,
        method: Method,
        template: &str,
        handler: Arc<dyn RequestHandler>,
    ) -> Result<&mut PathMatcher, RouterError> {
        let full_template = join_paths(&self.prefix, template);
        let matcher = PathMatcher::new(full_template, handler)?;
        debug!(%method, template = matcher.template(), "route registered");

        let matchers = self.routes.entry(method).or_default();
        let index = matchers.len();
        matchers.push(matcher);
        Ok(&mut matchers[index])
    }

    fn add_route(&mut self, template: &str, route: RouteBuilder) -> Result<(), RouterError> {
        let RouteBuilder { method, handler, interceptors } = route;
        self.register_handler(method, template, handler)?.push_interceptors(interceptors);
        Ok(())
    }

    /// Freezes the table.
    ///
    /// # Errors
    ///
    /// Returns the first error met by [`route`](Self::route) or [`scope`](Self::scope).
    pub fn build(self) -> Result<Router, RouterError> {
        if let Some(e) = self.error {
            return Err(e);
        }

        let mut routes = HashMap::with_capacity(self.routes.len());
        let mut chains = HashMap::with_capacity(self.routes.len());
        for (method, matchers) in self.routes {
            let matchers = matchers.into_iter().map(Arc::new).collect::<Vec<_>>();
            let method_chains = matchers
                .iter()
                .map(|matcher| self.interceptors.iter().chain(matcher.interceptors()).cloned().collect::<Arc<[_]>>())
                .collect::<Vec<_>>();

            chains.insert(method.clone(), method_chains);
            routes.insert(method, matchers);
        }

        Ok(Router { prefix: self.prefix, routes, chains, interceptors: self.interceptors })
    }
}

impl fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("prefix", &self.prefix)
            .field("routes", &self.routes)
            .field("interceptors", &self.interceptors.len())
            .field("error", &self.error)
            .finish()
    }
}

/// A handler bound to a method, with route-level interceptors.
pub struct RouteBuilder {
    method: Method,
    handler: Arc<dyn RequestHandler>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl RouteBuilder {
    /// Adds a route-level interceptor.
    pub fn with<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }
}

impl fmt::Debug for RouteBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteBuilder")
            .field("method", &self.method)
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}

/// Binds `handler` to an arbitrary method.
pub fn on<H: RequestHandler + 'static>(method: Method, handler: H) -> RouteBuilder {
    RouteBuilder { method, handler: Arc::new(handler), interceptors: vec![] }
}

macro_rules! method_route {
    ($name:ident, $method:ident) => {
        pub fn $name<H: RequestHandler + 'static>(handler: H) -> RouteBuilder {
            on(Method::$method, handler)
        }
    };
}

method_route!(get, GET);
method_route!(post, POST);
method_route!(put, PUT);
method_route!(delete, DELETE);
method_route!(head, HEAD);
method_route!(options, OPTIONS);
method_route!(connect, CONNECT);
method_route!(patch, PATCH);
method_route!(trace, TRACE);

/// Joins `prefix` and `path` with a `/`, collapses runs of slashes and drops the
/// trailing slash unless the result is the root.
pub(crate) fn join_paths(prefix: &str, path: &str) -> String {
    let mut joined = String::with_capacity(prefix.len() + path.len() + 2);
    joined.push('/');

    for c in prefix.chars().chain(std::iter::once('/')).chain(path.chars()) {
        if c == '/' && joined.ends_with('/') {
            continue;
        }
        joined.push(c);
    }

    if joined.len() > 1 && joined.ends_with('/') {
        joined.pop();
    }
    joined
}
