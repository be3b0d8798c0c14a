//! The transport-facing entry point.
//!
//! A transport adapter buffers the request body and calls [`Pipeline::handle`]. The
//! pipeline decodes the body once, builds the [`Request`], dispatches it through the
//! [`Router`] and turns failures into status codes.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::Response;
use relay_http::codec::DecoderRegistry;
use thiserror::Error;
use tracing::{error, warn};

use crate::handler::RequestHandler;
use crate::responder::Responder;
use crate::{HandlerResult, Request, ResponseBody, Router};

#[derive(Clone)]
pub struct Pipeline {
    router: Arc<Router>,
    decoders: Arc<DecoderRegistry>,
    fallback: Option<Arc<dyn RequestHandler>>,
}

#[derive(Error, Debug)]
pub enum PipelineBuildError {
    #[error("router must be set")]
    MissingRouter,
}

#[derive(Default)]
pub struct PipelineBuilder {
    router: Option<Arc<Router>>,
    decoders: Option<Arc<DecoderRegistry>>,
    fallback: Option<Arc<dyn RequestHandler>>,
}

impl PipelineBuilder {
    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(Arc::new(router));
        self
    }

    /// Content decoders, [`DecoderRegistry::default`] when not set.
    pub fn decoders(mut self, decoders: DecoderRegistry) -> Self {
        self.decoders = Some(Arc::new(decoders));
        self
    }

    /// Handler for requests no route matches, instead of answering `404`.
    pub fn fallback(mut self, handler: impl RequestHandler + 'static) -> Self {
        self.fallback = Some(Arc::new(handler));
        self
    }

    /// # Errors
    ///
    /// Returns [`PipelineBuildError::MissingRouter`] when no router was given.
    pub fn build(self) -> Result<Pipeline, PipelineBuildError> {
        let router = self.router.ok_or(PipelineBuildError::MissingRouter)?;
        let decoders = self.decoders.unwrap_or_default();
        Ok(Pipeline { router, decoders, fallback: self.fallback })
    }
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn decoders(&self) -> &DecoderRegistry {
        &self.decoders
    }

    /// Serves one request, failures become error responses.
    pub async fn handle(&self, req: http::Request<Bytes>) -> Response<ResponseBody> {
        match self.try_handle(req).await {
            Ok(response) => response,
            Err(e) => {
                if e.is_client_error() {
                    warn!(status = e.status_code().as_u16(), cause = %e, "request rejected");
                } else {
                    error!(status = e.status_code().as_u16(), cause = %e, "request failed");
                }
                e.response_to()
            }
        }
    }

    /// Serves one request and returns failures to the caller.
    ///
    /// # Errors
    ///
    /// Body decode failures, route-not-found (unless a fallback is set) and whatever the
    /// interceptors or the handler return.
    pub async fn try_handle(&self, req: http::Request<Bytes>) -> HandlerResult {
        let (parts, payload) = req.into_parts();
        let content_type = parts.headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok());

        let body = self.decoders.decode(payload, content_type)?;
        let request = Request::from_parts(parts, body);

        let Some(fallback) = &self.fallback else {
            return self.router.dispatch(request).await;
        };
        match self.router.position(request.method(), request.path()) {
            Ok(index) => self.router.dispatch_to(index, request).await,
            Err(_) => fallback.invoke(request).await,
        }
    }
}

impl fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("router", &self.router)
            .field("decoders", &self.decoders)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("router", &self.router)
            .field("decoders", &self.decoders)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
