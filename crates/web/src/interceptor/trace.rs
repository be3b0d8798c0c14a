use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{Interceptor, Next};
use crate::{HandlerResult, Request};

/// Logs one line per request: method, path, outcome and elapsed time.
///
/// Errors are logged and then returned unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceInterceptor;

#[async_trait]
impl Interceptor for TraceInterceptor {
    async fn intercept(&self, req: Request, next: Next) -> HandlerResult {
        let method = req.method().clone();
        let path = req.path().to_string();
        let start = Instant::now();

        let result = next.run(req).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(response) => info!(%method, %path, status = response.status().as_u16(), ?elapsed, "request handled"),
            Err(e) => warn!(%method, %path, status = e.status_code().as_u16(), ?elapsed, cause = %e, "request failed"),
        }
        result
    }
}
