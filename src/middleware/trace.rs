use std::sync::Arc;
use std::time::Instant;

use tracing::{Instrument, info, info_span};

use crate::error::BoxError;
use crate::handler::{BoxFuture, BoxedHandler, Endpoint};
use crate::request::Request;

use super::Middleware;

/// Per-request tracing.
///
/// Opens an `http_request` span carrying the method and path, and emits one
/// event when the response is ready with its status and latency.
///
/// Takes no arguments. The optional block is a filter: requests for which it
/// returns `false` are forwarded without a span, which keeps health probes
/// out of the logs.
///
/// ```rust
/// use std::sync::Arc;
/// use sheath::middleware::{LayerEntry, Trace};
/// use sheath::Request;
///
/// let skip_probes: Arc<dyn Fn(&Request) -> bool + Send + Sync> =
///     Arc::new(|req: &Request| !req.path().starts_with("/health"));
/// LayerEntry::with_block::<Trace>((), skip_probes);
/// ```
pub struct Trace;

impl Middleware for Trace {
    type Args = ();
    type Block = dyn Fn(&Request) -> bool + Send + Sync;

    fn construct(
        next: BoxedHandler,
        (): (),
        filter: Option<Arc<Self::Block>>,
    ) -> Result<BoxedHandler, BoxError> {
        Ok(BoxedHandler::new(TraceHandler { next, filter }))
    }
}

struct TraceHandler {
    next: BoxedHandler,
    filter: Option<Arc<dyn Fn(&Request) -> bool + Send + Sync>>,
}

impl Endpoint for TraceHandler {
    fn call(&self, req: Request) -> BoxFuture {
        if self.filter.as_ref().is_some_and(|traced| !traced(&req)) {
            return self.next.call(req);
        }

        let span = info_span!("http_request", method = %req.method(), path = %req.path());
        let next = self.next.clone();
        let started = Instant::now();

        Box::pin(
            async move {
                let res = next.call(req).await;
                info!(
                    status = res.status_code().as_u16(),
                    latency = ?started.elapsed(),
                    "request completed"
                );
                res
            }
            .instrument(span),
        )
    }
}
