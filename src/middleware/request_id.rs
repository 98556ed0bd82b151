use std::sync::Arc;

use http::{HeaderName, HeaderValue};
use tracing::warn;
use uuid::Uuid;

use crate::error::BoxError;
use crate::handler::{BoxFuture, BoxedHandler, Endpoint};
use crate::request::Request;

use super::Middleware;

/// Request id propagation.
///
/// The argument is the header name, e.g. `"x-request-id"`; a name that is not
/// a valid header fails the build. An id sent by the client (or the proxy in
/// front) is kept. Otherwise a fresh one is generated, written to the request
/// for inner layers, and echoed on the response either way.
///
/// Ids are UUID v4 unless a generator block is supplied.
pub struct RequestId;

impl Middleware for RequestId {
    type Args = String;
    type Block = dyn Fn() -> String + Send + Sync;

    fn construct(
        next: BoxedHandler,
        header: String,
        generate: Option<Arc<Self::Block>>,
    ) -> Result<BoxedHandler, BoxError> {
        let header = HeaderName::from_bytes(header.as_bytes())?;
        Ok(BoxedHandler::new(RequestIdHandler { next, header, generate }))
    }
}

struct RequestIdHandler {
    next: BoxedHandler,
    header: HeaderName,
    generate: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

impl RequestIdHandler {
    fn fresh_id(&self) -> Option<HeaderValue> {
        let id = match &self.generate {
            Some(generate) => generate(),
            None => Uuid::new_v4().to_string(),
        };
        match HeaderValue::try_from(id) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(header = %self.header, "generated request id is not a valid header value: {e}");
                None
            }
        }
    }
}

impl Endpoint for RequestIdHandler {
    fn call(&self, mut req: Request) -> BoxFuture {
        let id = match req.headers().get(&self.header) {
            Some(existing) => Some(existing.clone()),
            None => self.fresh_id(),
        };
        if let Some(id) = &id {
            req.headers_mut().insert(self.header.clone(), id.clone());
        }

        let next = self.next.clone();
        let header = self.header.clone();

        Box::pin(async move {
            let mut res = next.call(req).await;
            if let Some(id) = id {
                res.headers_mut().insert(header, id);
            }
            res
        })
    }
}
