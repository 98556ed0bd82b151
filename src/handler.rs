//! Handler model and type erasure.
//!
//! # How handlers are stored
//!
//! A middleware chain is a set of *different* concrete types nested inside
//! each other: a tracing layer wraps a request-id layer wraps a router. Each
//! layer only knows that the thing it wraps can be called with a [`Request`],
//! so every link is hidden behind a trait object (`dyn Endpoint`) and passed
//! around as a [`BoxedHandler`].
//!
//! ```text
//! async fn hello(req: Request) -> Response { … }   ← user writes this
//!        ↓ stack.build(hello)
//! hello.into_boxed_handler()                       ← Handler blanket impl
//!        ↓
//! BoxedHandler(Arc::new(FnHandler(hello)))         ← innermost link
//!        ↓ entry.build(next) for every layer, innermost first
//! BoxedHandler(Arc::new(TraceHandler { next, .. })) ← outermost link
//!        ↓
//! handler.call(req)  at request time               ← one vtable dispatch per layer
//! ```
//!
//! Cloning a [`BoxedHandler`] is one atomic increment, so a layer may hand
//! its `next` into a `'static` future without copying anything.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::router::Router;

// ── Dispatch types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// `Send + 'static` lets tokio move the future across worker threads.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// One link of a composed chain: takes a request, produces a response.
///
/// Implement this on the runtime half of a middleware (the struct that holds
/// `next`), then box it with [`BoxedHandler::new`].
pub trait Endpoint: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A shared, type-erased [`Endpoint`].
///
/// This is what [`MiddlewareStack::build`](crate::middleware::MiddlewareStack::build)
/// returns and what every middleware receives as the handler it wraps.
#[derive(Clone)]
pub struct BoxedHandler(Arc<dyn Endpoint>);

impl BoxedHandler {
    pub fn new(endpoint: impl Endpoint) -> Self {
        Self(Arc::new(endpoint))
    }

    /// Dispatches `req` into this link of the chain.
    pub fn call(&self, req: Request) -> BoxFuture {
        self.0.call(req)
    }
}

impl std::fmt::Debug for BoxedHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BoxedHandler")
    }
}

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Anything that can sit at the innermost end of a chain.
///
/// You never implement this yourself. It is satisfied by:
///
/// - any `async fn name(req: Request) -> impl IntoResponse`
/// - a [`Router`]
/// - an already built [`BoxedHandler`] (so built chains can be nested)
///
/// The trait is **sealed** (via the private `Sealed` supertrait). Custom
/// endpoints go through [`BoxedHandler::new`] instead.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

// ── Implementations ───────────────────────────────────────────────────────────

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        BoxedHandler::new(FnHandler(self))
    }
}

impl private::Sealed for Router {}

impl Handler for Router {
    fn into_boxed_handler(self) -> BoxedHandler {
        BoxedHandler::new(self)
    }
}

impl private::Sealed for BoxedHandler {}

impl Handler for BoxedHandler {
    fn into_boxed_handler(self) -> BoxedHandler {
        self
    }
}

/// Bridges a plain async function into the [`Endpoint`] world.
struct FnHandler<F>(F);

impl<F, Fut, R> Endpoint for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}
