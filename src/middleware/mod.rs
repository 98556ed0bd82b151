//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns: structured tracing, request-id injection, sessions,
//! authentication, error pages.
//!
//! A middleware is registered by *type*. The type implements [`Middleware`],
//! which knows how to construct the runtime link around the next handler.
//! A [`MiddlewareStack`] holds an ordered list of [`LayerEntry`] values (type +
//! arguments) and folds them into one [`BoxedHandler`](crate::BoxedHandler):
//!
//! ```text
//! stack:  [Trace, RequestId, Session]       + final handler: router
//! chain:  Trace( RequestId( Session( router ) ) )
//!         ^ outermost: sees the request first and the response last
//! ```
//!
//! ```rust
//! use sheath::middleware::{LayerEntry, LayerType, MiddlewareStack, RequestId, Trace};
//! use sheath::{Request, Response};
//!
//! async fn hello(_: Request) -> Response { Response::text("hello") }
//!
//! let mut stack = MiddlewareStack::new();
//! stack.push(LayerEntry::new::<RequestId>("x-request-id".to_owned()));
//! stack.insert_before(LayerType::of::<RequestId>(), LayerEntry::new::<Trace>(()))?;
//!
//! let app = stack.build(hello)?;
//! # Ok::<(), sheath::Error>(())
//! ```
//!
//! Built-in middleware:
//! - [`Trace`] — per-request span with method, path, status, latency
//! - [`RequestId`] — propagates or generates a request id header

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::BoxError;
use crate::handler::BoxedHandler;

mod entry;
mod request_id;
mod stack;
mod trace;

pub use entry::LayerEntry;
pub use request_id::RequestId;
pub use stack::{MiddlewareStack, Relation, ResolutionError, Target};
pub use trace::Trace;

/// A constructible middleware type.
///
/// The implementing type is the layer's *identity* inside a stack: deleting
/// or inserting relative to `Session` finds entries registered as `Session`,
/// whatever their arguments. It is usually a unit struct; the runtime state
/// lives in the [`Endpoint`](crate::Endpoint) that `construct` returns.
///
/// ```rust
/// use std::sync::Arc;
/// use sheath::middleware::Middleware;
/// use sheath::{BoxError, BoxFuture, BoxedHandler, Endpoint, Request};
///
/// struct Noop;
///
/// struct NoopHandler { next: BoxedHandler }
///
/// impl Endpoint for NoopHandler {
///     fn call(&self, req: Request) -> BoxFuture { self.next.call(req) }
/// }
///
/// impl Middleware for Noop {
///     type Args = ();
///     type Block = ();
///
///     fn construct(next: BoxedHandler, _: (), _: Option<Arc<()>>) -> Result<BoxedHandler, BoxError> {
///         Ok(BoxedHandler::new(NoopHandler { next }))
///     }
/// }
/// ```
pub trait Middleware: 'static {
    /// Construction arguments. Use a tuple for several positional values and
    /// `()` for none. Cloned once per build.
    type Args: Clone + Send + Sync + 'static;

    /// The deferred block a layer may accept, typically a closure trait
    /// object such as `dyn Fn(&Request) -> bool + Send + Sync`. Use `()` when
    /// the layer takes none.
    type Block: ?Sized + Send + Sync + 'static;

    /// Wraps `next`, producing the link that runs before it.
    fn construct(
        next: BoxedHandler,
        args: Self::Args,
        block: Option<Arc<Self::Block>>,
    ) -> Result<BoxedHandler, BoxError>;
}

/// Identity handle for a [`Middleware`] type.
///
/// Two handles are equal exactly when they name the same Rust type.
#[derive(Clone, Copy)]
pub struct LayerType {
    id: TypeId,
    name: &'static str,
}

impl LayerType {
    pub fn of<M: Middleware>() -> Self {
        Self { id: TypeId::of::<M>(), name: std::any::type_name::<M>() }
    }

    /// The type's canonical path, e.g. `sheath::middleware::trace::Trace`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<M: Middleware>(&self) -> bool {
        self.id == TypeId::of::<M>()
    }
}

impl PartialEq for LayerType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for LayerType {}

impl Hash for LayerType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
