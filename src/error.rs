//! Unified error type.

use crate::middleware::ResolutionError;

/// Opaque failure raised by a middleware's own constructor.
///
/// The stack never inspects these. Whatever a layer returns from
/// [`Middleware::construct`](crate::middleware::Middleware::construct) comes
/// back out of [`MiddlewareStack::build`](crate::middleware::MiddlewareStack::build)
/// untouched.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by sheath's fallible operations.
///
/// Application-level errors (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// configuration and infrastructure failures: a middleware that could not be
/// placed, a middleware that could not be constructed, or a socket that could
/// not be bound.
///
/// Every variant is transparent, so converting with `?` keeps the original
/// message and source chain.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Middleware(#[from] BoxError),
}
