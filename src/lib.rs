//! # sheath
//!
//! A minimal HTTP framework for Rust services behind a reverse proxy, built
//! around an ordered middleware stack.
//!
//! ## The model
//!
//! An application is a final handler (usually a [`Router`]) wrapped in layers.
//! Layers are registered by type into a [`MiddlewareStack`], reordered freely
//! while the application is being configured, and folded once into a single
//! [`BoxedHandler`] that the [`Server`] drives:
//!
//! - **push / prepend** — add a layer innermost or outermost
//! - **insert_before / insert_after / swap** — place relative to a position or
//!   to an already registered layer type
//! - **delete** — drop every layer of a type, if present
//! - **build** — fold the stack around the final handler, first entry outermost
//!
//! TLS, rate limiting and body-size limits stay with the proxy in front.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use http::Method;
//! use sheath::middleware::{LayerEntry, MiddlewareStack, RequestId, Trace};
//! use sheath::{Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sheath::Error> {
//!     let router = Router::new()
//!         .on(Method::GET, "/users/{id}", get_user);
//!
//!     let stack = MiddlewareStack::setup(|stack| {
//!         stack.push(LayerEntry::new::<Trace>(()));
//!         stack.push(LayerEntry::new::<RequestId>("x-request-id".to_owned()));
//!     });
//!
//!     let app = stack.build(router)?;
//!     Server::bind(([0, 0, 0, 0], 3000)).serve(app).await
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#))
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

pub use error::{BoxError, Error};
pub use handler::{BoxFuture, BoxedHandler, Endpoint, Handler};
pub use middleware::MiddlewareStack;
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
