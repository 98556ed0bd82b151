//! Minimal sheath example — a few JSON endpoints behind a middleware stack.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/users/42
//!   curl -i -X POST http://localhost:3000/users -d '{"name":"alice"}'
//!   curl -i -H 'x-request-id: abc' http://localhost:3000/healthz

use std::sync::Arc;

use http::header::LOCATION;
use http::{HeaderValue, Method, StatusCode};
use sheath::middleware::{LayerEntry, LayerType, MiddlewareStack, RequestId, Trace};
use sheath::{Request, Response, Router, Server};

#[tokio::main]
async fn main() -> Result<(), sheath::Error> {
    tracing_subscriber::fmt::init();

    let app = Router::new()
        .on(Method::GET,    "/users/{id}", get_user)
        .on(Method::POST,   "/users",      create_user)
        .on(Method::DELETE, "/users/{id}", delete_user)
        .on(Method::GET,    "/healthz",    healthz);

    let mut stack = MiddlewareStack::new();
    stack.push(LayerEntry::new::<RequestId>("x-request-id".to_owned()));

    // Probes are noisy; trace everything else, outside the request id so the
    // span also covers id generation.
    let skip_probes: Arc<dyn Fn(&Request) -> bool + Send + Sync> =
        Arc::new(|req: &Request| req.path() != "/healthz");
    stack.insert_before(LayerType::of::<RequestId>(), LayerEntry::with_block::<Trace>((), skip_probes))?;

    tracing::info!(?stack, "middleware");

    Server::bind(([0, 0, 0, 0], 3000)).serve(stack.build(app)?).await
}

// GET /users/{id}
async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#))
}

// POST /users
async fn create_user(req: Request) -> Response {
    if req.body().is_empty() {
        return Response::status(StatusCode::BAD_REQUEST);
    }

    Response::builder()
        .status(StatusCode::CREATED)
        .header(LOCATION, HeaderValue::from_static("/users/99"))
        .json(r#"{"id":"99","name":"new_user"}"#)
}

// DELETE /users/{id} → 204 No Content
async fn delete_user(_req: Request) -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn healthz(_req: Request) -> &'static str {
    "ok"
}
