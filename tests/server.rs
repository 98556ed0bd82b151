//! A built chain served over a real socket.

use assert2::{check, let_assert};
use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use sheath::middleware::{LayerEntry, MiddlewareStack, RequestId};
use sheath::{Request, Response, Router, Server};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

async fn echo(req: Request) -> Response {
    Response::text(String::from_utf8_lossy(req.body()).into_owned())
}

#[tokio::test]
async fn serves_a_built_chain_and_drains_on_shutdown() {
    let router = Router::new().on(Method::POST, "/echo", echo);
    let stack = MiddlewareStack::setup(|stack| {
        stack.push(LayerEntry::new::<RequestId>("x-request-id".to_owned()));
    });
    let_assert!(Ok(app) = stack.build(router));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(Server::from_listener(listener).serve_with_shutdown(app, async {
        let _ = stopped.await;
    }));

    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await.unwrap();
    let client = tokio::spawn(conn);

    let req = http::Request::post("/echo")
        .header(http::header::HOST, addr.to_string())
        .header("x-request-id", "wire-1")
        .body(Full::new(Bytes::from("hello over the wire")))
        .unwrap();
    let res = sender.send_request(req).await.unwrap();

    check!(res.status() == StatusCode::OK);
    check!(res.headers().get("x-request-id").map(|v| v.as_bytes()) == Some(&b"wire-1"[..]));
    let body = res.into_body().collect().await.unwrap().to_bytes();
    check!(body == "hello over the wire");

    let req = http::Request::get("/nowhere")
        .header(http::header::HOST, addr.to_string())
        .body(Full::new(Bytes::new()))
        .unwrap();
    let res = sender.send_request(req).await.unwrap();
    check!(res.status() == StatusCode::NOT_FOUND);

    drop(sender);
    let _ = client.await;
    stop.send(()).unwrap();
    let_assert!(Ok(Ok(())) = server.await);
}
