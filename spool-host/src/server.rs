//! Axum bridge: serves a built [`Service`] over HTTP.
//!
//! Every request lands in one fallback handler, which buffers the body,
//! runs the (synchronous) handler chain on tokio's blocking pool and turns
//! the finished `Response` back into an axum response.

use crate::app::Service;
use axum::Router as AxumRouter;
use axum::body::{Body, to_bytes};
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::LengthLimitError;
use spool_core::{Request, Response, SpoolError};
use std::error::Error as StdError;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

#[derive(Clone)]
struct BridgeState {
    service: Arc<Service>,
    body_limit: usize,
}

/// Axum router that sends every request through `service`.
pub fn router(service: Arc<Service>, body_limit: usize) -> AxumRouter {
    AxumRouter::new()
        .fallback(dispatch)
        .with_state(BridgeState { service, body_limit })
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve<F>(
    addr: &str,
    service: Arc<Service>,
    body_limit: usize,
    shutdown: F,
) -> Result<(), SpoolError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    serve_listener(listener, service, body_limit, shutdown).await
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve_listener<F>(
    listener: TcpListener,
    service: Arc<Service>,
    body_limit: usize,
    shutdown: F,
) -> Result<(), SpoolError>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(addr = %listener.local_addr()?, "Serving HTTP");
    let app = router(service, body_limit);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;
    Ok(())
}

async fn dispatch(
    State(state): State<BridgeState>,
    req: axum::extract::Request,
) -> axum::response::Response {
    let (parts, body) = req.into_parts();
    let body = match to_bytes(body, state.body_limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let status = body_error_status(&e);
            debug!(error = %e, status = status.as_u16(), "Request body rejected");
            return (status, status.canonical_reason().unwrap_or_default()).into_response();
        }
    };

    let mut request = Request::new(parts.method, parts.uri).with_body(body);
    request.headers = parts.headers;
    request.remote_addr = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let service = Arc::clone(&state.service);
    match tokio::task::spawn_blocking(move || service.handle(request)).await {
        Ok(ctx) => into_axum_response(ctx.response),
        Err(e) => {
            error!(error = %e, "Handler task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// 413 when the body hit `body_limit`, 400 for any other read failure
/// (client abort, malformed chunking).
fn body_error_status(err: &axum::Error) -> StatusCode {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return StatusCode::PAYLOAD_TOO_LARGE;
        }
        current = e.source();
    }
    StatusCode::BAD_REQUEST
}

fn into_axum_response(res: Response) -> axum::response::Response {
    let status = StatusCode::from_u16(res.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut out = axum::response::Response::new(Body::from(res.body));
    *out.status_mut() = status;
    *out.headers_mut() = res.headers;
    out
}
