use axum::body::Body;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info_span, Instrument, Span};
use uuid::Uuid;

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

#[derive(Clone, Debug)]
pub struct CorrelationId(pub String);

/// Tag every request with a correlation id, echoed back on the response.
///
/// An id supplied by the client is kept; otherwise a v4 uuid is generated.
pub async fn correlation_layer(mut req: Request<Body>, next: Next) -> Response {
    let id = req
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let header = HeaderValue::from_str(&id).ok();

    req.extensions_mut().insert(CorrelationId(id.clone()));

    let span = info_span!(
        "request",
        method = %req.method(),
        uri = %req.uri(),
        correlation_id = %id
    );

    let mut response = next.run(req).instrument(span).await;
    if let Some(header) = header {
        response.headers_mut().insert(CORRELATION_ID_HEADER, header);
    }
    response
}

pub fn request_span(name: &str, correlation_id: &str) -> Span {
    info_span!(
        "crusia.op",
        operation = name,
        correlation_id = %correlation_id
    )
}
