//! Per-request context: a correlation id and a completion log line with the
//! elapsed time, both echoed back as response headers.

use std::future::{Ready, ready};
use std::time::{Duration, Instant};

use actix_service::{Service, Transform, forward_ready};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{HeaderMap, HeaderName, HeaderValue};
use actix_web::{Error, HttpMessage};
use futures_util::future::LocalBoxFuture;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
const SERVER_TIMING_HEADER: HeaderName = HeaderName::from_static("server-timing");

/// Correlation id for one request. Taken from `x-request-id` when the caller
/// sends a usable one, otherwise a fresh v4 uuid.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(&REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty() && v.len() <= 128)
            .map(|v| RequestId(v.to_owned()))
            .unwrap_or_else(|| RequestId(Uuid::new_v4().to_string()))
    }
}

pub struct RequestContext;

impl<S, B> Transform<S, ServiceRequest> for RequestContext
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestContextService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestContextService { service }))
    }
}

pub struct RequestContextService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestContextService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let started = Instant::now();
        let request_id = RequestId::from_headers(req.headers());
        let span = info_span!(
            "http_request",
            request_id = %request_id.0,
            method = %req.method(),
            path = %req.path(),
        );
        req.extensions_mut().insert(request_id.clone());

        let fut = self.service.call(req);

        Box::pin(
            async move {
                let mut res = fut.await?;
                let elapsed = started.elapsed();
                info!(
                    status = res.status().as_u16(),
                    duration_ms = elapsed.as_millis() as u64,
                    "request completed"
                );
                stamp_headers(res.headers_mut(), &request_id, elapsed);
                Ok(res)
            }
            .instrument(span),
        )
    }
}

fn stamp_headers(headers: &mut HeaderMap, request_id: &RequestId, elapsed: Duration) {
    if let Ok(value) = HeaderValue::from_str(&request_id.0) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    if let Ok(value) = HeaderValue::from_str(&format!("app;dur={}", elapsed.as_millis())) {
        headers.insert(SERVER_TIMING_HEADER, value);
    }
}
