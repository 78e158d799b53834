// src/server/handler.rs
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};
use std::sync::Arc;
use tower::Service;

use crate::metrics::MetricsRegistry;

pub const METRICS_PATH: &str = "/metrics";

/// Serves the registry snapshot on `GET /metrics`.
#[derive(Clone)]
pub struct MetricsHandler {
    registry: Arc<MetricsRegistry>,
}

impl MetricsHandler {
    pub fn new(registry: Arc<MetricsRegistry>) -> Self {
        Self { registry }
    }

    fn respond(&self, req: &Request<Body>) -> Response<Body> {
        if req.uri().path() != METRICS_PATH {
            return plain(StatusCode::NOT_FOUND, "Not Found");
        }
        if req.method() != Method::GET {
            return plain(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
        }

        match self.registry.render() {
            Ok(metrics) => {
                let mut response = Response::new(Body::from(metrics));
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static(prometheus::TEXT_FORMAT));
                response
            }
            Err(e) => {
                tracing::error!(%e, "failed to render metrics");
                plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }
}

fn plain(status: StatusCode, message: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(message));
    *response.status_mut() = status;
    response
}

impl Service<Request<Body>> for MetricsHandler {
    type Response = Response<Body>;
    type Error = Box<dyn std::error::Error + Send + Sync>;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let response = self.respond(&req);
        Box::pin(async move { Ok(response) })
    }
}
