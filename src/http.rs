//! HTTP mounting for endpoints.
//!
//! [`SoapEndpointLayer`] wraps an inner service and intercepts exactly
//! the requests addressed to the endpoint's path; everything else flows
//! through untouched. [`SoapRouterExt::soap_endpoint`] is the one-line
//! way to hang an endpoint off an axum [`Router`].
//!
//! ## Example
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/healthz", get(|| async { "ok" }))
//!     .soap_endpoint(endpoint);
//! soap_endpoint::serve(app, "0.0.0.0:8080").await?;
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Request, Response, StatusCode};
use axum::Router;
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::dispatch::{Endpoint, SoapRequest, SoapResponse};

/// Tower layer that mounts an [`Endpoint`] in front of an inner service.
pub struct SoapEndpointLayer<S> {
    endpoint: Arc<Endpoint<S>>,
}

impl<S> SoapEndpointLayer<S> {
    pub fn new(endpoint: Endpoint<S>) -> Self {
        SoapEndpointLayer {
            endpoint: Arc::new(endpoint),
        }
    }
}

impl<S> Clone for SoapEndpointLayer<S> {
    fn clone(&self) -> Self {
        SoapEndpointLayer {
            endpoint: Arc::clone(&self.endpoint),
        }
    }
}

impl<S, I> Layer<I> for SoapEndpointLayer<S> {
    type Service = SoapEndpointService<S, I>;

    fn layer(&self, inner: I) -> Self::Service {
        SoapEndpointService {
            endpoint: Arc::clone(&self.endpoint),
            inner,
        }
    }
}

/// The service produced by [`SoapEndpointLayer`].
pub struct SoapEndpointService<S, I> {
    endpoint: Arc<Endpoint<S>>,
    inner: I,
}

impl<S, I: Clone> Clone for SoapEndpointService<S, I> {
    fn clone(&self) -> Self {
        SoapEndpointService {
            endpoint: Arc::clone(&self.endpoint),
            inner: self.inner.clone(),
        }
    }
}

impl<S, I> Service<Request<Body>> for SoapEndpointService<S, I>
where
    S: Send + Sync + 'static,
    I: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    I::Future: Send,
{
    type Response = Response<Body>;
    type Error = I::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        if request.uri().path() != self.endpoint.path() {
            // Pass through. The readiness we polled belongs to this
            // instance, so move it into the future and keep a fresh
            // clone here.
            let clone = self.inner.clone();
            let mut inner = std::mem::replace(&mut self.inner, clone);
            return Box::pin(async move { inner.call(request).await });
        }

        let endpoint = Arc::clone(&self.endpoint);
        Box::pin(async move {
            debug!(path = %endpoint.path(), "handling soap request");
            let (parts, body) = request.into_parts();
            let bytes = match to_bytes(body, endpoint.message_size_limit()).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(error = %err, "failed to collect request body");
                    return Ok(status_response(StatusCode::BAD_REQUEST));
                }
            };

            let content_type = parts
                .headers
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok());
            let soap_action = parts
                .headers
                .get("SOAPAction")
                .and_then(|value| value.to_str().ok());
            let remote = parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0);

            let outcome = endpoint.handle(SoapRequest {
                body: &bytes,
                content_type,
                soap_action,
                remote,
            });
            match outcome {
                Ok(response) => Ok(soap_response(response)),
                Err(err) => {
                    warn!(error = %err, "dispatch failed");
                    let status = StatusCode::from_u16(err.status_code())
                        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                    Ok(status_response(status))
                }
            }
        })
    }
}

fn status_response(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

fn soap_response(soap: SoapResponse) -> Response<Body> {
    let mut response = Response::new(Body::from(soap.body));
    if let Some(content_type) = soap.content_type {
        if let Ok(value) = HeaderValue::from_str(&content_type) {
            response.headers_mut().insert(CONTENT_TYPE, value);
        }
    }
    for (name, value) in soap.headers {
        let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
            continue;
        };
        let Ok(value) = HeaderValue::from_str(&value) else {
            continue;
        };
        response.headers_mut().insert(name, value);
    }
    response
}

/// Router sugar for mounting endpoints.
pub trait SoapRouterExt {
    /// Dispatches requests for the endpoint's path; all other requests
    /// continue to the router's own routes.
    fn soap_endpoint<S>(self, endpoint: Endpoint<S>) -> Self
    where
        S: Send + Sync + 'static;
}

impl SoapRouterExt for Router {
    fn soap_endpoint<S>(self, endpoint: Endpoint<S>) -> Self
    where
        S: Send + Sync + 'static,
    {
        self.layer(SoapEndpointLayer::new(endpoint))
    }
}

/// Binds `addr` and serves the router with connect info installed, so
/// dispatch records real peer addresses instead of the loopback
/// fallback.
pub async fn serve(router: Router, addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    debug!(%addr, "soap endpoint listening");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}
