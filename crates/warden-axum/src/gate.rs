//! Tower middleware that guards every non-exempt route.
//!
//! The [`RequestGateLayer`] resolves the `Authorization: Bearer` credential,
//! attaches an [`AuthContext`] to the request and calls the inner service.
//! Any failure short-circuits with the uniform 401 body.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{header, HeaderMap, Request};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use pin_project_lite::pin_project;
use tower::{Layer, Service};
use warden_auth_core::AuthError;

use crate::authenticator::SharedAuthenticator;
use crate::context::AuthContext;
use crate::error::AccessError;

/// A path that bypasses authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// Matches the path exactly.
    Exact(String),
    /// Matches the path and everything below it (`/docs`, `/docs/x`, not `/docsx`).
    Prefix(String),
}

impl PathPattern {
    #[must_use]
    pub fn exact(path: impl Into<String>) -> Self {
        Self::Exact(path.into())
    }

    #[must_use]
    pub fn prefix(path: impl Into<String>) -> Self {
        Self::Prefix(path.into().trim_end_matches('/').to_string())
    }

    /// Check a request path against this pattern.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(exact) => path == exact,
            Self::Prefix(prefix) => path
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/')),
        }
    }
}

/// Configuration for the request gate.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Paths served without a credential.
    pub exempt: Vec<PathPattern>,
}

impl Default for GateConfig {
    /// Login/signup, health probes, docs and the static root.
    fn default() -> Self {
        Self {
            exempt: vec![
                PathPattern::exact("/"),
                PathPattern::exact("/health"),
                PathPattern::exact("/ready"),
                PathPattern::exact("/api/auth/login"),
                PathPattern::exact("/api/auth/signup"),
                PathPattern::prefix("/docs"),
                PathPattern::prefix("/static"),
            ],
        }
    }
}

impl GateConfig {
    /// Config with no exemptions at all.
    #[must_use]
    pub fn new() -> Self {
        Self { exempt: Vec::new() }
    }

    /// Add an exempt path.
    #[must_use]
    pub fn exempt(mut self, pattern: PathPattern) -> Self {
        self.exempt.push(pattern);
        self
    }

    /// Whether `path` bypasses authentication.
    #[must_use]
    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt.iter().any(|p| p.matches(path))
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Tower layer that adds the request gate.
#[derive(Clone)]
pub struct RequestGateLayer {
    authenticator: SharedAuthenticator,
    config: Arc<GateConfig>,
}

impl RequestGateLayer {
    /// Create a new gate layer.
    #[must_use]
    pub fn new(authenticator: SharedAuthenticator, config: GateConfig) -> Self {
        Self {
            authenticator,
            config: Arc::new(config),
        }
    }
}

impl<S> Layer<S> for RequestGateLayer {
    type Service = RequestGate<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestGate {
            inner,
            authenticator: Arc::clone(&self.authenticator),
            config: Arc::clone(&self.config),
        }
    }
}

/// The request gate service.
#[derive(Clone)]
pub struct RequestGate<S> {
    inner: S,
    authenticator: SharedAuthenticator,
    config: Arc<GateConfig>,
}

impl<S> Service<Request<Body>> for RequestGate<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = RequestGateFuture<S>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // The driven clone is the one that was polled ready
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        if self.config.is_exempt(req.uri().path()) {
            return RequestGateFuture {
                state: FutureState::Calling {
                    future: inner.call(req),
                },
            };
        }

        let bearer = bearer_token(req.headers());
        let authenticator = Arc::clone(&self.authenticator);
        let auth = Box::pin(async move { authenticator.authenticate(bearer.as_deref()).await });

        RequestGateFuture {
            state: FutureState::Authenticating {
                inner: Some(inner),
                req: Some(req),
                auth,
            },
        }
    }
}

pin_project! {
    /// Future for the request gate.
    pub struct RequestGateFuture<S>
    where
        S: Service<Request<Body>, Response = Response>,
    {
        #[pin]
        state: FutureState<S>,
    }
}

pin_project! {
    #[project = FutureStateProj]
    enum FutureState<S>
    where
        S: Service<Request<Body>, Response = Response>,
    {
        Authenticating {
            inner: Option<S>,
            req: Option<Request<Body>>,
            auth: BoxFuture<'static, Result<AuthContext, AuthError>>,
        },
        Calling {
            #[pin]
            future: S::Future,
        },
        Done,
    }
}

impl<S> Future for RequestGateFuture<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Output = Result<Response, S::Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        loop {
            let this = self.as_mut().project();

            match this.state.project() {
                FutureStateProj::Authenticating { inner, req, auth } => {
                    let outcome = match auth.as_mut().poll(cx) {
                        Poll::Ready(outcome) => outcome,
                        Poll::Pending => return Poll::Pending,
                    };

                    let (Some(mut service), Some(mut request)) = (inner.take(), req.take()) else {
                        unreachable!("request gate polled after completion");
                    };

                    match outcome {
                        Ok(context) => {
                            tracing::debug!(
                                user_id = %context.user_id(),
                                kind = %context.kind,
                                path = request.uri().path(),
                                "Request authenticated"
                            );
                            request.extensions_mut().insert(context);
                            let future = service.call(request);
                            self.set(RequestGateFuture {
                                state: FutureState::Calling { future },
                            });
                        }
                        Err(e) => {
                            tracing::debug!(
                                path = request.uri().path(),
                                "Request rejected: {}",
                                e
                            );
                            self.set(RequestGateFuture {
                                state: FutureState::Done,
                            });
                            return Poll::Ready(Ok(AccessError::Unauthorized.into_response()));
                        }
                    }
                }
                FutureStateProj::Calling { future } => {
                    return future.poll(cx);
                }
                FutureStateProj::Done => {
                    panic!("polled after completion");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_path_patterns() {
        let docs = PathPattern::prefix("/docs/");
        assert!(docs.matches("/docs"));
        assert!(docs.matches("/docs/openapi.json"));
        assert!(!docs.matches("/docsx"));

        let health = PathPattern::exact("/health");
        assert!(health.matches("/health"));
        assert!(!health.matches("/health/deep"));
    }

    #[test]
    fn test_default_exemptions() {
        let config = GateConfig::default();
        for path in ["/", "/health", "/ready", "/api/auth/login", "/api/auth/signup", "/docs/x"] {
            assert!(config.is_exempt(path), "{path} should be exempt");
        }
        for path in ["/api/auth/me", "/api/auth/logout", "/api/api-keys", "/api/auth/login/x"] {
            assert!(!config.is_exempt(path), "{path} should be gated");
        }
    }

    #[test]
    fn test_config_builder() {
        let config = GateConfig::new().exempt(PathPattern::exact("/metrics"));
        assert!(config.is_exempt("/metrics"));
        assert!(!config.is_exempt("/health"));
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def".to_string()));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
