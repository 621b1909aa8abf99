/// Bearer-token middleware for protected scopes.
///
/// Pulls the token out of the Authorization header, runs it through the
/// access guard (signature, expiry, revocation, token family), and
/// injects the validated claims into request extensions so handlers can
/// take them via `web::ReqData<TokenClaims>`.
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::Arc;

use crate::auth::AccessGuard;
use crate::error::ApiError;

pub struct BearerAuth {
    guard: Arc<AccessGuard>,
}

impl BearerAuth {
    pub fn new(guard: Arc<AccessGuard>) -> Self {
        Self { guard }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(BearerAuthService {
            service: Rc::new(service),
            guard: self.guard.clone(),
        }))
    }
}

pub struct BearerAuthService<S> {
    service: Rc<S>,
    guard: Arc<AccessGuard>,
}

impl<S, B> Service<ServiceRequest> for BearerAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::to_string);

        let guard = self.guard.clone();
        let service = self.service.clone();

        Box::pin(async move {
            let Some(token) = token else {
                tracing::warn!(path = %req.path(), "missing or malformed Authorization header");
                return Err(ApiError::AccessTokenRequired.into());
            };

            let claims = guard.require_access_token(&token).await?;
            tracing::debug!(user_id = %claims.sub, "bearer token accepted");
            req.extensions_mut().insert(claims);

            service.call(req).await
        })
    }
}
