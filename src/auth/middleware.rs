use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::gate::authorize;
use crate::auth::token::{Claims, TokenService};
use crate::error::AppError;

/// Access control gate for a resource.
///
/// Requires the `TokenService` to be registered as `web::Data`. On success the
/// validated `Claims` are placed in the request extensions; on rejection the
/// request is answered directly with the matching 401/403 response.
#[derive(Debug, Clone, Copy)]
pub struct AuthMiddleware {
    require_admin: bool,
}

impl AuthMiddleware {
    /// Any valid token.
    pub fn authenticated() -> Self {
        Self {
            require_admin: false,
        }
    }

    /// A valid token carrying the admin claim.
    pub fn admin() -> Self {
        Self {
            require_admin: true,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            require_admin: self.require_admin,
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    require_admin: bool,
}

impl<S> AuthMiddlewareService<S> {
    fn check(&self, req: &ServiceRequest) -> Result<Claims, AppError> {
        let tokens = req
            .app_data::<web::Data<TokenService>>()
            .ok_or_else(|| AppError::Configuration("token service is not registered".into()))?;

        let header = req
            .headers()
            .get(header::AUTHORIZATION)
            .map(|value| value.to_str().map_err(|_| AppError::MalformedCredential))
            .transpose()?;

        authorize(header, tokens.get_ref(), self.require_admin)
    }
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match self.check(&req) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(err) => {
                log::debug!("{} {} rejected: {}", req.method(), req.path(), err);
                let response = req
                    .into_response(err.error_response())
                    .map_into_right_body();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}
