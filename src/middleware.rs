use std::rc::Rc;
use std::sync::Arc;

use actix_service::{forward_ready, Service};
use actix_web::body::EitherBody;
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ok, ready, LocalBoxFuture, Ready};

use crate::auth::{Identity, Role, TokenService};
use crate::error::ApiError;

pub const TOKEN_HEADER: &str = "auth-token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Any valid token.
    Any,
    /// Only a token issued to a shopper.
    User,
}

impl Access {
    fn allows(self, role: Role) -> bool {
        match self {
            Access::Any => true,
            Access::User => role == Role::User,
        }
    }
}

/// Verifies the token in the request header, if any, without requiring one.
pub fn identify(req: &HttpRequest, tokens: &TokenService) -> Option<Identity> {
    let token = req.headers().get(TOKEN_HEADER)?.to_str().ok()?;
    tokens.verify(token).ok()
}

// Middleware factory
pub struct AuthMiddleware {
    tokens: Arc<TokenService>,
    access: Access,
}

impl AuthMiddleware {
    pub fn new(tokens: Arc<TokenService>, access: Access) -> Self {
        AuthMiddleware { tokens, access }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();

    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Rc::new(service),
            tokens: self.tokens.clone(),
            access: self.access,
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    tokens: Arc<TokenService>,
    access: Access,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let tokens = self.tokens.clone();
        let service = self.service.clone();
        let access = self.access;

        Box::pin(async move {
            let identity = req
                .headers()
                .get(TOKEN_HEADER)
                .and_then(|value| value.to_str().ok())
                .ok_or(ApiError::Unauthorized)
                .and_then(|token| tokens.verify(token))
                .and_then(|identity| {
                    if access.allows(identity.role) {
                        Ok(identity)
                    } else {
                        Err(ApiError::Unauthorized)
                    }
                });

            match identity {
                Ok(identity) => {
                    req.extensions_mut().insert(identity);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(e) => Ok(req.error_response(e).map_into_right_body()),
            }
        })
    }
}

/// Handlers behind [`AuthMiddleware`] take the caller's identity as an argument.
impl FromRequest for Identity {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Identity>()
                .cloned()
                .ok_or(ApiError::Unauthorized),
        )
    }
}
