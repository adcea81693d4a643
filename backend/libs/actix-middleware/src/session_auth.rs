use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, HttpResponse,
};
use futures::future::{ready, Ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "jwt";

pub type ResolveError = Box<dyn std::error::Error + Send + Sync>;

/// Authenticated user ID resolved by the session gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub Uuid);

/// Looks up whether the identity named in a valid token still exists
#[async_trait::async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn identity_exists(&self, user_id: Uuid) -> Result<bool, ResolveError>;
}

/// Session gate middleware
///
/// Reads the `jwt` cookie, verifies signature and expiry, confirms the user
/// still exists and stores `UserId` in the request extensions. Rejections
/// are rendered as `401 {"error": ...}` responses; a failing lookup is a 500.
#[derive(Clone)]
pub struct SessionAuth {
    resolver: Arc<dyn IdentityResolver>,
}

impl SessionAuth {
    pub fn new(resolver: Arc<dyn IdentityResolver>) -> Self {
        Self { resolver }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = SessionAuthService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionAuthService {
            service: Rc::new(service),
            resolver: self.resolver.clone(),
        }))
    }
}

pub struct SessionAuthService<S> {
    service: Rc<S>,
    resolver: Arc<dyn IdentityResolver>,
}

impl<S, B> Service<ServiceRequest> for SessionAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let resolver = self.resolver.clone();

        Box::pin(async move {
            let token = match req.cookie(SESSION_COOKIE) {
                Some(cookie) if !cookie.value().is_empty() => cookie.value().to_string(),
                _ => return Ok(reject(req, "Unauthorized: No Token Provided")),
            };

            let user_id = match crypto_core::jwt::get_user_id_from_token(&token) {
                Ok(user_id) => user_id,
                Err(e) => {
                    tracing::warn!(error = %e, "session token rejected");
                    return Ok(reject(req, "Unauthorized: Invalid Token"));
                }
            };

            match resolver.identity_exists(user_id).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(%user_id, "session refers to a user that no longer exists");
                    return Ok(reject(req, "Unauthorized: User not found"));
                }
                Err(e) => {
                    tracing::error!(%user_id, error = %e, "session identity lookup failed");
                    let response = HttpResponse::InternalServerError()
                        .json(serde_json::json!({ "error": "Internal server error" }));
                    return Ok(req.into_response(response).map_into_right_body());
                }
            }

            req.extensions_mut().insert(UserId(user_id));

            service.call(req).await.map(ServiceResponse::map_into_left_body)
        })
    }
}

fn reject<B>(req: ServiceRequest, message: &str) -> ServiceResponse<EitherBody<B>> {
    let response = HttpResponse::Unauthorized().json(serde_json::json!({ "error": message }));
    req.into_response(response).map_into_right_body()
}

/// FromRequest implementation for UserId
impl actix_web::FromRequest for UserId {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<UserId>() {
            Some(user_id) => ready(Ok(*user_id)),
            None => ready(Err(actix_web::error::ErrorUnauthorized(
                "User not authenticated",
            ))),
        }
    }
}
