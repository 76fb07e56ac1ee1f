/// Request verification middleware.
///
/// Runs on every inbound request. A bearer credential, when present and
/// valid, establishes a request-scoped `CurrentAccount` in the request
/// extensions; everything downstream reads identity from there. A request
/// without a usable credential passes through unauthenticated, since
/// anonymous access is valid for public endpoints; denial is the job of
/// the `Authenticated` extractor on protected handlers.
///
/// The one immediate rejection: a refresh token presented as access proof
/// is answered with 401 on the spot.

use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::InternalError,
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use futures::future::LocalBoxFuture;
use sqlx::PgPool;
use std::future::{ready, Ready};
use std::rc::Rc;
use uuid::Uuid;

use crate::accounts::{self, Role};
use crate::auth::{jwt, refresh_token, Claims};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// The authenticated identity for the current request.
#[derive(Debug, Clone)]
pub struct CurrentAccount {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

/// Extractor for handlers that require an established identity.
/// Yields 401 when the middleware did not establish one.
pub struct Authenticated(pub CurrentAccount);

impl FromRequest for Authenticated {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<CurrentAccount>()
                .cloned()
                .map(Authenticated)
                .ok_or(AppError::Auth(AuthError::MissingToken)),
        )
    }
}

pub struct AuthenticationMiddleware {
    jwt_config: JwtSettings,
    pool: PgPool,
}

impl AuthenticationMiddleware {
    pub fn new(jwt_config: JwtSettings, pool: PgPool) -> Self {
        Self { jwt_config, pool }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthenticationMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticationMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthenticationMiddlewareService {
            service: Rc::new(service),
            jwt_config: self.jwt_config.clone(),
            pool: self.pool.clone(),
        }))
    }
}

pub struct AuthenticationMiddlewareService<S> {
    service: Rc<S>,
    jwt_config: JwtSettings,
    pool: PgPool,
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddlewareService<S>
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
        let bearer = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(|t| t.to_string());

        let service = Rc::clone(&self.service);
        let jwt_config = self.jwt_config.clone();
        let pool = self.pool.clone();

        Box::pin(async move {
            // No bearer credential: anonymous pass-through.
            let token = match bearer {
                Some(token) => token,
                None => return service.call(req).await,
            };

            match jwt::decode(&token, &jwt_config) {
                Err(e) => {
                    // Undecodable credential: no identity is established;
                    // protected handlers will refuse the request.
                    tracing::warn!(error = %e, "Presented credential failed to decode");
                }
                Ok(claims) => {
                    // A refresh token is never acceptable as access proof.
                    if claims.is_renewal() {
                        tracing::warn!("Refresh token presented as access credential");
                        let response = HttpResponse::Unauthorized().json(serde_json::json!({
                            "error": "Refresh tokens cannot be used for access",
                            "code": "TOKEN_INVALID"
                        }));
                        return Err(
                            InternalError::from_response("Unauthorized", response).into()
                        );
                    }

                    if req.extensions().get::<CurrentAccount>().is_none() {
                        match establish_identity(&pool, &claims).await {
                            Ok(current) => {
                                tracing::debug!(
                                    account_id = %current.id,
                                    role = %current.role,
                                    "Authenticated identity established"
                                );
                                req.extensions_mut().insert(current);
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "Credential rejected");
                            }
                        }
                    }
                }
            }

            service.call(req).await
        })
    }
}

/// Build the request identity from verified claims.
///
/// The subject must resolve to an account, the credential must be unexpired
/// and agree with the resolved account, and a live (existing, unexpired)
/// refresh token must still back the session. Deleting the refresh token at
/// logout is what makes this fail for otherwise-valid access tokens.
async fn establish_identity(pool: &PgPool, claims: &Claims) -> Result<CurrentAccount, AppError> {
    let account_id = claims.account_id()?;

    let account = accounts::find_by_id(pool, &account_id)
        .await?
        .ok_or(AppError::Auth(AuthError::UnknownAccount))?;

    if claims.is_expired() {
        return Err(AppError::Auth(AuthError::TokenInvalid));
    }

    if claims.sub != account.id.to_string() {
        return Err(AppError::Auth(AuthError::MalformedCredential));
    }

    let stored = refresh_token::find_by_account(pool, &account.id)
        .await?
        .ok_or(AppError::Auth(AuthError::RefreshTokenNotFound))?;

    if stored.is_expired(chrono::Utc::now()) {
        return Err(AppError::Auth(AuthError::TokenInvalid));
    }

    Ok(CurrentAccount {
        id: account.id,
        username: account.username,
        role: account.role,
    })
}
