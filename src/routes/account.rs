/// Account routes.

use actix_web::{web, HttpResponse};
use serde::Serialize;
use sqlx::PgPool;

use crate::accounts;
use crate::error::{AppError, AuthError};
use crate::middleware::Authenticated;

#[derive(Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub username: String,
    pub role: String,
    pub created_at: String,
}

/// GET /api/v1/accounts/me
///
/// The authenticated account's own details. Identity comes from the
/// request verification middleware; without one the extractor answers 401.
pub async fn me(
    auth: Authenticated,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let account = accounts::find_by_id(pool.get_ref(), &auth.0.id)
        .await?
        .ok_or(AppError::Auth(AuthError::UnknownAccount))?;

    Ok(HttpResponse::Ok().json(AccountResponse {
        id: account.id.to_string(),
        username: account.username,
        role: account.role.to_string(),
        created_at: account.created_at.to_rfc3339(),
    }))
}
