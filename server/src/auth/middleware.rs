//! Authentication Middleware
//!
//! `require_auth` resolves the gateway token to a citizen account; the
//! role middlewares then elevate the request with the caller's grantee,
//! administrator or site manager record.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::actors::models::{Administrator, Citizen, Grantee, SiteManager};
use crate::actors::queries::{
    find_administrator_by_citizen, find_citizen_by_id, find_grantee_by_citizen,
    find_manager_by_citizen,
};
use crate::api::AppState;
use crate::catalog::queries::find_department_by_administrator;

use super::error::AuthError;
use super::jwt::validate_gateway_token;

/// Authenticated citizen injected into request extensions.
///
/// This is a minimal struct containing only safe-to-expose account data.
/// Use this in handlers to access the current citizen.
#[derive(Debug, Clone)]
pub struct AuthCitizen {
    /// Citizen ID.
    pub id: Uuid,
    /// Username.
    pub username: String,
    /// Email.
    pub email: String,
    /// Whether the gateway has verified the email.
    pub email_verified: bool,
}

impl From<Citizen> for AuthCitizen {
    fn from(citizen: Citizen) -> Self {
        Self {
            id: citizen.id,
            username: citizen.username,
            email: citizen.email,
            email_verified: citizen.email_verified,
        }
    }
}

/// Grantee role record injected by [`require_grantee`].
#[derive(Debug, Clone)]
pub struct GranteeContext {
    pub grantee: Grantee,
}

/// Administrator role record plus the department they run, injected by
/// [`require_administrator`]. An administrator without a department
/// never reaches a handler.
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub administrator: Administrator,
    pub department_id: Uuid,
}

/// Site manager role record injected by [`require_manager`].
#[derive(Debug, Clone)]
pub struct ManagerContext {
    pub manager: SiteManager,
}

/// Middleware to require authentication.
///
/// Extracts the Bearer token from the Authorization header, validates it
/// against the gateway's public key, loads the citizen account, and
/// injects [`AuthCitizen`] into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingAuthHeader)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?;

    let claims = validate_gateway_token(token, &state.config.gateway_public_key)?;

    let citizen_id: Uuid = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;

    let citizen = find_citizen_by_id(&state.db, citizen_id)
        .await?
        .ok_or(AuthError::UnknownCitizen)?;

    request.extensions_mut().insert(AuthCitizen::from(citizen));

    Ok(next.run(request).await)
}

/// Middleware to require the grantee role.
///
/// Must run after [`require_auth`].
pub async fn require_grantee(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth = current_citizen(&request)?;

    let grantee = find_grantee_by_citizen(&state.db, auth.id)
        .await?
        .ok_or(AuthError::RoleRequired("Grantee"))?;

    request.extensions_mut().insert(GranteeContext { grantee });

    Ok(next.run(request).await)
}

/// Middleware to require the administrator role.
///
/// Must run after [`require_auth`]. Administrators without an assigned
/// department are rejected outright since every administrator operation
/// is scoped to one.
pub async fn require_administrator(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth = current_citizen(&request)?;

    let administrator = find_administrator_by_citizen(&state.db, auth.id)
        .await?
        .ok_or(AuthError::RoleRequired("Administrator"))?;

    let department = find_department_by_administrator(&state.db, administrator.id)
        .await?
        .ok_or(AuthError::DepartmentUnassigned)?;

    request.extensions_mut().insert(AdminContext {
        administrator,
        department_id: department.id,
    });

    Ok(next.run(request).await)
}

/// Middleware to require the site manager role.
///
/// Must run after [`require_auth`].
pub async fn require_manager(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth = current_citizen(&request)?;

    let manager = find_manager_by_citizen(&state.db, auth.id)
        .await?
        .ok_or(AuthError::RoleRequired("Site manager"))?;

    request.extensions_mut().insert(ManagerContext { manager });

    Ok(next.run(request).await)
}

fn current_citizen(request: &Request) -> Result<AuthCitizen, AuthError> {
    request
        .extensions()
        .get::<AuthCitizen>()
        .cloned()
        .ok_or(AuthError::MissingAuthHeader)
}

impl<S> axum::extract::FromRequestParts<S> for AuthCitizen
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(AuthError::MissingAuthHeader)
    }
}

impl<S> axum::extract::FromRequestParts<S> for GranteeContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(AuthError::RoleRequired("Grantee"))
    }
}

impl<S> axum::extract::FromRequestParts<S> for AdminContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(AuthError::RoleRequired("Administrator"))
    }
}

impl<S> axum::extract::FromRequestParts<S> for ManagerContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(AuthError::RoleRequired("Site manager"))
    }
}
