//! Registration, login, and the per-request credential check.
//!
//! Every authorized handler calls [`authenticate`] with the request headers
//! as its first step: the credential is always an explicit argument, never
//! ambient state. Role gates are exhaustive matches over [`Role`] so a new
//! role cannot silently slip past an authorization point.

use axum::extract::{Path, State};
use axum::http::{header::AUTHORIZATION, HeaderMap};
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use ecowear_shared::token::{issue_token, verify_token, AuthToken};
use ecowear_shared::Role;
use ecowear_store::{StoreError, User};

use crate::api::AppState;
use crate::error::{require_text, ApiError};

/// The caller identity a valid credential resolves to.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

/// Resolve the request credential to a caller identity, or reject.
///
/// Missing header and undecodable/expired/forged token are both surfaced as
/// `Unauthorized`; the distinction only shows in the message.
pub fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<AuthUser, ApiError> {
    let encoded = bearer_token(headers)?;
    let token = AuthToken::decode(encoded)?;
    verify_token(&token, &state.verifying_key)?;

    Ok(AuthUser {
        user_id: token.user_id,
        role: token.role,
    })
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Err(ApiError::Unauthorized(
            "No token, authorization denied".to_string(),
        ));
    };

    let value = value
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Token is not valid".to_string()))?;

    Ok(value.strip_prefix("Bearer ").unwrap_or(value))
}

/// Admin gate for the seller-management endpoints.
pub fn ensure_admin(caller: &AuthUser) -> Result<(), ApiError> {
    match caller.role {
        Role::Admin => Ok(()),
        Role::Buyer | Role::Seller => Err(ApiError::Forbidden(
            "Admin access required".to_string(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct RegisterRequest {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    role: Option<Role>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct AuthResponse {
    token: String,
    user: UserSummary,
}

#[derive(Serialize, Debug)]
pub struct UserSummary {
    id: Uuid,
    name: String,
    role: Role,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SellerView {
    id: Uuid,
    name: String,
    email: String,
    is_verified: bool,
}

fn auth_response(state: &AppState, user: &User) -> AuthResponse {
    let token = issue_token(
        user.id,
        user.role,
        Duration::hours(state.config.token_ttl_hours),
        &state.signing_key,
    );

    AuthResponse {
        token: token.encode(),
        user: UserSummary {
            id: user.id,
            name: user.name.clone(),
            role: user.role,
        },
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let name = require_text(req.name, "name")?;
    let email = require_text(req.email, "email")?;
    let password = require_text(req.password, "password")?;

    let role = match req.role.unwrap_or(Role::Buyer) {
        role @ (Role::Buyer | Role::Seller) => role,
        Role::Admin => {
            return Err(ApiError::Validation(
                "Admin accounts cannot be self-registered".to_string(),
            ))
        }
    };

    let password_hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let user = {
        let db = state.db.lock().await;

        match db.get_user_by_email(&email) {
            Ok(_) => {
                return Err(ApiError::Validation(
                    "Email already registered".to_string(),
                ))
            }
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let user = User {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            role,
            is_verified: false,
            created_at: Utc::now(),
        };
        db.create_user(&user)?;
        user
    };

    info!(user = %user.id, role = %user.role, "account registered");

    Ok(Json(auth_response(&state, &user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = require_text(req.email, "email")?;
    let password = require_text(req.password, "password")?;

    let user = match state.db.lock().await.get_user_by_email(&email) {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            return Err(ApiError::Unauthorized("Invalid credentials".to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    let password_ok = bcrypt::verify(&password, &user.password_hash)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if !password_ok {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    Ok(Json(auth_response(&state, &user)))
}

/// Seller accounts with their verification state. Admin only.
pub async fn list_sellers(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<SellerView>>, ApiError> {
    let caller = authenticate(&headers, &state)?;
    ensure_admin(&caller)?;

    let sellers = state.db.lock().await.list_sellers()?;

    Ok(Json(
        sellers
            .into_iter()
            .map(|u| SellerView {
                id: u.id,
                name: u.name,
                email: u.email,
                is_verified: u.is_verified,
            })
            .collect(),
    ))
}

/// Mark an account as verified. Admin only.
pub async fn verify_seller(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let caller = authenticate(&headers, &state)?;
    ensure_admin(&caller)?;

    let updated = state.db.lock().await.set_verified(id, true)?;
    if !updated {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    info!(user = %id, "seller verified");
    Ok(Json(serde_json::json!({ "verified": true })))
}
