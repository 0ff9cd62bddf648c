use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::{
    audit::log_audit,
    dto::auth::{Claims, LoginRequest, LoginResponse},
    dto::users::UserWithRole,
    entity::{
        roles::Entity as Roles,
        users::{Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::user_service::{role_from_entity, user_from_entity},
    state::AppState,
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn issue_token(user: &UserModel, role_name: &str) -> AppResult<String> {
    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: role_name.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub async fn login(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;

    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("Invalid email or password".into())),
    };

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    let role = Roles::find_by_id(user.role_id).one(&state.orm).await?;
    let role = match role {
        Some(r) => r,
        // A user whose role no longer resolves cannot establish a session.
        None => return Err(AppError::Unauthorized),
    };

    let token = issue_token(&user, &role.name)?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "user_login",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let resp = LoginResponse {
        token,
        user: UserWithRole {
            user: user_from_entity(user),
            role: Some(role_from_entity(role)),
        },
    };

    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

pub async fn logout(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<serde_json::Value>> {
    // Tokens are stateless; the client discards its copy. Record the event.
    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "user_logout",
        Some("users"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Logged out",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Session re-validation. A profile whose role cannot be resolved is treated
/// as an invalid session rather than served partially.
pub async fn whoami(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UserWithRole>> {
    let found = Users::find_by_id(user.user_id)
        .find_also_related(Roles)
        .one(&state.orm)
        .await?;

    let (user, role) = match found {
        Some((user, Some(role))) => (user, role),
        Some((_, None)) => return Err(AppError::Unauthorized),
        None => return Err(AppError::Unauthorized),
    };

    Ok(ApiResponse::success(
        "OK",
        UserWithRole {
            user: user_from_entity(user),
            role: Some(role_from_entity(role)),
        },
        Some(Meta::empty()),
    ))
}
