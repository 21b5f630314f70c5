// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account endpoints: registration, login, token refresh, password recovery
//! and the caller's profile.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::extract::ApiJson;
use crate::{
    auth::{Auth, ClientIp, IdentityGate, Registration, Role, TokenPair},
    error::ApiError,
    models::{
        ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, RefreshTokenRequest,
        RegisterRequest, ResetPasswordRequest, UserProfile,
    },
    state::AppState,
};

/// Create a STUDENT or INSTRUCTOR account.
#[utoipa::path(
    post,
    path = "/register",
    tag = "Accounts",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserProfile),
        (status = 400, description = "Missing field, invalid email or short password"),
        (status = 403, description = "Role cannot be self-assigned"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let role = request
        .role
        .as_deref()
        .map(|r| Role::parse(r).ok_or_else(|| ApiError::bad_request(format!("Unknown role: {r}"))))
        .transpose()?;

    let gate = IdentityGate::new(&state.db, &state.tokens);
    let user = gate
        .register(Registration {
            email: request.email,
            name: request.name,
            password: request.password,
            role,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserProfile::from(user))))
}

/// Exchange credentials for an access/refresh token pair.
///
/// Limited per client IP; excess attempts get 429 with `Retry-After`.
#[utoipa::path(
    post,
    path = "/login",
    tag = "Accounts",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid email or password"),
        (status = 429, description = "Too many login attempts")
    )
)]
pub async fn login(
    ClientIp(ip): ClientIp,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, Response> {
    state
        .login_limiter
        .check(ip)
        .map_err(IntoResponse::into_response)?;

    let gate = IdentityGate::new(&state.db, &state.tokens);
    let (user, tokens) = gate
        .login(&request.email, &request.password)
        .await
        .map_err(|e| ApiError::from(e).into_response())?;

    Ok(Json(LoginResponse {
        user: UserProfile::from(user),
        tokens,
    }))
}

#[utoipa::path(
    post,
    path = "/refresh-token",
    tag = "Accounts",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 400, description = "Refresh token missing"),
        (status = 401, description = "Invalid, expired or wrong kind of token")
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RefreshTokenRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    if request.refresh_token.is_empty() {
        return Err(ApiError::bad_request("Refresh token is required"));
    }
    let gate = IdentityGate::new(&state.db, &state.tokens);
    Ok(Json(gate.refresh(&request.refresh_token)?))
}

/// Request a password reset. The answer never reveals whether the account
/// exists.
#[utoipa::path(
    post,
    path = "/forgot-password",
    tag = "Accounts",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 202, description = "Request accepted", body = MessageResponse),
        (status = 400, description = "Email missing")
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ForgotPasswordRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    if request.email.trim().is_empty() {
        return Err(ApiError::bad_request("Email is required"));
    }
    let gate = IdentityGate::new(&state.db, &state.tokens);
    gate.forgot_password(&request.email)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse::new(
            "If an account exists for this email, a reset link has been sent",
        )),
    ))
}

#[utoipa::path(
    post,
    path = "/reset-password",
    tag = "Accounts",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Token missing or password too short"),
        (status = 401, description = "Invalid, expired or already used token")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if request.token.is_empty() {
        return Err(ApiError::bad_request("Reset token is required"));
    }
    let gate = IdentityGate::new(&state.db, &state.tokens);
    gate.reset_password(&request.token, request.new_password).await?;
    Ok(Json(MessageResponse::new("Password has been reset")))
}

/// Profile of the authenticated caller.
#[utoipa::path(
    get,
    path = "/me",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller profile", body = UserProfile),
        (status = 401, description = "Unauthorized - invalid or missing token")
    )
)]
pub async fn me(Auth(user): Auth, State(state): State<AppState>) -> Result<Json<UserProfile>, ApiError> {
    let gate = IdentityGate::new(&state.db, &state.tokens);
    Ok(Json(UserProfile::from(gate.me(user.user_id)?)))
}
