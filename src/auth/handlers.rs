use axum::{
    extract::{FromRef, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            LoginRequest, LoginResponse, MessageResponse, Profile, ProfileResponse, PublicUser,
            SignupRequest, SignupResponse, VerifyTokenResponse,
        },
        jwt::{bearer_token, AuthUser, JwtKeys},
        session::{clear_session_cookie, session_cookie, session_from_cookies},
        validation::{check_email, check_password, check_username, normalize_email, require},
    },
    error::ApiError,
    extract::ApiJson,
    state::AppState,
    store::{NewUser, StoreError},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile))
        .route("/verify-token", get(verify_token))
}

/// Runs password hashing off the async workers.
async fn blocking<T, F>(f: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let SignupRequest {
        username,
        email,
        password,
    } = payload;
    let email = normalize_email(&email);

    let mut errors = Vec::new();
    check_username(&username, &mut errors);
    check_email(&email, &mut errors);
    if !errors.is_empty() {
        check_password(&password, &mut errors);
        warn!(errors = errors.len(), "signup validation failed");
        return Err(ApiError::Validation(errors));
    }

    // A taken identity is reported before password rules.
    let existing = state
        .store
        .find_by_username_or_email(&username, &email)
        .await
        .map_err(ApiError::database)?;
    if existing.is_some() {
        warn!(%username, "username or email already registered");
        return Err(ApiError::Conflict("Username or email already exists"));
    }

    check_password(&password, &mut errors);
    if !errors.is_empty() {
        warn!(%username, "signup password rejected");
        return Err(ApiError::Validation(errors));
    }

    let passwords = state.passwords.clone();
    let password_hash = blocking(move || passwords.hash(&password))
        .await
        .map_err(|e| ApiError::internal("Internal server error", e))?;

    let user = match state
        .store
        .create_user(NewUser {
            username,
            email,
            password_hash,
        })
        .await
    {
        Ok(u) => u,
        Err(StoreError::Conflict) => {
            warn!("signup lost a race on username or email");
            return Err(ApiError::Conflict("Username or email already exists"));
        }
        Err(e) => return Err(ApiError::internal("Failed to create user", e)),
    };

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully",
            user_id: user.id,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = Vec::new();
    require("username", &payload.username, "Username is required", &mut errors);
    require("password", &payload.password, "Password is required", &mut errors);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let login = payload.username.trim().to_string();
    let email = normalize_email(&login);
    let found = state
        .store
        .find_active_for_login(&login, &email)
        .await
        .map_err(ApiError::database)?;

    let passwords = state.passwords.clone();
    let password = payload.password;
    let Some(user) = found else {
        if let Err(e) = blocking(move || passwords.verify_dummy(&password)).await {
            warn!(error = %e, "dummy password check failed");
        }
        warn!("login for unknown account");
        return Err(ApiError::InvalidCredentials);
    };

    let hash = user.password_hash.clone();
    let ok = blocking(move || passwords.verify(&password, &hash))
        .await
        .map_err(|e| ApiError::internal("Internal server error", e))?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    {
        let store = state.store.clone();
        let user_id = user.id;
        tokio::spawn(async move {
            if let Err(e) = store.touch_last_login(user_id).await {
                error!(error = %e, %user_id, "failed to update last login");
            }
        });
    }

    let expires_at =
        OffsetDateTime::now_utc() + TimeDuration::minutes(state.config.session.ttl_minutes);
    let session = state
        .store
        .create_session(user.id, expires_at)
        .await
        .map_err(|e| ApiError::internal("Failed to create session", e))?;

    let token = JwtKeys::from_ref(&state)
        .sign(&user, session.session_token)
        .map_err(|e| ApiError::internal("Internal server error", e))?;

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok((
        [(
            header::SET_COOKIE,
            session_cookie(&state.config.session, session.session_token),
        )],
        Json(LoginResponse {
            message: "Login successful",
            token,
            user: PublicUser::from(&user),
        }),
    ))
}

/// Ends the server-side session named by the cookie, or by the bearer token's
/// `jti` when no cookie is sent. Succeeds even when there is nothing to end.
#[instrument(skip(state, headers))]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let cookie_name = &state.config.session.cookie_name;
    let session = session_from_cookies(&headers, cookie_name).or_else(|| {
        bearer_token(&headers)
            .and_then(|t| JwtKeys::from_ref(&state).verify(t).ok())
            .map(|claims| claims.jti)
    });

    if let Some(token) = session {
        let ended = state
            .store
            .deactivate_session(token)
            .await
            .map_err(|e| ApiError::internal("Failed to logout", e))?;
        info!(session = %token, ended, "logout");
    }

    Ok((
        [(
            header::SET_COOKIE,
            clear_session_cookie(&state.config.session),
        )],
        Json(MessageResponse {
            message: "Logout successful",
        }),
    ))
}

#[instrument(skip(state, claims))]
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = state
        .store
        .find_user(claims.sub)
        .await
        .map_err(ApiError::database)?
        .ok_or_else(|| {
            warn!(user_id = %claims.sub, "profile for missing user");
            ApiError::NotFound("User not found")
        })?;

    Ok(Json(ProfileResponse {
        user: Profile {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
            last_login: user.last_login,
        },
    }))
}

pub async fn verify_token(AuthUser(claims): AuthUser) -> Json<VerifyTokenResponse> {
    Json(VerifyTokenResponse {
        valid: true,
        user: PublicUser {
            id: claims.sub,
            username: claims.username,
            email: claims.email,
        },
    })
}
