use axum::{
    Extension, Form, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};

use crate::{
    error::Result,
    models::session::AuthenticatedUser,
    state::AppState,
    token,
    validation::auth::validate_credentials,
};

/// Where unauthenticated and logged-out clients are sent.
const LOGIN_PAGE: &str = "/login.html";
/// The login page with the generic failed-login indicator. The indicator
/// never distinguishes an unknown user from a wrong secret.
const LOGIN_FAILED: &str = "/login.html?error=Invalid%20credentials";
/// Where a fresh login lands.
const HOME_PAGE: &str = "/home";

/// The form payload submitted by the login page.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// The response payload of the session-data endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataResponse {
    pub user_id: i32,
    pub username: String,
    pub timestamp: DateTime<Utc>,
}

/// Builds the `authToken` cookie carrying an encoded session reference.
fn auth_cookie(token: String, max_age_secs: i64) -> Cookie<'static> {
    let mut cookie = Cookie::new(token::AUTH_COOKIE, token);

    let is_production = std::env::var("APP_ENV")
        .unwrap_or_else(|_| "development".to_string()) == "production";

    cookie.set_http_only(true);

    if is_production {
        cookie.set_secure(true);
    }

    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(Duration::seconds(max_age_secs));
    cookie.set_path("/");

    cookie
}

/// Handles a credential submission.
///
/// The username and password are forwarded opaquely to the credential store;
/// this layer never compares secrets itself. A credential pair that fails the
/// shape check is answered exactly like one the store rejected.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(payload): Form<LoginRequest>,
) -> Result<Response> {
    tracing::info!("🔐 Login attempt for: {}", payload.username);

    if validate_credentials(&payload.username, &payload.password).is_err() {
        return Ok(Redirect::to(LOGIN_FAILED).into_response());
    }

    // The credential round-trip happens before any session-store access, so
    // no store lock is ever held across the blocking external call.
    let Some(principal) = state
        .credentials
        .authenticate(&payload.username, &payload.password)
        .await?
    else {
        tracing::info!("❌ Invalid credentials for: {}", payload.username);
        return Ok(Redirect::to(LOGIN_FAILED).into_response());
    };

    let session = state.sessions.create(principal.id, &principal.name);
    tracing::info!(
        "✅ User logged in: {} ({}), session {}",
        principal.id,
        principal.name,
        session.session_id
    );

    let cookie_value = token::encode(&session.session_id)?;
    cookies.add(auth_cookie(cookie_value, state.config.session_max_age_secs));

    Ok(Redirect::to(HOME_PAGE).into_response())
}

/// Handles logout.
///
/// A missing or malformed token is tolerated silently; the cookie is cleared
/// and the client redirected either way, so a second logout with the same
/// token observes the same outcome as the first.
#[axum::debug_handler]
pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> Response {
    if let Some(cookie) = cookies.get(token::AUTH_COOKIE) {
        match token::decode(cookie.value()) {
            Some(session_id) => {
                state.sessions.remove(&session_id);
                tracing::info!("👋 Session removed: {}", session_id);
            }
            None => {
                tracing::warn!("Malformed auth token during logout");
            }
        }
    }

    let mut removal = Cookie::new(token::AUTH_COOKIE, "");
    removal.set_max_age(Duration::seconds(0));
    removal.set_path("/");
    cookies.remove(removal);

    Redirect::to(LOGIN_PAGE).into_response()
}

/// Returns the session data behind the caller's token.
#[axum::debug_handler]
pub async fn user_data(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Response {
    // Re-resolve instead of trusting stale extensions: the session may have
    // been removed between the gate and this handler.
    match state.sessions.get(&user.session_id) {
        Some(session) => Json(UserDataResponse {
            user_id: session.user_id,
            username: session.username,
            timestamp: session.created_at,
        })
        .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(sonic_rs::json!({ "message": "Session expired or invalid." })),
        )
            .into_response(),
    }
}
