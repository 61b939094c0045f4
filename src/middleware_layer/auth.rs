use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Duration, Utc};
use tower_cookies::Cookies;

use crate::{
    models::session::AuthenticatedUser,
    state::AppState,
    token,
};

/// Where unauthenticated requests are sent.
const LOGIN_PAGE: &str = "/login.html";

fn redirect_to_login() -> Response {
    Redirect::to(LOGIN_PAGE).into_response()
}

/// The gate in front of every protected route.
///
/// No cookie, a malformed token, an unknown session id and an expired session
/// all end the same way: a redirect to the login page. None of them is an
/// error, and none of them mutates the session store; eviction of expired
/// records belongs to the background sweep.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `cookies` - The request cookies.
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// The inner handler's `Response`, or a redirect to the login page.
pub async fn require_auth(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    tracing::debug!("🔐 Checking authentication...");

    let Some(cookie) = cookies.get(token::AUTH_COOKIE) else {
        tracing::debug!("No {} cookie found", token::AUTH_COOKIE);
        return redirect_to_login();
    };

    let Some(session_id) = token::decode(cookie.value()) else {
        tracing::warn!("Malformed auth token");
        return redirect_to_login();
    };

    let Some(session) = state.sessions.get(&session_id) else {
        tracing::debug!("No active session for presented token");
        return redirect_to_login();
    };

    let max_age = Duration::seconds(state.config.session_max_age_secs);
    if Utc::now() - session.created_at > max_age {
        tracing::debug!("Session expired for user: {}", session.user_id);
        return redirect_to_login();
    }

    tracing::debug!("✅ User authenticated: {}", session.user_id);

    request.extensions_mut().insert(AuthenticatedUser {
        id: session.user_id,
        session_id,
    });

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Extension, Router,
        http::{StatusCode, header},
        middleware::from_fn_with_state,
        routing::get,
    };
    use tower::ServiceExt;
    use tower_cookies::CookieManagerLayer;

    use crate::models::session::SessionId;
    use crate::state::{AppState, test_state};

    async fn whoami(Extension(user): Extension<AuthenticatedUser>) -> String {
        format!("{}:{}", user.id, user.session_id)
    }

    fn protected_app(state: AppState) -> Router {
        Router::new()
            .route("/home", get(whoami))
            .route_layer(from_fn_with_state(state.clone(), require_auth))
            .with_state(state)
            .layer(CookieManagerLayer::new())
    }

    fn get_home(cookie: Option<String>) -> Request<Body> {
        let mut builder = Request::builder().uri("/home");
        if let Some(value) = cookie {
            builder = builder.header(header::COOKIE, format!("{}={}", token::AUTH_COOKIE, value));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn assert_redirected_to_login(response: &Response) {
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            LOGIN_PAGE
        );
    }

    #[tokio::test]
    async fn request_without_cookie_is_redirected() {
        let app = protected_app(test_state(86_400));
        let response = app.oneshot(get_home(None)).await.unwrap();
        assert_redirected_to_login(&response);
    }

    #[tokio::test]
    async fn malformed_cookie_is_redirected_not_crashed() {
        let app = protected_app(test_state(86_400));
        let response = app
            .oneshot(get_home(Some("definitely%%%not-a-token".to_string())))
            .await
            .unwrap();
        assert_redirected_to_login(&response);
    }

    #[tokio::test]
    async fn well_formed_but_unknown_session_is_redirected() {
        let app = protected_app(test_state(86_400));
        let forged = token::encode(&SessionId::generate()).unwrap();
        let response = app.oneshot(get_home(Some(forged))).await.unwrap();
        assert_redirected_to_login(&response);
    }

    #[tokio::test]
    async fn valid_session_reaches_the_handler_with_identity_attached() {
        let state = test_state(86_400);
        let record = state.sessions.create(1, "A");
        let cookie = token::encode(&record.session_id).unwrap();

        let app = protected_app(state);
        let response = app.oneshot(get_home(Some(cookie))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(body, format!("1:{}", record.session_id).as_bytes());
    }

    #[tokio::test]
    async fn session_past_max_age_is_treated_as_absent() {
        // Zero max age makes any real session older than allowed.
        let state = test_state(0);
        let record = state.sessions.create(1, "A");
        let cookie = token::encode(&record.session_id).unwrap();

        // The sweep owns eviction; give it a moment's worth of age.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let app = protected_app(state.clone());
        let response = app.oneshot(get_home(Some(cookie))).await.unwrap();
        assert_redirected_to_login(&response);

        // The gate itself did not evict the record.
        assert!(state.sessions.get(&record.session_id).is_some());
    }
}
