use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use std::time::Duration;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod state;
mod token;

mod models {
    pub mod session;
    pub mod user;
}

mod repositories {
    pub mod session;
    pub mod user;
}

mod services {
    pub mod auth;
}

mod handlers {
    pub mod auth;
}

mod middleware_layer {
    pub mod auth;
}

mod validation {
    pub mod auth;
}

use config::Config;
use state::AppState;

fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/logout", get(handlers::auth::logout))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route_service("/", ServeFile::new("public/home.html"))
        .route_service("/home", ServeFile::new("public/home.html"))
        .route("/get-user-data", post(handlers::auth::user_data))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::require_auth,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
        .fallback_service(ServeDir::new("public"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let state = AppState::new(&config)?;

    let app = build_router(state.clone());

    // Sessions never expire on their own in the store; this task bounds both
    // store growth and how long an old token stays valid.
    let sweep_state = state.clone();
    tokio::spawn(async move {
        let interval = Duration::from_secs(sweep_state.config.sweep_interval_secs);
        let max_age = chrono::Duration::seconds(sweep_state.config.session_max_age_secs);
        loop {
            tokio::time::sleep(interval).await;
            let removed = sweep_state.sessions.sweep_expired(max_age);
            if removed > 0 {
                tracing::info!("🧹 Swept {} expired session(s)", removed);
            }
        }
    });

    let addr = config.bind_addr();
    tracing::info!("🚀 Server listening on http://{}", addr);
    tracing::info!("✅ Background session sweep started (every {}s)", config.sweep_interval_secs);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
