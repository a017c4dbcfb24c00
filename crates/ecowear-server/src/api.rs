use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, header::CONTENT_TYPE, Method};
use axum::routing::{get, post, put};
use axum::{middleware, Json, Router};
use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use ecowear_store::Database;

use crate::config::ServerConfig;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::{auth, impact, orders, products, reviews};

/// Shared handler context. The store handle sits behind a mutex; every store
/// helper is a single statement or transaction, so holding the lock for the
/// duration of a handler's store calls makes each request's mutation atomic.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub config: Arc<ServerConfig>,
    pub signing_key: Arc<SigningKey>,
    pub verifying_key: VerifyingKey,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig, signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            db: Arc::new(Mutex::new(db)),
            config: Arc::new(config),
            signing_key: Arc::new(signing_key),
            verifying_key,
            rate_limiter: RateLimiter::default(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    Router::new()
        .route("/health", get(health_check))
        // Identity & authorization
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/sellers", get(auth::list_sellers))
        .route("/api/auth/verify/{id}", put(auth::verify_seller))
        // Product catalog
        .route(
            "/api/products",
            get(products::list_products).post(products::create_product),
        )
        .route("/api/products/mine", get(products::my_products))
        .route("/api/products/{id}", get(products::get_product))
        // Reviews ({id} is a product id for the collection routes and a
        // review id for like/reply)
        .route(
            "/api/reviews/{id}",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        .route("/api/reviews/{id}/like", put(reviews::toggle_like))
        .route("/api/reviews/{id}/reply", post(reviews::reply))
        // Orders
        .route("/api/orders", post(orders::create_order))
        .route("/api/orders/myorders", get(orders::my_orders))
        // Impact
        .route("/api/impact/platform", get(impact::platform_stats))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Helpers for exercising handlers directly against an in-memory store.

    use axum::http::{header::AUTHORIZATION, HeaderMap};
    use chrono::{Duration, Utc};
    use ed25519_dalek::SigningKey;
    use rand::rngs::OsRng;
    use uuid::Uuid;

    use ecowear_shared::{token::issue_token, Role};
    use ecowear_store::{Database, User};

    use super::AppState;
    use crate::config::ServerConfig;

    pub(crate) fn test_state() -> AppState {
        let db = Database::open_in_memory().expect("in-memory database");
        let signing_key = SigningKey::generate(&mut OsRng);
        AppState::new(db, ServerConfig::default(), signing_key)
    }

    /// Headers carrying a freshly signed bearer token for `user_id`.
    pub(crate) fn bearer_headers(state: &AppState, user_id: Uuid, role: Role) -> HeaderMap {
        let token = issue_token(user_id, role, Duration::hours(1), &state.signing_key);
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            format!("Bearer {}", token.encode()).parse().expect("header value"),
        );
        headers
    }

    /// Insert an account and return it, with headers for calling as them.
    pub(crate) async fn seeded_caller(
        state: &AppState,
        role: Role,
        name: &str,
    ) -> (User, HeaderMap) {
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", Uuid::new_v4()),
            password_hash: "$2b$12$fakefakefakefakefakefake".to_string(),
            role,
            is_verified: false,
            created_at: Utc::now(),
        };
        state.db.lock().await.create_user(&user).expect("create user");

        let headers = bearer_headers(state, user.id, role);
        (user, headers)
    }
}
