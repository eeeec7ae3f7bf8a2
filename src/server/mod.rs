//! Visitor backend: REST API over the SQLite store.
//!
//! | Route | Auth | |
//! |---|---|---|
//! | `POST /auth/login` | no | `{username, password}` → `{token}` |
//! | `POST /visitors` | bearer | store a visitor → `201 {passCode}` |
//! | `GET /visitors` | bearer | every record |
//! | `GET /visitors/search?mobile=…` / `?identityNumber=…` | bearer | latest match or 404 |
//! | `GET /visitors/by-date?date=YYYY-MM-DD` | bearer | one local day, oldest first |
//! | `GET /metrics`, `GET /health` | no | monitoring |

mod auth;
mod error;
mod routes;
mod state;
mod store;

pub use auth::{hash_password, verify_password, Claims, TokenKeys};
pub use error::ApiError;
pub use state::AppState;
pub use store::{local_day_bounds, LocalVisitorService, StoreError, VisitorStore};

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    #[error("server error: {0}")]
    Server(String),
}

/// Builds the application router.
pub fn router(state: Arc<AppState>, body_limit_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let visitors = Router::new()
        .route(
            "/visitors",
            post(routes::create_visitor_handler).get(routes::list_visitors_handler),
        )
        .route("/visitors/search", get(routes::search_handler))
        .route("/visitors/by-date", get(routes::by_date_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    Router::new()
        .route("/auth/login", post(routes::login_handler))
        .route("/metrics", get(routes::metrics_handler))
        .route("/health", get(routes::health_handler))
        .merge(visitors)
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(cors)
        .with_state(state)
}

/// HTTP server for the visitor API.
pub struct PassServer {
    bind_addr: SocketAddr,
    router: Router,
}

impl PassServer {
    pub fn new(bind_addr: SocketAddr, state: Arc<AppState>, body_limit_bytes: usize) -> Self {
        Self {
            bind_addr,
            router: router(state, body_limit_bytes),
        }
    }

    /// Runs until Ctrl-C or SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        self.run_on(listener, shutdown_signal()).await
    }

    /// Serves on an already bound listener until `shutdown` completes.
    pub async fn run_on(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(%addr, "Visitor API listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Server(e.to_string()))?;

        tracing::info!("Visitor API stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
