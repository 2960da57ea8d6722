//! # HTTP Server
//!
//! Combines the health, public query and moderation routers into one axum
//! application, optionally mounted under a base path.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::moderation::ModerationService;
use crate::observability::Logger;
use crate::query::QueryEngine;

use super::config::HttpServerConfig;
use super::engine_routes::{engine_routes, EngineState};
use super::moderation_routes::{moderation_routes, ModerationState};
use super::observability_routes::health_routes;

/// HTTP server for the GBADs public query API
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server; moderation routes are mounted only when a service is given
    pub fn new(
        config: HttpServerConfig,
        engine: QueryEngine,
        moderation: Option<ModerationService>,
    ) -> Self {
        let router = Self::build_router(&config, engine, moderation);
        Self { config, router }
    }

    fn build_router(
        config: &HttpServerConfig,
        engine: QueryEngine,
        moderation: Option<ModerationService>,
    ) -> Router {
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        let mut routes = Router::new()
            .merge(health_routes())
            .merge(engine_routes(Arc::new(EngineState::new(engine))));

        if let Some(service) = moderation {
            routes = routes.nest(
                "/slack",
                moderation_routes(Arc::new(ModerationState::new(service))),
            );
        }

        let app = match config.normalized_base_path() {
            Some(base) => Router::new().nest(&base, routes),
            None => routes,
        };
        app.layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind and serve until the listener fails
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let base = self.config.normalized_base_path().unwrap_or_default();
        Logger::info(
            "HTTP_SERVER_START",
            &[("addr", &addr.to_string()), ("base_path", &base)],
        );

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SchemaCatalog;
    use crate::warehouse::InMemoryWarehouse;

    fn engine() -> QueryEngine {
        let catalog = SchemaCatalog::new().with_table("t", &[("a", "text")]);
        QueryEngine::new(
            Arc::new(catalog.clone()),
            Arc::new(InMemoryWarehouse::new(catalog)),
        )
    }

    #[test]
    fn test_socket_addr() {
        let server = HttpServer::new(HttpServerConfig::with_port(8080), engine(), None);
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_router_builds_with_base_path() {
        let config = HttpServerConfig {
            base_path: "/api/".to_string(),
            ..HttpServerConfig::default()
        };
        let _router = HttpServer::new(config, engine(), None).router();
    }
}
