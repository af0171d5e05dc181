use std::net::SocketAddr;

use axum::http::header::{InvalidHeaderValue, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::Router;

use ballcards_infrastructure::services::ServiceRegistry;
use ballcards_infrastructure::settings::Settings;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::endpoints::health_endpoints::HealthRouter;
use crate::endpoints::players_endpoints::PlayersRouter;

pub struct ApplicationController;

impl ApplicationController {
    /// Allow the configured web app origin, with credentials. Without an
    /// origin any origin is allowed, without credentials.
    pub fn cors_layer(origin: Option<&str>) -> Result<CorsLayer, InvalidHeaderValue> {
        let cors = match origin {
            Some(origin) => CorsLayer::new()
                .allow_origin(origin.parse::<HeaderValue>()?)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
                .allow_headers([CONTENT_TYPE])
                .allow_credentials(true),
            None => CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        };

        Ok(cors)
    }

    pub fn router(service_registry: ServiceRegistry, cors: CorsLayer) -> Router {
        Router::new()
            .merge(HealthRouter::new())
            .nest("/api", PlayersRouter::new(service_registry))
            .layer(cors)
            // logging so we can see whats going on
            .layer(TraceLayer::new_for_http())
    }

    pub async fn run(settings: Settings, service_registry: ServiceRegistry) {
        let cors = Self::cors_layer(settings.cors.origin.as_deref())
            .expect("Could not parse the cors origin");

        let router = Self::router(service_registry, cors);

        let listener = tokio::net::TcpListener::bind(&format!(
            "{}:{}",
            settings.server.host, settings.server.port
        ))
        .await
        .expect("Could not start the TCP listener");

        tracing::info!(
            environment = settings.environment.as_str(),
            "server running at {}",
            settings.server
        );

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Failed to start the server");
    }
}
