use axum::extract::Json;
use axum::routing::get;
use axum::Router;

use ballcards_interface::health::HealthStatus;

pub struct HealthRouter;

impl HealthRouter {
    pub fn new() -> Router {
        Router::new().route("/health", get(Self::health))
    }

    async fn health() -> Json<HealthStatus> {
        Json(HealthStatus::ok())
    }
}
