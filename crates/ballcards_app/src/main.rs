use ballcards_infrastructure::{services::ServiceRegistry, settings::Settings};

use ballcards_routing::logger;
use ballcards_routing::router::ApplicationController;

#[tokio::main]
async fn main() {
    let settings = Settings::new().expect("Could not parse settings");

    logger::setup(&settings.logger.level);

    let services = ServiceRegistry::connect(&settings.database)
        .await
        .expect("Could not initialize the database");

    ApplicationController::run(settings, services).await;
}
