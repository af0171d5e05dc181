// Import the external baseball data set into the configured database.

use std::process::ExitCode;

use ballcards_infrastructure::{seed, services::ServiceRegistry, settings::Settings};
use ballcards_routing::logger;

#[tokio::main]
async fn main() -> ExitCode {
    let settings = Settings::new().expect("Could not parse settings");

    logger::setup(&settings.logger.level);

    if let Err(e) = seed::ensure_persistent(settings.database.backend) {
        tracing::error!(error = %e, "refusing to seed");
        return ExitCode::FAILURE;
    }

    let services = match ServiceRegistry::connect(&settings.database).await {
        Ok(services) => services,
        Err(e) => {
            tracing::error!(error = %e, "could not initialize the database");
            return ExitCode::FAILURE;
        }
    };

    match seed::run(services.players_service.as_ref(), &settings.seed.source_url).await {
        Ok(report) => {
            println!(
                "Seed complete: {} created, {} updated, {} skipped",
                report.created, report.updated, report.skipped
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "seed failed");
            ExitCode::FAILURE
        }
    }
}
