// This module setup the logger level.

use std::env;

use tracing_subscriber::EnvFilter;

const TARGETS: &[&str] = &[
    "ballcards_app",
    "ballcards_infrastructure",
    "ballcards_interface",
    "ballcards_routing",
    "seed",
    "tower_http",
];

pub fn setup(logger_level: &str) {
    if env::var_os("RUST_LOG").is_none() {
        let env = TARGETS
            .iter()
            .map(|target| format!("{target}={logger_level}"))
            .collect::<Vec<_>>()
            .join(",");

        env::set_var("RUST_LOG", env);
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}
