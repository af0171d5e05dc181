pub mod health_endpoints;
pub mod players_endpoints;
