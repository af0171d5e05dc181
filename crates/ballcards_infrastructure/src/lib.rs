pub mod database_connection;
pub mod seed;
pub mod services;
pub mod settings;
