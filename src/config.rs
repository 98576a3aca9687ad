// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Runtime configuration, loaded from the environment.
///
/// The admin credentials are a single static pair supplied via environment
/// variables, never source constants. A user who presents the pair is
/// promoted to the distinguished admin identity (see `handlers::admin`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub admin_id: String,
    pub admin_password: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let admin_id = env::var("ADMIN_ID").expect("ADMIN_ID must be set");

        let admin_password = env::var("ADMIN_PASSWORD").expect("ADMIN_PASSWORD must be set");

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5000);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            admin_id,
            admin_password,
            port,
            rust_log,
        }
    }
}
