use std::env;
use std::net::SocketAddr;

use axum::http::HeaderValue;
use uuid::Uuid;

pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub cors_origin: HeaderValue,
    /// Stand-in owner id used while authentication is disabled. Without it,
    /// listing yields an empty array and mutations are a client error.
    pub noauth_user_id: Option<Uuid>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let bind_addr: SocketAddr = env::var("BIND_ADDR")
            .unwrap_or("127.0.0.1:3001".to_string())
            .parse()
            .expect("BIND_ADDR must be a valid socket address");

        let cors_origin: HeaderValue = env::var("CORS_ORIGIN")
            .unwrap_or("http://localhost:3000".to_string())
            .parse()
            .expect("CORS_ORIGIN must be a valid header value");

        let noauth_user_id: Option<Uuid> = env::var("NOAUTH_USER_ID")
            .ok()
            .map(|raw| raw.parse().expect("NOAUTH_USER_ID must be a valid UUID"));

        Self {
            database_url,
            bind_addr,
            cors_origin,
            noauth_user_id,
        }
    }
}
