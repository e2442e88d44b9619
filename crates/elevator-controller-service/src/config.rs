//! Environment-variable configuration for the controller process.

pub struct Config {
    pub num_floors: u32,
    pub num_elevators: u32,
    pub redis_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            num_floors: env_parse_or("NUM_FLOORS", 10),
            num_elevators: env_parse_or("NUM_ELEVATORS", 3),
            redis_url: std::env::var("REDIS_URL").unwrap_or_else(|_| redis_url_from_parts()),
        }
    }
}

fn env_parse_or(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Falls back to discrete `REDIS_HOST`/`REDIS_PORT`/`REDIS_DB`/`REDIS_PASSWORD`
/// parts when `REDIS_URL` itself isn't set.
fn redis_url_from_parts() -> String {
    let host = std::env::var("REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("REDIS_PORT").unwrap_or_else(|_| "6379".to_string());
    let db = std::env::var("REDIS_DB").unwrap_or_else(|_| "0".to_string());
    match std::env::var("REDIS_PASSWORD") {
        Ok(password) if !password.is_empty() => {
            format!("redis://:{password}@{host}:{port}/{db}")
        }
        _ => format!("redis://{host}:{port}/{db}"),
    }
}
