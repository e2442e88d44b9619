use std::sync::Arc;

use elevator_broker::{Broker, RedisBroker};
use elevator_ingress::app::{build_app, AppState};
use elevator_ingress::config::Config;
use elevator_store::{RedisStateStore, StateStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    elevator_observability::init();

    let config = Config::from_env();

    let store: Arc<dyn StateStore> = Arc::new(RedisStateStore::connect(&config.redis_url).await?);
    let broker: Arc<dyn Broker> = Arc::new(RedisBroker::connect(&config.redis_url).await?);

    let state = AppState {
        store,
        broker,
        num_floors: config.num_floors,
        num_elevators: config.num_elevators,
    };

    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {e}", config.bind_addr));

    tracing::info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await?;
    Ok(())
}
