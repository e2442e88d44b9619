use std::sync::Arc;

use elevator_broker::{Broker, GroupStart, InMemoryBroker, ReadFrom, StreamBroker};
use elevator_ingress::app::{build_app, AppState};
use elevator_store::{InMemoryStateStore, StateStore};
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(state: AppState) -> Self {
        let app = build_app(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{addr}");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn test_state() -> (AppState, Arc<InMemoryStateStore>, Arc<InMemoryBroker>) {
    let store = Arc::new(InMemoryStateStore::new());
    let broker = Arc::new(InMemoryBroker::new());
    let state = AppState {
        store: store.clone() as Arc<dyn StateStore>,
        broker: broker.clone() as Arc<dyn Broker>,
        num_floors: 10,
        num_elevators: 3,
    };
    (state, store, broker)
}

#[tokio::test]
async fn external_request_is_appended_to_the_stream() {
    let (state, _store, broker) = test_state();
    let server = TestServer::spawn(state).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/requests/external", server.base_url))
        .json(&json!({ "floor": 3, "direction": "up" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::ACCEPTED);

    let entries = broker
        .range("elevator:requests:stream", "-", "+")
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].fields.get("request_type").unwrap(), "external");
    assert_eq!(entries[0].fields.get("floor").unwrap(), "3");
}

#[tokio::test]
async fn external_request_rejects_out_of_range_floor() {
    let (state, _store, _broker) = test_state();
    let server = TestServer::spawn(state).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/requests/external", server.base_url))
        .json(&json!({ "floor": 99, "direction": "up" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn internal_request_is_appended_to_the_stream() {
    let (state, _store, broker) = test_state();
    let server = TestServer::spawn(state).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/requests/internal", server.base_url))
        .json(&json!({ "elevator_id": 2, "destination_floor": 7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::ACCEPTED);

    let entries = broker
        .range("elevator:requests:stream", "-", "+")
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].fields.get("request_type").unwrap(), "internal");
    assert_eq!(entries[0].fields.get("elevator_id").unwrap(), "2");
}

#[tokio::test]
async fn get_elevators_reads_snapshots_from_the_store() {
    let (state, store, _broker) = test_state();
    store
        .set(
            "elevator:status:1",
            json!({
                "id": 1,
                "current_floor": 4,
                "status": "idle",
                "door_status": "closed",
                "destinations": [],
                "timestamp": 0.0
            })
            .to_string(),
        )
        .await
        .unwrap();

    let server = TestServer::spawn(state).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/elevators", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let elevators = body["elevators"].as_array().unwrap();
    assert_eq!(elevators.len(), 1);
    assert_eq!(elevators[0]["current_floor"], 4);
}

#[tokio::test]
async fn delete_requests_requires_exactly_one_of_min_id_or_maxlen() {
    let (state, _store, _broker) = test_state();
    let server = TestServer::spawn(state).await;
    let client = reqwest::Client::new();

    let res = client
        .delete(format!("{}/api/requests", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

    let res = client
        .delete(format!("{}/api/requests?maxlen=5", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn delete_requests_trims_by_maxlen() {
    let (state, _store, broker) = test_state();
    for i in 0..5 {
        let mut fields = std::collections::HashMap::new();
        fields.insert("n".to_string(), i.to_string());
        StreamBroker::publish(broker.as_ref(), "elevator:requests:stream", fields)
            .await
            .unwrap();
    }
    broker
        .create_group(
            "elevator:requests:stream",
            "scheduler-group",
            GroupStart::Beginning,
        )
        .await
        .unwrap();
    let _ = broker
        .read_group(
            "elevator:requests:stream",
            "scheduler-group",
            "c1",
            10,
            10,
            ReadFrom::Undelivered,
        )
        .await
        .unwrap();

    let server = TestServer::spawn(state).await;
    let client = reqwest::Client::new();
    let res = client
        .delete(format!("{}/api/requests?maxlen=2", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);

    let entries = broker
        .range("elevator:requests:stream", "-", "+")
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
}
