use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;

use elevator_broker::{BrokerError, StreamBroker, TrimSpec};
use elevator_core::{Direction, Request, StatusSnapshot};
use elevator_store::StateStore;

use super::dto::{ExternalRequestBody, InternalRequestBody, TrimQuery};
use super::errors::{broker_error_to_response, domain_error_to_response, store_error_to_response};
use super::state::AppState;

const REQUESTS_STREAM: &str = "elevator:requests:stream";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/requests/external", post(post_external_request))
        .route("/api/requests/internal", post(post_internal_request))
        .route("/api/elevators", get(get_elevators))
        .route("/api/requests", delete(delete_requests))
}

pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn post_external_request(
    State(state): State<AppState>,
    Json(body): Json<ExternalRequestBody>,
) -> axum::response::Response {
    let direction = match Direction::parse_case_insensitive(&body.direction) {
        Ok(direction) => direction,
        Err(err) => return domain_error_to_response(err),
    };

    let request = match Request::new_external(body.floor, direction, state.num_floors) {
        Ok(request) => request,
        Err(err) => return domain_error_to_response(err),
    };

    match StreamBroker::publish(state.broker.as_ref(), REQUESTS_STREAM, request.to_dict()).await {
        Ok(id) => (StatusCode::ACCEPTED, Json(json!({ "request_id": request.id().to_string(), "stream_id": id }))).into_response(),
        Err(err) => broker_error_to_response(err),
    }
}

async fn post_internal_request(
    State(state): State<AppState>,
    Json(body): Json<InternalRequestBody>,
) -> axum::response::Response {
    let request = match Request::new_internal(
        body.elevator_id,
        body.destination_floor,
        state.num_elevators,
        state.num_floors,
    ) {
        Ok(request) => request,
        Err(err) => return domain_error_to_response(err),
    };

    match StreamBroker::publish(state.broker.as_ref(), REQUESTS_STREAM, request.to_dict()).await {
        Ok(id) => (StatusCode::ACCEPTED, Json(json!({ "request_id": request.id().to_string(), "stream_id": id }))).into_response(),
        Err(err) => broker_error_to_response(err),
    }
}

async fn get_elevators(State(state): State<AppState>) -> axum::response::Response {
    let mut elevators = Vec::with_capacity(state.num_elevators as usize);
    for raw_id in 1..=state.num_elevators {
        let key = format!("elevator:status:{raw_id}");
        match state.store.get(&key).await {
            Ok(Some(json)) => match serde_json::from_str::<StatusSnapshot>(&json) {
                Ok(snapshot) => elevators.push(serde_json::to_value(snapshot).unwrap()),
                Err(err) => {
                    tracing::warn!(elevator_id = raw_id, error = %err, "unreadable elevator snapshot");
                }
            },
            Ok(None) => {}
            Err(err) => return store_error_to_response(err),
        }
    }
    (StatusCode::OK, Json(json!({ "elevators": elevators }))).into_response()
}

async fn delete_requests(
    State(state): State<AppState>,
    Query(query): Query<TrimQuery>,
) -> axum::response::Response {
    let spec = match (query.min_id, query.maxlen) {
        (Some(min_id), None) => TrimSpec::MinId(min_id),
        (None, Some(maxlen)) => TrimSpec::MaxLen(maxlen),
        _ => {
            return broker_error_to_response(BrokerError::BadArgument(
                "exactly one of min_id or maxlen must be set".to_string(),
            ))
        }
    };

    match state.broker.trim(REQUESTS_STREAM, spec, true).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "trimmed": true }))).into_response(),
        Err(err) => broker_error_to_response(err),
    }
}
