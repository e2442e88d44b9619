use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn domain_error_to_response(err: elevator_core::DomainError) -> axum::response::Response {
    use elevator_core::DomainError;
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
    }
}

pub fn broker_error_to_response(err: elevator_broker::BrokerError) -> axum::response::Response {
    use elevator_broker::BrokerError;
    match err {
        BrokerError::BadArgument(msg) => json_error(StatusCode::BAD_REQUEST, "bad_argument", msg),
        other => json_error(StatusCode::BAD_GATEWAY, "broker_error", other.to_string()),
    }
}

pub fn store_error_to_response(err: elevator_store::StoreError) -> axum::response::Response {
    json_error(StatusCode::BAD_GATEWAY, "store_error", err.to_string())
}
