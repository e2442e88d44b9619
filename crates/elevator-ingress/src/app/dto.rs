use serde::Deserialize;

/// `POST /api/requests/external` body.
#[derive(Debug, Deserialize)]
pub struct ExternalRequestBody {
    pub floor: u32,
    pub direction: String,
}

/// `POST /api/requests/internal` body.
#[derive(Debug, Deserialize)]
pub struct InternalRequestBody {
    pub elevator_id: u32,
    pub destination_floor: u32,
}

/// `DELETE /api/requests` query string: exactly one of `min_id`/`maxlen`
/// must be set.
#[derive(Debug, Deserialize, Default)]
pub struct TrimQuery {
    pub min_id: Option<String>,
    pub maxlen: Option<usize>,
}
