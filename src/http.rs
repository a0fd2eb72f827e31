//! HTTP surface: one route, dispatched on method.

use crate::board::Board;
use crate::error::Error;
use crate::record::{Document, Record};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use std::any::Any;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, warn};

/// Path the board is served under.
pub const ROUTE: &str = "/api/questions";

pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// An error response: a status code and a `{"error": code}` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    code: String,
}

impl ApiError {
    /// Error with an explicit status and code.
    pub fn new(status: StatusCode, code: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
        }
    }

    /// 500 `server_error`.
    pub fn server_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "server_error")
    }

    /// Status this error is sent with.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Validation(_) | Error::UnknownAction(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(%err, "request failed");
        }
        Self::new(status, err.code())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        warn!(%err, "unparseable request body");
        Self::server_error()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.code }))).into_response()
    }
}

/// Build the router for `board`.
pub fn create_app(board: Board) -> Router {
    Router::new()
        .route(
            ROUTE,
            get(list)
                .head(method_not_allowed)
                .post(create)
                .patch(mutate)
                .delete(delete)
                .fallback(method_not_allowed),
        )
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(board)
}

fn panic_response(_: Box<dyn Any + Send + 'static>) -> Response {
    error!("handler panicked");
    ApiError::server_error().into_response()
}

async fn list(State(board): State<Board>) -> ApiResult<Json<Document>> {
    Ok(Json(board.list().await?))
}

async fn create(State(board): State<Board>, body: Bytes) -> ApiResult<(StatusCode, Json<Record>)> {
    let body = parse_body(&body)?;
    let text = string_field(&body, "text").unwrap_or_default();
    let record = board.create(&text).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn mutate(State(board): State<Board>, body: Bytes) -> ApiResult<Json<Value>> {
    let body = parse_body(&body)?;
    let (Some(id), Some(action)) = (string_field(&body, "id"), string_field(&body, "action"))
    else {
        return Err(Error::Validation("id_action_required".into()).into());
    };
    let row = board.mutate(&id, &action).await?;
    Ok(Json(json!({ "ok": true, "row": row })))
}

async fn delete(State(board): State<Board>, body: Bytes) -> ApiResult<Json<Value>> {
    let body = parse_body(&body)?;
    if body.get("all").is_some_and(truthy) {
        board.delete_all().await?;
    } else {
        board.delete(string_field(&body, "id").as_deref()).await?;
    }
    Ok(Json(json!({ "ok": true })))
}

async fn method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed")
}

async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "not_found")
}

/// Parse a request body into a JSON object.
///
/// An empty body is `{}`, a JSON string holding JSON is unwrapped once, and
/// any non-object value counts as `{}`. Text that isn't JSON is an error.
fn parse_body(bytes: &[u8]) -> ApiResult<Map<String, Value>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    let value = match serde_json::from_slice::<Value>(bytes)? {
        Value::String(s) if s.trim().is_empty() => Value::Null,
        Value::String(s) => serde_json::from_str(&s)?,
        v => v,
    };
    match value {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

/// A field as non-empty text. Numbers are accepted in their decimal form.
fn string_field(body: &Map<String, Value>, key: &str) -> Option<String> {
    let s = match body.get(key)? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
