use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GatewayError;
use crate::http::server::AppState;
use crate::store::{MockEntry, RecentRequestEntry};

#[derive(Debug, Deserialize)]
pub struct SetMockRequest {
    pub path: Option<String>,
    pub status: Option<u16>,
    pub headers: Option<BTreeMap<String, String>>,
    pub body: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ClearMockRequest {
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct ClearAck {
    pub ok: bool,
    pub removed: bool,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecentList {
    pub count: usize,
    pub recent: Vec<RecentRequestEntry>,
}

fn required_path(path: Option<String>) -> Result<String, GatewayError> {
    match path {
        Some(path) if !path.is_empty() => Ok(path),
        _ => Err(GatewayError::AdminValidation("path is required".into())),
    }
}

/// Turn the admin request into a stored mock.
///
/// A JSON string body is served verbatim; anything else is serialized and
/// labelled as JSON unless the caller chose a content type.
pub fn build_mock(request: SetMockRequest) -> Result<(String, MockEntry), GatewayError> {
    let path = required_path(request.path)?;

    let status = request.status.unwrap_or(200);
    if !(100..=599).contains(&status) || StatusCode::from_u16(status).is_err() {
        return Err(GatewayError::AdminValidation(format!(
            "invalid status code {}",
            status
        )));
    }

    let mut headers = request.headers.unwrap_or_default();
    let body = match request.body {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text,
        Some(value) => {
            let has_content_type = headers
                .keys()
                .any(|name| name.eq_ignore_ascii_case(header::CONTENT_TYPE.as_str()));
            if !has_content_type {
                headers.insert(
                    header::CONTENT_TYPE.as_str().to_string(),
                    "application/json".to_string(),
                );
            }
            value.to_string()
        }
    };

    Ok((path, MockEntry { status, headers, body }))
}

pub async fn set_mock(
    State(state): State<AppState>,
    payload: Result<Json<SetMockRequest>, JsonRejection>,
) -> Result<Json<Ack>, GatewayError> {
    let Json(request) = payload?;
    let (path, mock) = build_mock(request)?;
    tracing::info!(path = %path, status = mock.status, "Mock installed");
    state.store.mocks().set(path, mock);
    Ok(Json(Ack { ok: true }))
}

pub async fn clear_mock(
    State(state): State<AppState>,
    payload: Result<Json<ClearMockRequest>, JsonRejection>,
) -> Result<Json<ClearAck>, GatewayError> {
    let Json(request) = payload?;
    let path = required_path(request.path)?;
    let removed = state.store.mocks().clear(&path);
    tracing::info!(path = %path, removed, "Mock cleared");
    Ok(Json(ClearAck { ok: true, removed }))
}

pub async fn list_mocks(State(state): State<AppState>) -> Json<BTreeMap<String, MockEntry>> {
    Json(state.store.mocks().list())
}

pub async fn recent(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Json<RecentList> {
    let limit = query
        .limit
        .unwrap_or(state.recent_limit)
        .min(state.recent_limit);
    let recent = state.store.recent().list(limit);
    Json(RecentList {
        count: recent.len(),
        recent,
    })
}

pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecentRequestEntry>, GatewayError> {
    state
        .store
        .recent()
        .get(&id)
        .map(Json)
        .ok_or_else(|| GatewayError::NotFound(format!("request {}", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: Value) -> SetMockRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_missing_path_rejected() {
        let err = build_mock(request(json!({"status": 200}))).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = build_mock(request(json!({"path": ""}))).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_object_body_serialized_as_json() {
        let (path, mock) =
            build_mock(request(json!({"path": "/bcw3d", "body": {"ok": true}}))).unwrap();
        assert_eq!(path, "/bcw3d");
        assert_eq!(mock.status, 200);
        assert_eq!(mock.body, r#"{"ok":true}"#);
        assert_eq!(mock.headers["content-type"], "application/json");
    }

    #[test]
    fn test_string_body_verbatim() {
        let (_, mock) = build_mock(request(json!({
            "path": "/t",
            "status": 201,
            "headers": {"Content-Type": "text/plain"},
            "body": "hello"
        })))
        .unwrap();
        assert_eq!(mock.status, 201);
        assert_eq!(mock.body, "hello");
        assert_eq!(mock.headers.len(), 1);
        assert_eq!(mock.headers["Content-Type"], "text/plain");
    }

    #[test]
    fn test_caller_content_type_kept() {
        let (_, mock) = build_mock(request(json!({
            "path": "/t",
            "headers": {"Content-Type": "application/vnd.game+json"},
            "body": [1, 2]
        })))
        .unwrap();
        assert_eq!(mock.body, "[1,2]");
        assert_eq!(mock.headers.len(), 1);
    }

    #[test]
    fn test_invalid_status_rejected() {
        let err = build_mock(request(json!({"path": "/t", "status": 42}))).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_empty_body_default() {
        let (_, mock) = build_mock(request(json!({"path": "/t"}))).unwrap();
        assert!(mock.body.is_empty());
        assert!(mock.headers.is_empty());
    }
}
