use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::error;

use crate::types::ServiceError;

/// 成功レスポンス `{status:"success", message, data}` を作る
pub fn success<T: Serialize>(message: &str, data: T) -> Json<Value> {
    Json(json!({
        "status": "success",
        "message": message,
        "data": data,
    }))
}

/// 成功レスポンスに任意のフィールドを直接並べる
/// `{status:"success", message, ...fields}`
pub fn success_with_fields(message: &str, fields: Value) -> Json<Value> {
    let mut body = Map::new();
    body.insert("status".to_string(), json!("success"));
    body.insert("message".to_string(), json!(message));
    if let Value::Object(extra) = fields {
        body.extend(extra);
    }
    Json(Value::Object(body))
}

/// 成功レスポンス（dataなし）
pub fn success_message(message: &str) -> Json<Value> {
    Json(json!({
        "status": "success",
        "message": message,
    }))
}

/// APIのエラーレスポンス
/// 全て `{status:"error", message, error}` の形で返す
#[derive(Debug)]
pub enum ApiError {
    /// 入力不足・不正（400）
    BadRequest(String),
    /// 対象なし（404）
    NotFound(String),
    /// 外部サービスやDBの失敗（500）。下位エラーの文言をそのまま返す
    Internal { message: String, error: String },
}

impl ApiError {
    pub fn bad_request<M: Into<String>>(message: M) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found<M: Into<String>>(message: M) -> Self {
        Self::NotFound(message.into())
    }

    /// サービスエラーを変換する。入力不正は400、それ以外は500
    pub fn from_service(message: &str, err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput { reason } => Self::BadRequest(reason),
            other => {
                error!(error = %other, "{}", message);
                Self::Internal {
                    message: message.to_string(),
                    error: other.detail(),
                }
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (message, error) = match self {
            Self::BadRequest(message) | Self::NotFound(message) => (message, Value::Null),
            Self::Internal { message, error } => (message, Value::String(error)),
        };
        let body = json!({
            "status": "error",
            "message": message,
            "error": error,
        });
        (status, Json(body)).into_response()
    }
}
