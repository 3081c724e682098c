//! Error handling for the Livraria HTTP layer.
//!
//! Every failure origin renders as the same envelope shape:
//! `{ "errors": [ { "value", "msg", "param" } ] }`. Callers never see a
//! different shape for validation vs. storage vs. routing errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use livraria_store::StoreError;

/// Identifier of a failed validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCode {
    EmptyField,
    InvalidInteger,
    InvalidFormat,
    NotNumeric,
    NotObject,
    MissingSubfields,
}

/// A single failed validation rule: the offending field, the rule's message,
/// and a diagnostic rendering of the rejected input.
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    #[serde(skip)]
    pub code: RuleCode,
    pub value: String,
    pub msg: String,
    pub param: String,
}

impl Violation {
    pub fn new(
        code: RuleCode,
        param: impl Into<String>,
        msg: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            code,
            value: value.into(),
            msg: msg.into(),
            param: param.into(),
        }
    }
}

/// Application error types that map to HTTP responses.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("validation failed with {} violation(s)", .0.len())]
    Validation(Vec<Violation>),

    #[error("malformed identifier: {value}")]
    MalformedId { value: String },

    #[error("store operation failed at {param}: {value}")]
    Store {
        param: String,
        msg: String,
        value: String,
    },

    #[error("route not found: {path}")]
    RouteNotFound { path: String },

    #[error("unexpected failure at {param}")]
    Internal {
        param: String,
        msg: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    /// Wrap accumulated violations; never constructed with an empty list.
    pub fn validation(violations: Vec<Violation>) -> Self {
        Self::Validation(violations)
    }

    /// An identifier that could not be decoded into the store's id type.
    pub fn malformed_id(value: impl Into<String>) -> Self {
        Self::MalformedId {
            value: value.into(),
        }
    }

    /// A store fault during find/insert/update/delete (HTTP 400).
    pub fn store(param: impl Into<String>, msg: impl Into<String>, err: &StoreError) -> Self {
        Self::Store {
            param: param.into(),
            msg: msg.into(),
            value: err.to_string(),
        }
    }

    /// No handler matched the requested path (HTTP 404).
    pub fn route_not_found(path: impl Into<String>) -> Self {
        Self::RouteNotFound { path: path.into() }
    }

    /// Anything outside the anticipated taxonomy (HTTP 500).
    pub fn internal(
        param: impl Into<String>,
        msg: impl Into<String>,
        source: anyhow::Error,
    ) -> Self {
        Self::Internal {
            param: param.into(),
            msg: msg.into(),
            source,
        }
    }

    /// The HTTP status this error renders with.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MalformedId { .. } | ApiError::Store { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        tracing::error!(
            status_code = %status.as_u16(),
            error = %self,
            "request error"
        );

        let entries = match self {
            ApiError::Validation(violations) => violations
                .into_iter()
                .map(|v| json!({ "value": v.value, "msg": v.msg, "param": v.param }))
                .collect(),
            ApiError::MalformedId { value } => vec![json!({
                "value": value,
                "msg": "the provided identifier is not valid",
                "param": "id",
            })],
            ApiError::Store { param, msg, value } => vec![json!({
                "value": value,
                "msg": msg,
                "param": param,
            })],
            ApiError::RouteNotFound { path } => vec![json!({
                "value": path.clone(),
                "msg": format!("the route {} does not exist in this API", path),
                "param": "invalid route",
            })],
            ApiError::Internal { param, msg, source } => vec![json!({
                "value": source.to_string(),
                "msg": msg,
                "param": param,
            })],
        };

        (status, Json(json!({ "errors": entries }))).into_response()
    }
}
