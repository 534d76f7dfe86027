//! HTTP check service.
//!
//! Lets an upload page ask whether a file may be sent to the programmer
//! before it enables its upload button. The service only checks; it never
//! stores, programs, or erases anything.

use std::path::Path;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Query, Request},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use jed_validator::{FileVerdict, validate_content};
use serde::{Deserialize, Serialize};

use crate::logging::LoggingMiddleware;

/// Default request body limit. Matches the file intake default.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1_048_576;

/// Settings for `jed serve`.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body; larger uploads get `413`.
    pub max_body_bytes: usize,
    /// Access log verbosity (0 = off, 1 = summary, 2+ = bodies).
    pub verbose: u8,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            verbose: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CheckParams {
    filename: Option<String>,
}

/// Body of a `/check` response.
#[derive(Debug, Serialize)]
struct CheckResponse {
    ok: bool,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    exempt: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address_digits: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    status: String,
}

impl From<FileVerdict> for CheckResponse {
    fn from(verdict: FileVerdict) -> Self {
        let status = verdict.status_line();
        match verdict {
            FileVerdict::Accepted(accepted) => Self {
                ok: true,
                name: accepted.name,
                exempt: Some(accepted.exempt),
                address_digits: accepted.address_digits,
                code: None,
                reason: None,
                status,
            },
            FileVerdict::Rejected(rejection) => Self {
                ok: false,
                name: rejection.name,
                exempt: None,
                address_digits: None,
                code: Some(rejection.code),
                reason: Some(rejection.reason),
                status,
            },
        }
    }
}

fn bad_request(error: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "ok": false, "error": error })),
    )
        .into_response()
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `POST /check?filename=NAME` with the file text as the body.
async fn check(Query(params): Query<CheckParams>, body: Bytes) -> Response {
    let Some(name) = params.filename.filter(|n| !n.is_empty()) else {
        return bad_request("missing filename query parameter");
    };
    let Ok(content) = std::str::from_utf8(&body) else {
        return bad_request("file content is not valid UTF-8 text");
    };

    let verdict = validate_content(Path::new(&name), &name, content);
    let status = if verdict.is_accepted() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    tracing::info!(name = %name, status = status.as_u16(), "checked upload candidate");
    (status, Json(CheckResponse::from(verdict))).into_response()
}

/// Build the service router.
#[must_use]
pub fn router(config: &ServerConfig) -> Router {
    let logging = LoggingMiddleware::new(config.verbose, config.max_body_bytes);
    Router::new()
        .route("/health", get(health))
        .route("/check", post(check))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(middleware::from_fn(move |request: Request, next: Next| {
            let logging = logging.clone();
            async move { logging.handle(request, next).await }
        }))
}

/// Bind and serve until the process is stopped.
///
/// # Errors
///
/// Returns an error if the address cannot be resolved or bound.
pub async fn serve(config: &ServerConfig) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "jed check service listening");
    eprintln!("jed check service listening on http://{addr}");
    axum::serve(listener, router(config)).await?;
    Ok(())
}
