use std::io::IsTerminal;
use std::time::Instant;

use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Local;
use tracing_subscriber::EnvFilter;

/// Request bodies are fuse maps; only this much of one is echoed at DEBUG.
const BODY_PREVIEW_BYTES: usize = 512;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `-v` raises the level from `warn`
/// to `info` and `-vv` to `debug`.
pub fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// ANSI color codes
struct Colors {
    reset: &'static str,
    dim: &'static str,
    green: &'static str,
    yellow: &'static str,
    red: &'static str,
    cyan: &'static str,
    blue: &'static str,
    magenta: &'static str,
    gray: &'static str,
}

impl Colors {
    fn new() -> Self {
        if std::io::stderr().is_terminal() {
            Self {
                reset: "\x1b[0m",
                dim: "\x1b[2m",
                green: "\x1b[92m",   // 2xx success
                yellow: "\x1b[93m",  // 4xx rejected file / bad request
                red: "\x1b[91m",     // 5xx errors
                cyan: "\x1b[96m",    // Method
                blue: "\x1b[94m",    // Path
                magenta: "\x1b[95m", // Duration
                gray: "\x1b[90m",    // DEBUG content
            }
        } else {
            Self {
                reset: "",
                dim: "",
                green: "",
                yellow: "",
                red: "",
                cyan: "",
                blue: "",
                magenta: "",
                gray: "",
            }
        }
    }

    fn status_color(&self, status: StatusCode) -> &'static str {
        if status.is_success() {
            self.green
        } else if status.is_client_error() {
            self.yellow
        } else {
            self.red
        }
    }
}

fn timestamp() -> impl std::fmt::Display {
    Local::now().format("%Y-%m-%d %H:%M:%S,%3f")
}

/// Access log for `jed serve`.
///
/// Printed with `eprintln!` rather than `tracing` so the ANSI colours are
/// not escaped.
#[derive(Clone)]
pub struct LoggingMiddleware {
    pub verbose: u8,
    /// Cap on a request body buffered for the DEBUG echo. Same value as
    /// the router's body limit, since the echo runs before that limit.
    pub max_body_bytes: usize,
}

impl LoggingMiddleware {
    #[must_use]
    pub fn new(verbose: u8, max_body_bytes: usize) -> Self {
        Self {
            verbose,
            max_body_bytes,
        }
    }

    pub async fn handle(&self, request: Request, next: Next) -> Response {
        if self.verbose == 0 {
            return next.run(request).await;
        }

        let colors = Colors::new();
        let method = request.method().clone();
        let uri = request.uri().clone();
        let start = Instant::now();

        let response = if self.verbose >= 2 {
            match log_request_body(request, self.max_body_bytes, &colors).await {
                Ok(request) => next.run(request).await,
                Err(rejection) => rejection,
            }
        } else {
            next.run(request).await
        };

        let status = response.status();
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        eprintln!(
            "{} - INFO - {}{}{} {}{}{} -> {}{}{} in {}{:.1}ms{}",
            timestamp(),
            colors.cyan,
            method,
            colors.reset,
            colors.blue,
            uri,
            colors.reset,
            colors.status_color(status),
            status.as_u16(),
            colors.reset,
            colors.magenta,
            duration_ms,
            colors.reset
        );

        if self.verbose >= 2 {
            return log_response_body(response, &colors).await;
        }
        response
    }
}

/// Echo the start of the request body and hand back an equivalent request.
///
/// A body over `limit` bytes is never buffered; the caller gets a `413`
/// response to return instead.
async fn log_request_body(
    request: Request,
    limit: usize,
    colors: &Colors,
) -> Result<Request, Response> {
    let (parts, body) = request.into_parts();
    let Ok(bytes) = axum::body::to_bytes(body, limit).await else {
        return Err((
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("request body exceeds {limit} bytes"),
        )
            .into_response());
    };

    if !bytes.is_empty() {
        let preview = String::from_utf8_lossy(&bytes[..bytes.len().min(BODY_PREVIEW_BYTES)]);
        let more = if bytes.len() > BODY_PREVIEW_BYTES {
            format!("\n... ({} bytes total)", bytes.len())
        } else {
            String::new()
        };
        eprintln!(
            "{} - DEBUG - {}Request body:{}\n{}{}{}{}",
            timestamp(),
            colors.dim,
            colors.reset,
            colors.gray,
            preview.escape_debug(),
            more,
            colors.reset
        );
    }
    Ok(Request::from_parts(parts, Body::from(bytes)))
}

async fn log_response_body(response: Response, colors: &Colors) -> Response {
    let (parts, body) = response.into_parts();
    let Ok(bytes) = axum::body::to_bytes(body, usize::MAX).await else {
        return Response::from_parts(parts, Body::empty());
    };

    if !bytes.is_empty() {
        let body_str = serde_json::from_slice::<serde_json::Value>(&bytes)
            .ok()
            .and_then(|json| serde_json::to_string_pretty(&json).ok())
            .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned());
        eprintln!(
            "{} - DEBUG - {}Response body:{}\n{}{}{}",
            timestamp(),
            colors.dim,
            colors.reset,
            colors.gray,
            body_str,
            colors.reset
        );
    }
    Response::from_parts(parts, Body::from(bytes))
}
