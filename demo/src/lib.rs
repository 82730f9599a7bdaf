// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Demonstration server showing basic routing with a custom error formatter.
//!
//! This is independent from the user lookup service and only shares the framework in
//! `userdir-core` with it.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use log::{error, info};
use serde::Serialize;
use std::io;
use tokio::net::TcpListener;

/// Text returned in the envelope of every error response.
const ERROR_TEXT: &str = "Internal Server Error";

/// An error response raised by the router or by a handler, identified by its HTTP status.
///
/// Handlers that fail for reasons other than HTTP semantics (for example, a body that cannot be
/// serialized) surface as 500s from axum and are reformatted with that status.
#[derive(Debug, thiserror::Error)]
#[error("HTTP error {0}")]
pub struct DemoError(StatusCode);

/// Envelope for all error responses.
#[derive(Serialize)]
struct CustomErrorResponse {
    /// Fixed error text.
    custom: &'static str,
}

/// Marker attached to responses that have already gone through the error formatter.
#[derive(Clone, Copy)]
struct Formatted;

impl IntoResponse for DemoError {
    fn into_response(self) -> Response {
        error!("Request failed with status {}: {}", self.0.as_u16(), self);

        let body = CustomErrorResponse { custom: ERROR_TEXT };
        let mut response = (self.0, Json(body)).into_response();
        response.extensions_mut().insert(Formatted);
        response
    }
}

/// Canned payload for the `/map` route.
#[derive(Serialize)]
struct Greeting {
    /// The greeting text.
    message: &'static str,
}

/// Handler for `GET /map`.
async fn map_handler() -> Json<Greeting> {
    Json(Greeting { message: "Hello" })
}

/// Handler for `GET /str`.
async fn str_handler() -> Json<&'static str> {
    Json("Hello")
}

/// Handler for `GET /string`.
async fn string_handler() -> StatusCode {
    StatusCode::CREATED
}

/// Handler for any unknown route.
async fn fallback_handler() -> DemoError {
    DemoError(StatusCode::NOT_FOUND)
}

/// Replaces the body of error responses not produced by `DemoError` with the custom envelope.
async fn format_errors(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();
    if (status.is_client_error() || status.is_server_error())
        && response.extensions().get::<Formatted>().is_none()
    {
        DemoError(status).into_response()
    } else {
        response
    }
}

/// Emits one log line per request.
async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let response = next.run(request).await;
    info!("{} {} {}", method, uri, response.status().as_u16());
    response
}

/// Wraps all routes in `router` with the error formatter and the request logger.
fn with_middleware(router: Router) -> Router {
    router
        .fallback(fallback_handler)
        .layer(middleware::from_fn(format_errors))
        .layer(middleware::from_fn(log_requests))
}

/// Creates the router for the application.
pub fn app() -> Router {
    use axum::routing::get;
    with_middleware(
        Router::new()
            .route("/map", get(map_handler))
            .route("/str", get(str_handler))
            .route("/string", get(string_handler)),
    )
}

/// Serves the demo application on `listener` until the process is asked to terminate.
pub async fn serve(listener: TcpListener) -> io::Result<()> {
    userdir_core::rest::serve(listener, app()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http;
    use serde_json::json;
    use userdir_core::rest::testutils::OneShotBuilder;

    #[tokio::test]
    async fn test_map() {
        let response = OneShotBuilder::new(app(), (http::Method::GET, "/map"))
            .send_empty()
            .await
            .expect_json::<serde_json::Value>()
            .await;
        assert_eq!(json!({"message": "Hello"}), response);
    }

    #[tokio::test]
    async fn test_str() {
        let response = OneShotBuilder::new(app(), (http::Method::GET, "/str"))
            .send_empty()
            .await
            .expect_json::<serde_json::Value>()
            .await;
        assert_eq!(json!("Hello"), response);
    }

    #[tokio::test]
    async fn test_string_created() {
        OneShotBuilder::new(app(), (http::Method::GET, "/string"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_empty()
            .await;
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = OneShotBuilder::new(app(), (http::Method::GET, "/missing"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_json::<serde_json::Value>()
            .await;
        assert_eq!(json!({"custom": "Internal Server Error"}), response);
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let response = OneShotBuilder::new(app(), (http::Method::POST, "/map"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::METHOD_NOT_ALLOWED)
            .expect_json::<serde_json::Value>()
            .await;
        assert_eq!(json!({"custom": "Internal Server Error"}), response);
    }

    #[tokio::test]
    async fn test_non_http_error_defaults_to_500() {
        use axum::routing::get;
        use std::collections::HashMap;

        // JSON objects need string keys, so this cannot be serialized.
        let app = with_middleware(Router::new().route(
            "/fail",
            get(|| async { Json(HashMap::from([((1, 2), 3)])) }),
        ));

        let response = OneShotBuilder::new(app, (http::Method::GET, "/fail"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::INTERNAL_SERVER_ERROR)
            .expect_json::<serde_json::Value>()
            .await;
        assert_eq!(json!({"custom": "Internal Server Error"}), response);
    }

    #[test]
    fn test_error_keeps_status() {
        let response = DemoError(http::StatusCode::BAD_GATEWAY).into_response();
        assert_eq!(http::StatusCode::BAD_GATEWAY, response.status());
        assert!(response.extensions().get::<Formatted>().is_some());
    }
}
