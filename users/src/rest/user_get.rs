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

//! API to get a single user by its identifier.

use crate::driver::Driver;
use crate::model::UserId;
use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use serde::de::{self, Deserialize, Deserializer};
use userdir_core::driver::DriverError;
use userdir_core::rest::{EmptyBody, RestError};

/// Path parameter holding a user identifier written in plain decimal digits.
///
/// Going through `UserId::from_str` makes the `Path` extractor reject anything else with its
/// regular 400 response, including the signed forms that a bare `Path<u64>` would accept.
pub(crate) struct IdParam(UserId);

impl<'de> Deserialize<'de> for IdParam {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<UserId>().map(IdParam).map_err(de::Error::custom)
    }
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(IdParam(id)): Path<IdParam>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    match driver.get_user_by_id(id).await {
        Ok(user) => Ok(Json(user)),
        Err(DriverError::NotFound(_)) => Err(RestError::NotFound("user not found".to_owned())),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use crate::model::*;
    use crate::rest::testutils::*;
    use axum::http;
    use userdir_core::rest::testutils::*;
    use userdir_core::test_payload_must_be_empty;

    fn route(id: &str) -> (http::Method, String) {
        (http::Method::GET, format!("/users/{}", id))
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;

        let alice = context.create_user(42, "Alice").await;
        context.create_user(43, "Bob").await;

        let response = OneShotBuilder::new(context.into_app(), route("42"))
            .send_empty()
            .await
            .expect_json::<User>()
            .await;
        assert_eq!(alice, response);
    }

    #[tokio::test]
    async fn test_ok_json_layout() {
        let context = TestContext::setup().await;

        context.create_user(42, "Alice").await;

        let response = OneShotBuilder::new(context.into_app(), route("42"))
            .send_empty()
            .await
            .expect_json::<serde_json::Value>()
            .await;
        assert_eq!(
            serde_json::json!({
                "id": 42,
                "name": "Alice",
                "mail": "alice@example.com",
                "birthday": "1990-05-17T00:00:00Z",
                "created_at": "2023-01-02T03:04:05Z",
                "updated_at": "2023-06-07T08:09:10Z",
            }),
            response
        );
    }

    #[tokio::test]
    async fn test_missing() {
        let context = TestContext::setup().await;

        context.create_user(42, "Alice").await;

        OneShotBuilder::new(context.into_app(), route("9999"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("^user not found$")
            .await;
    }

    #[tokio::test]
    async fn test_out_of_storage_range() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.into_app(), route(&u64::MAX.to_string()))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("^user not found$")
            .await;
    }

    #[tokio::test]
    async fn test_bad_id_not_numeric() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.into_app(), route("abc"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_text("Cannot parse")
            .await;
    }

    #[tokio::test]
    async fn test_bad_id_negative() {
        let context = TestContext::setup().await;

        context.create_user(1, "Alice").await;

        OneShotBuilder::new(context.into_app(), route("-1"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_text("Cannot parse")
            .await;
    }

    #[tokio::test]
    async fn test_bad_id_plus_sign() {
        for raw in ["+42", "%2B42"] {
            let context = TestContext::setup().await;

            context.create_user(42, "Alice").await;

            OneShotBuilder::new(context.into_app(), route(raw))
                .send_empty()
                .await
                .expect_status(http::StatusCode::BAD_REQUEST)
                .expect_text("Cannot parse")
                .await;
        }
    }

    #[tokio::test]
    async fn test_bad_id_overflow() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.into_app(), route("18446744073709551616"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_text("Cannot parse")
            .await;
    }

    #[tokio::test]
    async fn test_backend_error() {
        let context = TestContext::setup().await;

        context.drop_users_table().await;

        OneShotBuilder::new(context.into_app(), route("42"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::INTERNAL_SERVER_ERROR)
            .expect_error("^Database error: .*no such table")
            .await;
    }

    test_payload_must_be_empty!(TestContext::setup().await.into_app(), route("42"));
}
