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

//! High-level data types.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;
use userdir_core::model::{ModelError, ModelResult};

/// Newtype pattern for the numeric identifiers of users.
///
/// Identifiers are unsigned in the API but the database stores them as signed 64-bit integers, so
/// only the `[0, i64::MAX]` range can ever exist in storage.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Creates a new identifier from its raw value.
    #[cfg(test)]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Creates an identifier from an `i64` read from the database, with range validation.
    pub(crate) fn from_i64(id: i64) -> ModelResult<Self> {
        match u64::try_from(id) {
            Ok(id) => Ok(Self(id)),
            Err(e) => Err(ModelError(format!("User id {} cannot be represented: {}", id, e))),
        }
    }

    /// Returns the identifier as an `i64` for use in database queries, or `None` if it is too
    /// large to have ever been stored.
    pub(crate) fn as_i64(&self) -> Option<i64> {
        i64::try_from(self.0).ok()
    }
}

impl FromStr for UserId {
    type Err = ModelError;

    /// Parses a decimal identifier.  Only ASCII digits are accepted: signs are rejected even
    /// though `u64::from_str` would take a leading `+`.
    fn from_str(s: &str) -> ModelResult<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ModelError(format!("Cannot parse `{}` to a `u64`", s)));
        }
        match s.parse::<u64>() {
            Ok(id) => Ok(Self(id)),
            Err(e) => Err(ModelError(format!("Cannot parse `{}` to a `u64`: {}", s, e))),
        }
    }
}

/// Representation of a user record.
#[derive(Clone, Debug, Deserialize, Getters, PartialEq, Serialize)]
pub struct User {
    /// Primary key of the user.
    id: UserId,

    /// Display name of the user.
    name: String,

    /// Mail address of the user.
    mail: String,

    /// Date of birth of the user.
    #[serde(with = "time::serde::rfc3339")]
    birthday: OffsetDateTime,

    /// Time when the record was created.
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,

    /// Time when the record was last modified.
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

impl User {
    /// Creates a new user record from its parts.
    pub fn new<N: Into<String>, M: Into<String>>(
        id: UserId,
        name: N,
        mail: M,
        birthday: OffsetDateTime,
        created_at: OffsetDateTime,
        updated_at: OffsetDateTime,
    ) -> Self {
        Self { id, name: name.into(), mail: mail.into(), birthday, created_at, updated_at }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::{Token, assert_tokens};
    use time::macros::datetime;

    #[test]
    fn test_user_id_from_i64() {
        assert_eq!(UserId::new(0), UserId::from_i64(0).unwrap());
        assert_eq!(UserId::new(i64::MAX as u64), UserId::from_i64(i64::MAX).unwrap());
        assert!(UserId::from_i64(-1).unwrap_err().0.contains("User id -1 cannot be represented"));
    }

    #[test]
    fn test_user_id_as_i64() {
        assert_eq!(Some(42), UserId::new(42).as_i64());
        assert_eq!(Some(i64::MAX), UserId::new(i64::MAX as u64).as_i64());
        assert_eq!(None, UserId::new(i64::MAX as u64 + 1).as_i64());
        assert_eq!(None, UserId::new(u64::MAX).as_i64());
    }

    #[test]
    fn test_user_id_from_str_ok() {
        assert_eq!(UserId::new(0), UserId::from_str("0").unwrap());
        assert_eq!(UserId::new(42), UserId::from_str("42").unwrap());
        assert_eq!(UserId::new(42), UserId::from_str("0042").unwrap());
        assert_eq!(UserId::new(u64::MAX), UserId::from_str("18446744073709551615").unwrap());
    }

    #[test]
    fn test_user_id_from_str_errors() {
        for raw in ["", "abc", "+42", "-1", " 42", "42 ", "4_2", "18446744073709551616"] {
            let e = UserId::from_str(raw).unwrap_err();
            assert!(e.0.starts_with("Cannot parse"), "Unexpected error for {:?}: {}", raw, e);
        }
    }

    #[test]
    fn test_user_id_ser_de() {
        assert_tokens(&UserId::new(1234), &[Token::U64(1234)]);
    }

    #[test]
    fn test_user_ser_de() {
        let user = User::new(
            UserId::new(42),
            "Alice",
            "alice@example.com",
            datetime!(1990-05-17 00:00:00 UTC),
            datetime!(2023-01-02 03:04:05 UTC),
            datetime!(2023-06-07 08:09:10.5 UTC),
        );
        assert_tokens(
            &user,
            &[
                Token::Struct { name: "User", len: 6 },
                Token::Str("id"),
                Token::U64(42),
                Token::Str("name"),
                Token::Str("Alice"),
                Token::Str("mail"),
                Token::Str("alice@example.com"),
                Token::Str("birthday"),
                Token::Str("1990-05-17T00:00:00Z"),
                Token::Str("created_at"),
                Token::Str("2023-01-02T03:04:05Z"),
                Token::Str("updated_at"),
                Token::Str("2023-06-07T08:09:10.5Z"),
                Token::StructEnd,
            ],
        );
    }

    #[test]
    fn test_user_json_keys() {
        let user = User::new(
            UserId::new(7),
            "Bob",
            "bob@example.com",
            datetime!(2000-02-29 12:00:00 UTC),
            datetime!(2023-01-01 00:00:00 UTC),
            datetime!(2023-01-01 00:00:00 UTC),
        );
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(
            serde_json::json!({
                "id": 7,
                "name": "Bob",
                "mail": "bob@example.com",
                "birthday": "2000-02-29T12:00:00Z",
                "created_at": "2023-01-01T00:00:00Z",
                "updated_at": "2023-01-01T00:00:00Z",
            }),
            json
        );
    }
}
