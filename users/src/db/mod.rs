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

//! Database abstraction to look up users.

use crate::model::{User, UserId};
use sqlx::Row;
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(test)]
use sqlx::sqlite::SqliteRow;
#[cfg(feature = "postgres")]
use time::OffsetDateTime;
#[cfg(feature = "postgres")]
use userdir_core::db::postgres;
#[cfg(test)]
use userdir_core::db::sqlite::{self, build_timestamp, unpack_timestamp};
use userdir_core::db::{DbError, DbResult, Executor};


/// Initializes the database schema.  The service only reads from a pre-existing table, so this is
/// only used to populate test databases.
#[cfg(test)]
pub(crate) async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,

        #[cfg(test)]
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,

        #[allow(unused)]
        _ => unreachable!(),
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for User {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
        let mail: String = row.try_get("mail").map_err(postgres::map_sqlx_error)?;
        let birthday: OffsetDateTime = row.try_get("birthday").map_err(postgres::map_sqlx_error)?;
        let created_at: OffsetDateTime =
            row.try_get("created_at").map_err(postgres::map_sqlx_error)?;
        let updated_at: OffsetDateTime =
            row.try_get("updated_at").map_err(postgres::map_sqlx_error)?;

        Ok(User::new(UserId::from_i64(id)?, name, mail, birthday, created_at, updated_at))
    }
}

#[cfg(test)]
impl TryFrom<SqliteRow> for User {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
        let mail: String = row.try_get("mail").map_err(sqlite::map_sqlx_error)?;
        let birthday_secs: i64 = row.try_get("birthday_secs").map_err(sqlite::map_sqlx_error)?;
        let birthday_nsecs: i64 = row.try_get("birthday_nsecs").map_err(sqlite::map_sqlx_error)?;
        let created_at_secs: i64 =
            row.try_get("created_at_secs").map_err(sqlite::map_sqlx_error)?;
        let created_at_nsecs: i64 =
            row.try_get("created_at_nsecs").map_err(sqlite::map_sqlx_error)?;
        let updated_at_secs: i64 =
            row.try_get("updated_at_secs").map_err(sqlite::map_sqlx_error)?;
        let updated_at_nsecs: i64 =
            row.try_get("updated_at_nsecs").map_err(sqlite::map_sqlx_error)?;

        Ok(User::new(
            UserId::from_i64(id)?,
            name,
            mail,
            build_timestamp(birthday_secs, birthday_nsecs)?,
            build_timestamp(created_at_secs, created_at_nsecs)?,
            build_timestamp(updated_at_secs, updated_at_nsecs)?,
        ))
    }
}

/// Gets the user identified by `id`.
///
/// Returns `DbError::NotFound` if there is no such user.  Identifiers that do not fit in the
/// signed column type cannot exist, so they are reported as missing without querying the store.
pub(crate) async fn get_user_by_id(ex: &mut Executor, id: UserId) -> DbResult<User> {
    let Some(raw_id) = id.as_i64() else {
        return Err(DbError::NotFound);
    };

    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM users WHERE id = $1";
            let row = sqlx::query(query_str)
                .bind(raw_id)
                .fetch_one(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            User::try_from(row)
        }

        #[cfg(test)]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM users WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(raw_id)
                .fetch_one(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            User::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Inserts a new `user` into the database.  Users are never created by the service itself, so
/// this only exists to populate test databases.
#[cfg(test)]
pub(crate) async fn create_user(ex: &mut Executor, user: &User) -> DbResult<()> {
    let Some(raw_id) = user.id().as_i64() else {
        return Err(DbError::BackendError(format!("User id {:?} out of range", user.id())));
    };

    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO users (id, name, mail, birthday, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6)
            ";
            let done = sqlx::query(query_str)
                .bind(raw_id)
                .bind(user.name())
                .bind(user.mail())
                .bind(user.birthday())
                .bind(user.created_at())
                .bind(user.updated_at())
                .execute(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(test)]
        Executor::Sqlite(ex) => {
            let (birthday_secs, birthday_nsecs) = unpack_timestamp(*user.birthday());
            let (created_at_secs, created_at_nsecs) = unpack_timestamp(*user.created_at());
            let (updated_at_secs, updated_at_nsecs) = unpack_timestamp(*user.updated_at());

            let query_str = "
                INSERT INTO users (
                    id, name, mail,
                    birthday_secs, birthday_nsecs,
                    created_at_secs, created_at_nsecs,
                    updated_at_secs, updated_at_nsecs
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ";
            let done = sqlx::query(query_str)
                .bind(raw_id)
                .bind(user.name())
                .bind(user.mail())
                .bind(birthday_secs)
                .bind(birthday_nsecs)
                .bind(created_at_secs)
                .bind(created_at_nsecs)
                .bind(updated_at_secs)
                .bind(updated_at_nsecs)
                .execute(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    if rows_affected != 1 {
        return Err(DbError::BackendError("Insertion affected more than one row".to_owned()));
    }
    Ok(())
}
