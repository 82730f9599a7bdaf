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

//! Test utilities for the REST API.

use crate::db;
use crate::driver::Driver;
use crate::model::{User, UserId};
use crate::rest::app;
use axum::Router;
use std::sync::Arc;
use time::macros::datetime;
use userdir_core::db::{Db, Executor};

pub(crate) struct TestContext {
    db: Arc<dyn Db + Send + Sync>,
    app: Router,
}

impl TestContext {
    pub(crate) async fn setup() -> Self {
        let db = Arc::new(userdir_core::db::sqlite::testutils::setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let driver = Driver::new(db.clone());
        let app = app(driver);
        Self { db, app }
    }

    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    pub(crate) async fn create_user(&self, id: u64, name: &str) -> User {
        let user = User::new(
            UserId::new(id),
            name,
            format!("{}@example.com", name.to_lowercase()),
            datetime!(1990-05-17 00:00:00 UTC),
            datetime!(2023-01-02 03:04:05 UTC),
            datetime!(2023-06-07 08:09:10 UTC),
        );
        db::create_user(&mut self.db.ex().await.unwrap(), &user).await.unwrap();
        user
    }

    pub(crate) async fn drop_users_table(&self) {
        match self.db.ex().await.unwrap() {
            Executor::Sqlite(mut ex) => {
                sqlx::query("DROP TABLE users").execute(&mut *ex).await.unwrap();
            }

            #[allow(unused)]
            _ => unreachable!(),
        }
    }
}
