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

//! Entry point to the demonstration server.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use std::net::Ipv4Addr;
use tokio::net::TcpListener;
use userdir_core::env::get_optional_var;
use userdir_demo::serve;

/// Port to listen on when `DEMO_PORT` is not set.
const DEFAULT_PORT: u16 = 8080;

#[tokio::main]
async fn main() {
    env_logger::init();

    let port = get_optional_var::<u16>("DEMO", "PORT")
        .expect("DEMO_PORT must be a valid port number")
        .unwrap_or(DEFAULT_PORT);

    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await.unwrap();
    serve(listener).await.unwrap()
}
