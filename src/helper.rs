// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Helpers for the end-to-end tests.

use std::time::Duration;

use reqwest::Client;
use reqwest::StatusCode;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::time::sleep;

use classcards_core::error::ErrorKind;
use classcards_core::error::ErrorReport;
use classcards_core::error::Fallible;

pub async fn wait_for_server(host: &str, port: u16) -> Fallible<()> {
    loop {
        if let Ok(stream) = TcpStream::connect(format!("{host}:{port}")).await {
            drop(stream);
            break;
        }
        sleep(Duration::from_millis(1)).await;
    }
    Ok(())
}

fn http_err(e: reqwest::Error) -> ErrorReport {
    ErrorReport::new(ErrorKind::Internal, format!("HTTP error: {e}"))
}

/// GETs a URL and decodes the JSON body. Every endpoint answers with JSON,
/// including the fallback.
pub async fn get(url: &str) -> Fallible<(StatusCode, Value)> {
    let response = reqwest::get(url).await.map_err(http_err)?;
    let status = response.status();
    let body = response.json().await.map_err(http_err)?;
    Ok((status, body))
}

/// POSTs a JSON body to a URL and decodes the JSON response.
pub async fn post(url: &str, body: Value) -> Fallible<(StatusCode, Value)> {
    let response = Client::new()
        .post(url)
        .json(&body)
        .send()
        .await
        .map_err(http_err)?;
    let status = response.status();
    let body = response.json().await.map_err(http_err)?;
    Ok((status, body))
}
