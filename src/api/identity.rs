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

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use classcards_core::error::Fallible;
use classcards_core::error::invalid;
use classcards_core::error::unauthorized;
use classcards_core::password::check_strength;
use classcards_core::password::hash_password;
use classcards_core::password::verify_password;
use classcards_core::types::timestamp::Timestamp;

use crate::api::response::ApiResult;
use crate::api::state::ServerState;
use crate::db::Database;

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

pub async fn register_handler(
    State(state): State<ServerState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let db = state.db.lock().unwrap();
    let body = register(&db, &req)?;
    Ok((StatusCode::CREATED, Json(body)))
}

fn register(db: &Database, req: &RegisterRequest) -> Fallible<Value> {
    let username = req.username.trim();
    let email = req.email.trim();
    if username.is_empty() || email.is_empty() || req.password.is_empty() {
        return invalid("Username, email, and password are required");
    }
    // Uniqueness is checked before password strength: a taken name fails the
    // request no matter how good the password is.
    if db.user_by_username(username)?.is_some() {
        return invalid("Username already exists");
    }
    if db.email_exists(email)? {
        return invalid("Email already exists");
    }
    check_strength(&req.password, username, email)?;
    let password_hash = hash_password(&req.password)?;
    db.create_user(username, email, &password_hash, Timestamp::now())?;
    log::debug!("Registered user '{username}'");
    Ok(json!({ "success": true, "username": username }))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

pub async fn login_handler(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<Value>> {
    let db = state.db.lock().unwrap();
    let body = login(&db, &req)?;
    Ok(Json(body))
}

fn login(db: &Database, req: &LoginRequest) -> Fallible<Value> {
    if req.username.is_empty() || req.password.is_empty() {
        return invalid("Username and password required");
    }
    // Unknown users and wrong passwords get the same answer.
    let user = match db.user_by_username(&req.username)? {
        Some(user) => user,
        None => return unauthorized("Invalid username or password"),
    };
    if !verify_password(&req.password, &user.password_hash) {
        return unauthorized("Invalid username or password");
    }
    Ok(json!({ "success": true }))
}
