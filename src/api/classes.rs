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
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use classcards_core::error::Fallible;
use classcards_core::error::invalid;
use classcards_core::error::not_found;
use classcards_core::types::role::Role;

use crate::api::response::ApiResult;
use crate::api::state::ServerState;
use crate::db::Database;
use crate::db::UserRow;

#[derive(Serialize)]
pub struct ClassOut {
    id: i64,
    class_name: String,
    class_number: String,
    description: String,
}

pub async fn list_classes_handler(
    State(state): State<ServerState>,
) -> ApiResult<Json<Vec<ClassOut>>> {
    let db = state.db.lock().unwrap();
    let classes = db
        .all_classes()?
        .into_iter()
        .map(|c| ClassOut {
            id: c.id,
            class_name: c.class_name,
            class_number: c.class_number,
            description: c.description,
        })
        .collect();
    Ok(Json(classes))
}

#[derive(Deserialize)]
pub struct UsernameQuery {
    username: Option<String>,
}

#[derive(Serialize)]
pub struct UserClassOut {
    id: i64,
    class_name: String,
    class_number: String,
    description: String,
    role_in_class: Role,
}

pub async fn user_classes_handler(
    State(state): State<ServerState>,
    Query(query): Query<UsernameQuery>,
) -> ApiResult<Json<Vec<UserClassOut>>> {
    let db = state.db.lock().unwrap();
    let user = resolve_user(&db, query.username.as_deref())?;
    let memberships = db
        .classes_for_user(user.id)?
        .into_iter()
        .map(|m| UserClassOut {
            id: m.class.id,
            class_name: m.class.class_name,
            class_number: m.class.class_number,
            description: m.class.description,
            role_in_class: m.role_in_class,
        })
        .collect();
    Ok(Json(memberships))
}

#[derive(Deserialize)]
pub struct CreateClassRequest {
    #[serde(default)]
    class_name: String,
    #[serde(default)]
    class_number: String,
    #[serde(default)]
    description: String,
    username: Option<String>,
    role: Option<String>,
}

pub async fn create_class_handler(
    State(state): State<ServerState>,
    Json(req): Json<CreateClassRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let db = state.db.lock().unwrap();
    let body = create_class(&db, &req)?;
    Ok((StatusCode::CREATED, Json(body)))
}

fn create_class(db: &Database, req: &CreateClassRequest) -> Fallible<Value> {
    let class_name = req.class_name.trim();
    let class_number = req.class_number.trim();
    if class_name.is_empty() || class_number.is_empty() {
        return invalid("class_name and class_number are required");
    }
    let class_id = db.create_class(class_name, class_number, req.description.trim())?;
    // A creator username is optional, and one that does not resolve is
    // ignored: the class is created either way, without a membership.
    if let Some(username) = &req.username {
        if let Some(user) = db.user_by_username(username)? {
            let role = req
                .role
                .as_deref()
                .and_then(Role::parse)
                .unwrap_or(Role::Leader);
            db.create_membership(user.id, class_id, role)?;
        }
    }
    Ok(json!({ "success": true, "id": class_id, "class_name": class_name }))
}

#[derive(Deserialize)]
pub struct JoinClassRequest {
    #[serde(default)]
    username: String,
    class_id: Option<i64>,
}

pub async fn join_class_handler(
    State(state): State<ServerState>,
    Json(req): Json<JoinClassRequest>,
) -> ApiResult<Json<Value>> {
    let db = state.db.lock().unwrap();
    let body = join_class(&db, &req)?;
    Ok(Json(body))
}

fn join_class(db: &Database, req: &JoinClassRequest) -> Fallible<Value> {
    let Some(class_id) = req.class_id else {
        return invalid("username and class_id required");
    };
    if req.username.is_empty() {
        return invalid("username and class_id required");
    }
    let user = match db.user_by_username(&req.username)? {
        Some(user) => user,
        None => return not_found("User not found"),
    };
    if db.class_by_id(class_id)?.is_none() {
        return not_found("Class not found");
    }
    db.ensure_membership(user.id, class_id, Role::Student)?;
    Ok(json!({ "success": true }))
}

/// Resolves a username query parameter, distinguishing a missing parameter
/// (400) from an unknown user (404).
pub fn resolve_user(db: &Database, username: Option<&str>) -> Fallible<UserRow> {
    let username = match username {
        Some(username) if !username.is_empty() => username,
        _ => return invalid("Username is required"),
    };
    match db.user_by_username(username)? {
        Some(user) => Ok(user),
        None => not_found("User not found"),
    }
}
