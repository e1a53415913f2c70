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

//! Message boards, leaderboards, and study-time tracking.

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
use classcards_core::types::timestamp::Timestamp;

use crate::api::response::ApiResult;
use crate::api::state::ServerState;
use crate::db::Database;
use crate::db::UserRow;

#[derive(Deserialize)]
pub struct PostMessageRequest {
    #[serde(default)]
    username: String,
    class_id: Option<i64>,
    #[serde(default)]
    text: String,
}

pub async fn post_message_handler(
    State(state): State<ServerState>,
    Json(req): Json<PostMessageRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut db = state.db.lock().unwrap();
    let body = post_message(&mut db, &req)?;
    Ok((StatusCode::CREATED, Json(body)))
}

fn post_message(db: &mut Database, req: &PostMessageRequest) -> Fallible<Value> {
    let text = req.text.trim();
    let Some(class_id) = req.class_id else {
        return invalid("username, class_id, and text are required");
    };
    if req.username.is_empty() || text.is_empty() {
        return invalid("username, class_id, and text are required");
    }
    let user = match db.user_by_username(&req.username)? {
        Some(user) => user,
        None => return not_found("User not found"),
    };
    if db.class_by_id(class_id)?.is_none() {
        return not_found("Class not found");
    }
    let message_id = db.post_message(class_id, user.id, text, Timestamp::now())?;
    Ok(json!({ "success": true, "id": message_id }))
}

#[derive(Deserialize)]
pub struct ClassQuery {
    class_id: Option<i64>,
}

#[derive(Serialize)]
pub struct MessageOut {
    id: i64,
    username: String,
    message_text: String,
    timestamp: Timestamp,
}

pub async fn get_messages_handler(
    State(state): State<ServerState>,
    Query(query): Query<ClassQuery>,
) -> ApiResult<Json<Vec<MessageOut>>> {
    let db = state.db.lock().unwrap();
    let messages = get_messages(&db, query.class_id)?;
    Ok(Json(messages))
}

fn get_messages(db: &Database, class_id: Option<i64>) -> Fallible<Vec<MessageOut>> {
    let Some(class_id) = class_id else {
        return invalid("class_id is required");
    };
    if db.class_by_id(class_id)?.is_none() {
        return not_found("Class not found");
    }
    let messages = db
        .messages_for_class(class_id)?
        .into_iter()
        .map(|m| MessageOut {
            id: m.id,
            username: m.username,
            message_text: m.message_text,
            timestamp: m.timestamp,
        })
        .collect();
    Ok(messages)
}

#[derive(Deserialize)]
pub struct RecordScoreRequest {
    #[serde(default)]
    username: String,
    flashcard_id: Option<i64>,
    score: Option<i64>,
}

pub async fn record_score_handler(
    State(state): State<ServerState>,
    Json(req): Json<RecordScoreRequest>,
) -> ApiResult<Json<Value>> {
    let db = state.db.lock().unwrap();
    let body = record_score(&db, &req)?;
    Ok(Json(body))
}

fn record_score(db: &Database, req: &RecordScoreRequest) -> Fallible<Value> {
    let (Some(flashcard_id), Some(score)) = (req.flashcard_id, req.score) else {
        return invalid("username, flashcard_id, and score are required");
    };
    let user = resolve_card_user(db, &req.username, flashcard_id)?;
    let stored = db.record_score(flashcard_id, user.id, score, Timestamp::now())?;
    Ok(json!({ "success": true, "score": stored }))
}

#[derive(Deserialize)]
pub struct FlashcardQuery {
    flashcard_id: Option<i64>,
}

#[derive(Serialize)]
pub struct ScoreOut {
    username: String,
    score: i64,
}

pub async fn leaderboard_handler(
    State(state): State<ServerState>,
    Query(query): Query<FlashcardQuery>,
) -> ApiResult<Json<Vec<ScoreOut>>> {
    let db = state.db.lock().unwrap();
    let scores = leaderboard(&db, query.flashcard_id)?;
    Ok(Json(scores))
}

fn leaderboard(db: &Database, flashcard_id: Option<i64>) -> Fallible<Vec<ScoreOut>> {
    let Some(flashcard_id) = flashcard_id else {
        return invalid("flashcard_id is required");
    };
    if !db.flashcard_exists(flashcard_id)? {
        return not_found("Flashcard not found");
    }
    let scores = db
        .leaderboard(flashcard_id)?
        .into_iter()
        .map(|s| ScoreOut {
            username: s.username,
            score: s.score,
        })
        .collect();
    Ok(scores)
}

#[derive(Deserialize)]
pub struct RecordStudyTimeRequest {
    #[serde(default)]
    username: String,
    flashcard_id: Option<i64>,
    seconds: Option<i64>,
}

pub async fn record_study_time_handler(
    State(state): State<ServerState>,
    Json(req): Json<RecordStudyTimeRequest>,
) -> ApiResult<Json<Value>> {
    let db = state.db.lock().unwrap();
    let body = record_study_time(&db, &req)?;
    Ok(Json(body))
}

fn record_study_time(db: &Database, req: &RecordStudyTimeRequest) -> Fallible<Value> {
    let (Some(flashcard_id), Some(seconds)) = (req.flashcard_id, req.seconds) else {
        return invalid("username, flashcard_id, and seconds are required");
    };
    let user = resolve_card_user(db, &req.username, flashcard_id)?;
    let total = db.add_study_time(flashcard_id, user.id, seconds, Timestamp::now())?;
    Ok(json!({ "success": true, "time_spent": total }))
}

/// Common resolution for the per-card tracking endpoints: the user must
/// exist, the flashcard must exist, and the username must be present.
fn resolve_card_user(db: &Database, username: &str, flashcard_id: i64) -> Fallible<UserRow> {
    if username.is_empty() {
        return invalid("username is required");
    }
    let user = match db.user_by_username(username)? {
        Some(user) => user,
        None => return not_found("User not found"),
    };
    if !db.flashcard_exists(flashcard_id)? {
        return not_found("Flashcard not found");
    }
    Ok(user)
}
