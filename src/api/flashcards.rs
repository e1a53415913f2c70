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
use classcards_core::types::timestamp::Timestamp;

use crate::api::classes::resolve_user;
use crate::api::response::ApiResult;
use crate::api::state::ServerState;
use crate::db::Database;

#[derive(Serialize)]
pub struct CardOut {
    id: i64,
    front_text: String,
    back_text: String,
}

pub async fn get_flashcards_handler(
    State(state): State<ServerState>,
    Query(query): Query<UsernameQuery>,
) -> ApiResult<Json<Vec<CardOut>>> {
    let db = state.db.lock().unwrap();
    let user = resolve_user(&db, query.username.as_deref())?;
    let cards = db
        .cards_by_creator(user.id)?
        .into_iter()
        .map(|c| CardOut {
            id: c.id,
            front_text: c.front_text,
            back_text: c.back_text,
        })
        .collect();
    Ok(Json(cards))
}

#[derive(Deserialize)]
pub struct UsernameQuery {
    username: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateFlashcardRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    question: String,
    #[serde(default)]
    answer: String,
    set_id: Option<i64>,
}

pub async fn create_flashcard_handler(
    State(state): State<ServerState>,
    Json(req): Json<CreateFlashcardRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut db = state.db.lock().unwrap();
    let body = create_flashcard(&mut db, &req)?;
    Ok((StatusCode::CREATED, Json(body)))
}

fn create_flashcard(db: &mut Database, req: &CreateFlashcardRequest) -> Fallible<Value> {
    if req.username.is_empty() {
        return invalid("Username is required");
    }
    let question = req.question.trim();
    let answer = req.answer.trim();
    if question.is_empty() || answer.is_empty() {
        return invalid("Question and answer are required");
    }
    let user = match db.user_by_username(&req.username)? {
        Some(user) => user,
        None => return not_found("User not found"),
    };
    let card_id = match req.set_id {
        Some(set_id) => {
            let set = match db.set_by_id(set_id)? {
                Some(set) => set,
                None => return not_found("Flashcard set not found"),
            };
            db.create_card_in_set(&set, user.id, question, answer)?
        }
        None => {
            db.create_card_in_default_set(user.id, &user.username, question, answer, Timestamp::now())?
        }
    };
    Ok(json!({
        "success": true,
        "id": card_id,
        "question": question,
        "answer": answer,
    }))
}

#[derive(Serialize)]
pub struct SetOut {
    id: i64,
    name: String,
    description: String,
    class_obj_id: i64,
    created_at: Timestamp,
}

pub async fn flashcard_sets_handler(
    State(state): State<ServerState>,
    Query(query): Query<UsernameQuery>,
) -> ApiResult<Json<Vec<SetOut>>> {
    let db = state.db.lock().unwrap();
    let user = resolve_user(&db, query.username.as_deref())?;
    let sets = db
        .sets_by_creator(user.id)?
        .into_iter()
        .map(|s| SetOut {
            id: s.id,
            name: s.name,
            description: s.description,
            class_obj_id: s.class_id,
            created_at: s.created_at,
        })
        .collect();
    Ok(Json(sets))
}

#[derive(Deserialize)]
pub struct SetQuery {
    set_id: Option<i64>,
}

#[derive(Serialize)]
pub struct SetCardOut {
    id: i64,
    front_text: String,
    back_text: String,
    creator_id: Option<i64>,
}

pub async fn cards_in_set_handler(
    State(state): State<ServerState>,
    Query(query): Query<SetQuery>,
) -> ApiResult<Json<Vec<SetCardOut>>> {
    let db = state.db.lock().unwrap();
    let cards = cards_in_set(&db, query.set_id)?;
    Ok(Json(cards))
}

fn cards_in_set(db: &Database, set_id: Option<i64>) -> Fallible<Vec<SetCardOut>> {
    let Some(set_id) = set_id else {
        return invalid("set_id is required");
    };
    if db.set_by_id(set_id)?.is_none() {
        return not_found("Flashcard set not found");
    }
    let cards = db
        .cards_in_set(set_id)?
        .into_iter()
        .map(|c| SetCardOut {
            id: c.id,
            front_text: c.front_text,
            back_text: c.back_text,
            creator_id: c.creator_id,
        })
        .collect();
    Ok(cards)
}

#[derive(Deserialize)]
pub struct CreateSetRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    class_id: Option<i64>,
}

pub async fn create_flashcard_set_handler(
    State(state): State<ServerState>,
    Json(req): Json<CreateSetRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut db = state.db.lock().unwrap();
    let body = create_flashcard_set(&mut db, &req)?;
    Ok((StatusCode::CREATED, Json(body)))
}

fn create_flashcard_set(db: &mut Database, req: &CreateSetRequest) -> Fallible<Value> {
    let name = req.name.trim();
    if req.username.is_empty() || name.is_empty() {
        return invalid("username and name are required");
    }
    let user = match db.user_by_username(&req.username)? {
        Some(user) => user,
        None => return not_found("User not found"),
    };
    let description = req.description.trim();
    let set_id = match req.class_id {
        Some(class_id) => {
            if db.class_by_id(class_id)?.is_none() {
                return not_found("Class not found");
            }
            db.create_set(class_id, user.id, name, description, Timestamp::now())?
        }
        None => db.create_set_in_default_class(
            user.id,
            &user.username,
            name,
            description,
            Timestamp::now(),
        )?,
    };
    Ok(json!({ "success": true, "id": set_id, "name": name }))
}
