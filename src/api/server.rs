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

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use axum::routing::post;
use serde_json::Value;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::signal;

use classcards_core::error::Fallible;

use crate::api::boards::get_messages_handler;
use crate::api::boards::leaderboard_handler;
use crate::api::boards::post_message_handler;
use crate::api::boards::record_score_handler;
use crate::api::boards::record_study_time_handler;
use crate::api::classes::create_class_handler;
use crate::api::classes::join_class_handler;
use crate::api::classes::list_classes_handler;
use crate::api::classes::user_classes_handler;
use crate::api::flashcards::cards_in_set_handler;
use crate::api::flashcards::create_flashcard_handler;
use crate::api::flashcards::create_flashcard_set_handler;
use crate::api::flashcards::flashcard_sets_handler;
use crate::api::flashcards::get_flashcards_handler;
use crate::api::identity::login_handler;
use crate::api::identity::register_handler;
use crate::api::state::ServerState;
use crate::db::Database;

pub struct ServerConfig {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
}

pub async fn start_server(config: ServerConfig) -> Fallible<()> {
    let db = Database::open(&config.db_path)?;
    log::debug!("Opened database at {}", config.db_path.display());

    let state = ServerState {
        db: Arc::new(Mutex::new(db)),
    };
    let app = Router::new();
    let app = app.route("/api/register/", post(register_handler));
    let app = app.route("/api/login/", post(login_handler));
    let app = app.route("/api/classes/", get(list_classes_handler));
    let app = app.route("/api/user-classes/", get(user_classes_handler));
    let app = app.route("/api/create-class/", post(create_class_handler));
    let app = app.route("/api/join-class/", post(join_class_handler));
    let app = app.route("/api/flashcards/", get(get_flashcards_handler));
    let app = app.route("/api/flashcards/set/", get(cards_in_set_handler));
    let app = app.route("/api/create-flashcard/", post(create_flashcard_handler));
    let app = app.route("/api/flashcard-sets/", get(flashcard_sets_handler));
    let app = app.route(
        "/api/create-flashcard-set/",
        post(create_flashcard_set_handler),
    );
    let app = app.route("/api/post-message/", post(post_message_handler));
    let app = app.route("/api/messages/", get(get_messages_handler));
    let app = app.route("/api/record-score/", post(record_score_handler));
    let app = app.route("/api/leaderboard/", get(leaderboard_handler));
    let app = app.route("/api/record-study-time/", post(record_study_time_handler));
    let app = app.fallback(not_found_handler);
    let app = app.with_state(state);
    let bind = format!("{}:{}", config.host, config.port);

    // Start the server with graceful shutdown on Ctrl+C.
    log::debug!("Starting server on {bind}");
    let listener = TcpListener::bind(bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn not_found_handler() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" })))
}

async fn shutdown_signal() {
    signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    log::debug!("Received Ctrl+C, shutting down gracefully");
}
