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

//! The SQLite store. All create/read operations the API performs live here;
//! multi-step writes run inside a single transaction.

use std::path::Path;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;

use classcards_core::error::ErrorKind;
use classcards_core::error::ErrorReport;
use classcards_core::error::Fallible;
use classcards_core::types::role::Role;
use classcards_core::types::timestamp::Timestamp;

const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS classes (
    id INTEGER PRIMARY KEY,
    class_name TEXT NOT NULL,
    class_number TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT ''
);

-- Backstop for the deterministic default-class key: two connections racing
-- to provision the same user's default class cannot both insert.
CREATE UNIQUE INDEX IF NOT EXISTS classes_default_number
    ON classes (class_number) WHERE class_number LIKE 'DEFAULT-%';

CREATE TABLE IF NOT EXISTS class_members (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    class_id INTEGER NOT NULL REFERENCES classes (id) ON DELETE CASCADE,
    role_in_class TEXT NOT NULL,
    UNIQUE (user_id, class_id)
);

CREATE TABLE IF NOT EXISTS flashcard_sets (
    id INTEGER PRIMARY KEY,
    class_id INTEGER NOT NULL REFERENCES classes (id) ON DELETE CASCADE,
    creator_id INTEGER REFERENCES users (id) ON DELETE SET NULL,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS flashcards (
    id INTEGER PRIMARY KEY,
    class_id INTEGER NOT NULL REFERENCES classes (id) ON DELETE CASCADE,
    set_id INTEGER REFERENCES flashcard_sets (id) ON DELETE CASCADE,
    creator_id INTEGER REFERENCES users (id) ON DELETE SET NULL,
    front_text TEXT NOT NULL,
    back_text TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS flashcard_leaderboard (
    id INTEGER PRIMARY KEY,
    flashcard_id INTEGER NOT NULL REFERENCES flashcards (id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    score INTEGER NOT NULL DEFAULT 0,
    last_updated TEXT NOT NULL,
    UNIQUE (flashcard_id, user_id)
);

CREATE TABLE IF NOT EXISTS flashcard_study_time (
    id INTEGER PRIMARY KEY,
    flashcard_id INTEGER NOT NULL REFERENCES flashcards (id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    time_spent INTEGER NOT NULL DEFAULT 0,
    last_studied TEXT NOT NULL,
    UNIQUE (flashcard_id, user_id)
);

CREATE TABLE IF NOT EXISTS message_boards (
    id INTEGER PRIMARY KEY,
    class_id INTEGER NOT NULL UNIQUE REFERENCES classes (id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY,
    board_id INTEGER NOT NULL REFERENCES message_boards (id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    message_text TEXT NOT NULL,
    timestamp TEXT NOT NULL
);
";

#[derive(Clone, Debug, PartialEq)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassRow {
    pub id: i64,
    pub class_name: String,
    pub class_number: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassWithRole {
    pub class: ClassRow,
    pub role_in_class: Role,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SetRow {
    pub id: i64,
    pub class_id: i64,
    pub creator_id: Option<i64>,
    pub name: String,
    pub description: String,
    pub created_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CardRow {
    pub id: i64,
    pub class_id: i64,
    pub set_id: Option<i64>,
    pub creator_id: Option<i64>,
    pub front_text: String,
    pub back_text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MessageRow {
    pub id: i64,
    pub username: String,
    pub message_text: String,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoreRow {
    pub username: String,
    pub score: i64,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Fallible<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Database { conn })
    }

    pub fn open_in_memory() -> Fallible<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Database { conn })
    }

    //
    // Users
    //

    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        now: Timestamp,
    ) -> Fallible<i64> {
        self.conn.execute(
            "INSERT INTO users (username, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![username, email, password_hash, now.to_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn user_by_username(&self, username: &str) -> Fallible<Option<UserRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, username, email, password_hash FROM users WHERE username = ?1",
                [username],
                |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        email: row.get(2)?,
                        password_hash: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    pub fn email_exists(&self, email: &str) -> Fallible<bool> {
        let id: Option<i64> = self
            .conn
            .query_row("SELECT id FROM users WHERE email = ?1", [email], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(id.is_some())
    }

    pub fn delete_user(&self, user_id: i64) -> Fallible<()> {
        self.conn
            .execute("DELETE FROM users WHERE id = ?1", [user_id])?;
        Ok(())
    }

    //
    // Classes and memberships
    //

    pub fn create_class(
        &self,
        class_name: &str,
        class_number: &str,
        description: &str,
    ) -> Fallible<i64> {
        self.conn.execute(
            "INSERT INTO classes (class_name, class_number, description) VALUES (?1, ?2, ?3)",
            params![class_name, class_number, description],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn class_by_id(&self, class_id: i64) -> Fallible<Option<ClassRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, class_name, class_number, description FROM classes WHERE id = ?1",
                [class_id],
                |row| {
                    Ok(ClassRow {
                        id: row.get(0)?,
                        class_name: row.get(1)?,
                        class_number: row.get(2)?,
                        description: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    pub fn all_classes(&self) -> Fallible<Vec<ClassRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, class_name, class_number, description FROM classes ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(ClassRow {
                id: row.get(0)?,
                class_name: row.get(1)?,
                class_number: row.get(2)?,
                description: row.get(3)?,
            })
        })?;
        let mut classes = Vec::new();
        for row in rows {
            classes.push(row?);
        }
        Ok(classes)
    }

    pub fn delete_class(&self, class_id: i64) -> Fallible<()> {
        self.conn
            .execute("DELETE FROM classes WHERE id = ?1", [class_id])?;
        Ok(())
    }

    /// The classes a user belongs to, with the user's role in each.
    pub fn classes_for_user(&self, user_id: i64) -> Fallible<Vec<ClassWithRole>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.class_name, c.class_number, c.description, m.role_in_class
             FROM class_members m JOIN classes c ON c.id = m.class_id
             WHERE m.user_id = ?1
             ORDER BY c.id",
        )?;
        let rows = stmt.query_map([user_id], |row| {
            Ok((
                ClassRow {
                    id: row.get(0)?,
                    class_name: row.get(1)?,
                    class_number: row.get(2)?,
                    description: row.get(3)?,
                },
                row.get::<_, String>(4)?,
            ))
        })?;
        let mut memberships = Vec::new();
        for row in rows {
            let (class, role) = row?;
            let role_in_class = parse_stored_role(&role)?;
            memberships.push(ClassWithRole {
                class,
                role_in_class,
            });
        }
        Ok(memberships)
    }

    pub fn create_membership(&self, user_id: i64, class_id: i64, role: Role) -> Fallible<()> {
        self.conn.execute(
            "INSERT INTO class_members (user_id, class_id, role_in_class) VALUES (?1, ?2, ?3)",
            params![user_id, class_id, role.as_str()],
        )?;
        Ok(())
    }

    /// Get-or-create membership. The role only applies on first creation: an
    /// existing row keeps whatever role it already has.
    pub fn ensure_membership(&self, user_id: i64, class_id: i64, role: Role) -> Fallible<()> {
        self.conn.execute(
            "INSERT INTO class_members (user_id, class_id, role_in_class) VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id, class_id) DO NOTHING",
            params![user_id, class_id, role.as_str()],
        )?;
        Ok(())
    }

    pub fn membership_count(&self, class_id: i64) -> Fallible<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM class_members WHERE class_id = ?1",
            [class_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    //
    // Flashcard sets
    //

    pub fn set_by_id(&self, set_id: i64) -> Fallible<Option<SetRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, class_id, creator_id, name, description, created_at
                 FROM flashcard_sets WHERE id = ?1",
                [set_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Option<i64>>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;
        match row {
            Some((id, class_id, creator_id, name, description, created_at)) => Ok(Some(SetRow {
                id,
                class_id,
                creator_id,
                name,
                description,
                created_at: Timestamp::try_from(created_at)?,
            })),
            None => Ok(None),
        }
    }

    pub fn sets_by_creator(&self, user_id: i64) -> Fallible<Vec<SetRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, class_id, creator_id, name, description, created_at
             FROM flashcard_sets WHERE creator_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([user_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<i64>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;
        let mut sets = Vec::new();
        for row in rows {
            let (id, class_id, creator_id, name, description, created_at) = row?;
            sets.push(SetRow {
                id,
                class_id,
                creator_id,
                name,
                description,
                created_at: Timestamp::try_from(created_at)?,
            });
        }
        Ok(sets)
    }

    /// Creates a set under an explicitly chosen class.
    pub fn create_set(
        &self,
        class_id: i64,
        creator_id: i64,
        name: &str,
        description: &str,
        now: Timestamp,
    ) -> Fallible<i64> {
        self.conn.execute(
            "INSERT INTO flashcard_sets (class_id, creator_id, name, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![class_id, creator_id, name, description, now.to_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Creates a set under the user's default class, provisioning the class
    /// if it does not exist yet. Runs in one transaction.
    pub fn create_set_in_default_class(
        &mut self,
        user_id: i64,
        username: &str,
        name: &str,
        description: &str,
        now: Timestamp,
    ) -> Fallible<i64> {
        let tx = self.conn.transaction()?;
        let class_id = find_or_create_default_class(&tx, username)?;
        tx.execute(
            "INSERT INTO flashcard_sets (class_id, creator_id, name, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![class_id, user_id, name, description, now.to_string()],
        )?;
        let set_id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(set_id)
    }

    //
    // Flashcards
    //

    pub fn flashcard_exists(&self, flashcard_id: i64) -> Fallible<bool> {
        let id: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM flashcards WHERE id = ?1",
                [flashcard_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.is_some())
    }

    pub fn cards_by_creator(&self, user_id: i64) -> Fallible<Vec<CardRow>> {
        self.query_cards(
            "SELECT id, class_id, set_id, creator_id, front_text, back_text
             FROM flashcards WHERE creator_id = ?1 ORDER BY id",
            user_id,
        )
    }

    pub fn cards_in_set(&self, set_id: i64) -> Fallible<Vec<CardRow>> {
        self.query_cards(
            "SELECT id, class_id, set_id, creator_id, front_text, back_text
             FROM flashcards WHERE set_id = ?1 ORDER BY id",
            set_id,
        )
    }

    fn query_cards(&self, sql: &str, key: i64) -> Fallible<Vec<CardRow>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([key], |row| {
            Ok(CardRow {
                id: row.get(0)?,
                class_id: row.get(1)?,
                set_id: row.get(2)?,
                creator_id: row.get(3)?,
                front_text: row.get(4)?,
                back_text: row.get(5)?,
            })
        })?;
        let mut cards = Vec::new();
        for row in rows {
            cards.push(row?);
        }
        Ok(cards)
    }

    /// Creates a flashcard under an explicitly chosen set. The card inherits
    /// the set's class.
    pub fn create_card_in_set(
        &self,
        set: &SetRow,
        creator_id: i64,
        front_text: &str,
        back_text: &str,
    ) -> Fallible<i64> {
        self.conn.execute(
            "INSERT INTO flashcards (class_id, set_id, creator_id, front_text, back_text)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![set.class_id, set.id, creator_id, front_text, back_text],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Creates a flashcard with no explicit set: finds or creates the user's
    /// default class, then the default set within it, then inserts the card.
    /// The whole sequence is one transaction, so two concurrent requests for
    /// the same new user cannot provision duplicate buckets.
    pub fn create_card_in_default_set(
        &mut self,
        user_id: i64,
        username: &str,
        front_text: &str,
        back_text: &str,
        now: Timestamp,
    ) -> Fallible<i64> {
        let tx = self.conn.transaction()?;
        let class_id = find_or_create_default_class(&tx, username)?;
        let set_id = find_or_create_default_set(&tx, class_id, user_id, username, now)?;
        tx.execute(
            "INSERT INTO flashcards (class_id, set_id, creator_id, front_text, back_text)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![class_id, set_id, user_id, front_text, back_text],
        )?;
        let card_id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(card_id)
    }

    //
    // Leaderboard and study time
    //

    /// Upserts a leaderboard entry, keyed on (flashcard, user). Returns the
    /// stored score.
    pub fn record_score(
        &self,
        flashcard_id: i64,
        user_id: i64,
        score: i64,
        now: Timestamp,
    ) -> Fallible<i64> {
        let stored = self.conn.query_row(
            "INSERT INTO flashcard_leaderboard (flashcard_id, user_id, score, last_updated)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (flashcard_id, user_id) DO UPDATE
                 SET score = excluded.score, last_updated = excluded.last_updated
             RETURNING score",
            params![flashcard_id, user_id, score, now.to_string()],
            |row| row.get(0),
        )?;
        Ok(stored)
    }

    pub fn leaderboard(&self, flashcard_id: i64) -> Fallible<Vec<ScoreRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT u.username, l.score
             FROM flashcard_leaderboard l JOIN users u ON u.id = l.user_id
             WHERE l.flashcard_id = ?1
             ORDER BY l.score DESC, u.username",
        )?;
        let rows = stmt.query_map([flashcard_id], |row| {
            Ok(ScoreRow {
                username: row.get(0)?,
                score: row.get(1)?,
            })
        })?;
        let mut scores = Vec::new();
        for row in rows {
            scores.push(row?);
        }
        Ok(scores)
    }

    /// Adds to the accumulated study time for (flashcard, user). Returns the
    /// new total in seconds.
    pub fn add_study_time(
        &self,
        flashcard_id: i64,
        user_id: i64,
        seconds: i64,
        now: Timestamp,
    ) -> Fallible<i64> {
        let total = self.conn.query_row(
            "INSERT INTO flashcard_study_time (flashcard_id, user_id, time_spent, last_studied)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (flashcard_id, user_id) DO UPDATE
                 SET time_spent = time_spent + excluded.time_spent,
                     last_studied = excluded.last_studied
             RETURNING time_spent",
            params![flashcard_id, user_id, seconds, now.to_string()],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    //
    // Message boards
    //

    /// Appends a message to the class's board, provisioning the board if the
    /// class does not have one yet. One transaction; the UNIQUE constraint on
    /// class_id keeps the board one-per-class.
    pub fn post_message(
        &mut self,
        class_id: i64,
        user_id: i64,
        message_text: &str,
        now: Timestamp,
    ) -> Fallible<i64> {
        let tx = self.conn.transaction()?;
        let board_id: Option<i64> = tx
            .query_row(
                "SELECT id FROM message_boards WHERE class_id = ?1",
                [class_id],
                |row| row.get(0),
            )
            .optional()?;
        let board_id = match board_id {
            Some(id) => id,
            None => {
                tx.execute(
                    "INSERT INTO message_boards (class_id) VALUES (?1)",
                    [class_id],
                )?;
                tx.last_insert_rowid()
            }
        };
        tx.execute(
            "INSERT INTO messages (board_id, user_id, message_text, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![board_id, user_id, message_text, now.to_string()],
        )?;
        let message_id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(message_id)
    }

    /// Messages on a class's board, oldest first. A class whose board was
    /// never provisioned simply has no messages.
    pub fn messages_for_class(&self, class_id: i64) -> Fallible<Vec<MessageRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.id, u.username, m.message_text, m.timestamp
             FROM messages m
             JOIN message_boards b ON b.id = m.board_id
             JOIN users u ON u.id = m.user_id
             WHERE b.class_id = ?1
             ORDER BY m.id",
        )?;
        let rows = stmt.query_map([class_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        let mut messages = Vec::new();
        for row in rows {
            let (id, username, message_text, timestamp) = row?;
            messages.push(MessageRow {
                id,
                username,
                message_text,
                timestamp: Timestamp::try_from(timestamp)?,
            });
        }
        Ok(messages)
    }
}

/// The deterministic name of a user's auto-provisioned class.
pub fn default_class_name(username: &str) -> String {
    format!("{username}'s Flashcards")
}

/// The deterministic key of a user's auto-provisioned class.
pub fn default_class_number(username: &str) -> String {
    format!("DEFAULT-{username}")
}

/// The deterministic name of the set inside a user's auto-provisioned class.
pub fn default_set_name(username: &str) -> String {
    format!("{username}'s Default Set")
}

fn find_or_create_default_class(conn: &Connection, username: &str) -> Fallible<i64> {
    let class_number = default_class_number(username);
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM classes WHERE class_number = ?1",
            [&class_number],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }
    conn.execute(
        "INSERT INTO classes (class_name, class_number, description) VALUES (?1, ?2, ?3)",
        params![
            default_class_name(username),
            class_number,
            "Default flashcard collection"
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn find_or_create_default_set(
    conn: &Connection,
    class_id: i64,
    user_id: i64,
    username: &str,
    now: Timestamp,
) -> Fallible<i64> {
    let name = default_set_name(username);
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM flashcard_sets WHERE class_id = ?1 AND name = ?2",
            params![class_id, name],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }
    conn.execute(
        "INSERT INTO flashcard_sets (class_id, creator_id, name, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![class_id, user_id, name, "", now.to_string()],
    )?;
    Ok(conn.last_insert_rowid())
}

fn parse_stored_role(role: &str) -> Fallible<Role> {
    Role::parse(role).ok_or_else(|| {
        ErrorReport::new(
            ErrorKind::Internal,
            format!("Unknown role in database: '{role}'."),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> Timestamp {
        Timestamp::try_from("2025-01-15T09:00:00.000".to_string()).unwrap()
    }

    fn user(db: &Database, username: &str) -> i64 {
        db.create_user(
            username,
            &format!("{username}@example.com"),
            "$argon2id$fake",
            ts(),
        )
        .unwrap()
    }

    #[test]
    fn test_username_unique() -> Fallible<()> {
        let db = Database::open_in_memory()?;
        user(&db, "alice");
        let dup = db.create_user("alice", "other@example.com", "$argon2id$fake", ts());
        assert!(dup.is_err());
        Ok(())
    }

    #[test]
    fn test_email_unique() -> Fallible<()> {
        let db = Database::open_in_memory()?;
        user(&db, "alice");
        assert!(db.email_exists("alice@example.com")?);
        assert!(!db.email_exists("bob@example.com")?);
        let dup = db.create_user("bob", "alice@example.com", "$argon2id$fake", ts());
        assert!(dup.is_err());
        Ok(())
    }

    #[test]
    fn test_user_lookup() -> Fallible<()> {
        let db = Database::open_in_memory()?;
        user(&db, "alice");
        let found = db.user_by_username("alice")?.unwrap();
        assert_eq!(found.username, "alice");
        assert_eq!(found.email, "alice@example.com");
        assert!(db.user_by_username("bob")?.is_none());
        Ok(())
    }

    #[test]
    fn test_membership_get_or_create() -> Fallible<()> {
        let db = Database::open_in_memory()?;
        let user_id = user(&db, "alice");
        let class_id = db.create_class("Biology", "BIO-101", "Intro")?;
        db.ensure_membership(user_id, class_id, Role::Student)?;
        // Second call is a no-op: the role does not change.
        db.ensure_membership(user_id, class_id, Role::Leader)?;
        assert_eq!(db.membership_count(class_id)?, 1);
        let memberships = db.classes_for_user(user_id)?;
        assert_eq!(memberships.len(), 1);
        assert_eq!(memberships[0].role_in_class, Role::Student);
        assert_eq!(memberships[0].class.class_number, "BIO-101");
        Ok(())
    }

    #[test]
    fn test_classes_for_user_empty() -> Fallible<()> {
        let db = Database::open_in_memory()?;
        let user_id = user(&db, "alice");
        assert!(db.classes_for_user(user_id)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_default_bucket_idempotent() -> Fallible<()> {
        let mut db = Database::open_in_memory()?;
        let user_id = user(&db, "alice");
        let card1 = db.create_card_in_default_set(user_id, "alice", "Q1", "A1", ts())?;
        let card2 = db.create_card_in_default_set(user_id, "alice", "Q2", "A2", ts())?;
        assert_ne!(card1, card2);
        // Exactly one class and one set were provisioned.
        assert_eq!(db.all_classes()?.len(), 1);
        let sets = db.sets_by_creator(user_id)?;
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].name, "alice's Default Set");
        // Both cards landed in the same set.
        let cards = db.cards_in_set(sets[0].id)?;
        assert_eq!(cards.len(), 2);
        Ok(())
    }

    #[test]
    fn test_default_buckets_distinct_per_user() -> Fallible<()> {
        let mut db = Database::open_in_memory()?;
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        db.create_card_in_default_set(alice, "alice", "Q", "A", ts())?;
        db.create_card_in_default_set(bob, "bob", "Q", "A", ts())?;
        assert_eq!(db.all_classes()?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_default_class_shared_by_set_and_card_provisioning() -> Fallible<()> {
        let mut db = Database::open_in_memory()?;
        let user_id = user(&db, "alice");
        db.create_set_in_default_class(user_id, "alice", "Midterms", "", ts())?;
        db.create_card_in_default_set(user_id, "alice", "Q", "A", ts())?;
        // Both paths resolve the same default class.
        assert_eq!(db.all_classes()?.len(), 1);
        assert_eq!(db.sets_by_creator(user_id)?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_class_delete_cascades() -> Fallible<()> {
        let mut db = Database::open_in_memory()?;
        let user_id = user(&db, "alice");
        db.create_card_in_default_set(user_id, "alice", "Q", "A", ts())?;
        let class = &db.all_classes()?[0];
        db.delete_class(class.id)?;
        assert!(db.sets_by_creator(user_id)?.is_empty());
        assert!(db.cards_by_creator(user_id)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_user_delete_nulls_creator() -> Fallible<()> {
        let mut db = Database::open_in_memory()?;
        let user_id = user(&db, "alice");
        db.create_card_in_default_set(user_id, "alice", "Q", "A", ts())?;
        let sets = db.sets_by_creator(user_id)?;
        db.delete_user(user_id)?;
        // The card survives with its creator reference cleared.
        let cards = db.cards_in_set(sets[0].id)?;
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].creator_id, None);
        Ok(())
    }

    #[test]
    fn test_card_inherits_class_from_set() -> Fallible<()> {
        let db = Database::open_in_memory()?;
        let user_id = user(&db, "alice");
        let class_id = db.create_class("Biology", "BIO-101", "")?;
        let set_id = db.create_set(class_id, user_id, "Cell structure", "", ts())?;
        let set = db.set_by_id(set_id)?.unwrap();
        db.create_card_in_set(&set, user_id, "Q", "A")?;
        let cards = db.cards_in_set(set_id)?;
        assert_eq!(cards[0].class_id, class_id);
        assert_eq!(cards[0].set_id, Some(set_id));
        Ok(())
    }

    #[test]
    fn test_score_upsert() -> Fallible<()> {
        let mut db = Database::open_in_memory()?;
        let user_id = user(&db, "alice");
        let card_id = db.create_card_in_default_set(user_id, "alice", "Q", "A", ts())?;
        assert_eq!(db.record_score(card_id, user_id, 10, ts())?, 10);
        assert_eq!(db.record_score(card_id, user_id, 25, ts())?, 25);
        let scores = db.leaderboard(card_id)?;
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].score, 25);
        Ok(())
    }

    #[test]
    fn test_leaderboard_order() -> Fallible<()> {
        let mut db = Database::open_in_memory()?;
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let card_id = db.create_card_in_default_set(alice, "alice", "Q", "A", ts())?;
        db.record_score(card_id, alice, 10, ts())?;
        db.record_score(card_id, bob, 40, ts())?;
        let scores = db.leaderboard(card_id)?;
        assert_eq!(scores[0].username, "bob");
        assert_eq!(scores[1].username, "alice");
        Ok(())
    }

    #[test]
    fn test_study_time_accumulates() -> Fallible<()> {
        let mut db = Database::open_in_memory()?;
        let user_id = user(&db, "alice");
        let card_id = db.create_card_in_default_set(user_id, "alice", "Q", "A", ts())?;
        assert_eq!(db.add_study_time(card_id, user_id, 30, ts())?, 30);
        assert_eq!(db.add_study_time(card_id, user_id, 45, ts())?, 75);
        Ok(())
    }

    #[test]
    fn test_message_board_one_per_class() -> Fallible<()> {
        let mut db = Database::open_in_memory()?;
        let user_id = user(&db, "alice");
        let class_id = db.create_class("Biology", "BIO-101", "")?;
        db.post_message(class_id, user_id, "first", ts())?;
        db.post_message(class_id, user_id, "second", ts())?;
        let messages = db.messages_for_class(class_id)?;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].message_text, "first");
        assert_eq!(messages[1].message_text, "second");
        assert_eq!(messages[0].username, "alice");
        Ok(())
    }

    #[test]
    fn test_messages_empty_without_board() -> Fallible<()> {
        let db = Database::open_in_memory()?;
        let class_id = db.create_class("Biology", "BIO-101", "")?;
        assert!(db.messages_for_class(class_id)?.is_empty());
        Ok(())
    }
}
