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

//! classcards-core: Core library for the classcards classroom flashcard app.
//!
//! This library provides the pure, I/O-free pieces shared by the server:
//! - The error taxonomy mapped to HTTP statuses by the API layer
//! - Class membership roles
//! - The credential strength policy and argon2 hashing
//! - Timestamps with a stable string form

pub mod error;
pub mod password;
pub mod types;

// Re-exports for convenience
pub use error::{ErrorKind, ErrorReport, Fallible, fail, invalid, not_found, unauthorized};
pub use password::{check_strength, hash_password, verify_password};
pub use types::role::Role;
pub use types::timestamp::Timestamp;
