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

use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorKind;
use crate::error::ErrorReport;

/// A user's role within a class. The set is closed: unrecognized role
/// strings are rejected at the boundary rather than stored.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    Leader,
    Student,
    /// Teaching assistant.
    Ta,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Leader => "Leader",
            Role::Student => "Student",
            Role::Ta => "TA",
        }
    }

    /// Parses a role string. Returns `None` for anything outside the
    /// recognized set.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "Leader" => Some(Role::Leader),
            "Student" => Some(Role::Student),
            "TA" => Some(Role::Ta),
            _ => None,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for Role {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Role::parse(&value).ok_or_else(|| {
            ErrorReport::new(ErrorKind::Validation, format!("Unknown role: '{value}'."))
        })
    }
}

impl From<Role> for String {
    fn from(role: Role) -> String {
        role.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for role in [Role::Leader, Role::Student, Role::Ta] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Role::parse("Janitor"), None);
        assert_eq!(Role::parse("leader"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn test_serialize() {
        let serialized = serde_json::to_string(&Role::Ta).unwrap();
        assert_eq!(serialized, "\"TA\"");
    }

    #[test]
    fn test_deserialize() {
        let role: Role = serde_json::from_str("\"Student\"").unwrap();
        assert_eq!(role, Role::Student);
        assert!(serde_json::from_str::<Role>("\"Pupil\"").is_err());
    }
}
