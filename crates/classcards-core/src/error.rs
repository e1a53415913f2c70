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

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;

/// Classifies an error so the API layer can map it to an HTTP status.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    /// A required field is missing or malformed.
    Validation,
    /// A referenced user, class, set, or card does not exist.
    NotFound,
    /// Credentials do not match.
    Auth,
    /// An unexpected store or runtime failure.
    Internal,
}

#[derive(Debug, PartialEq)]
pub struct ErrorReport {
    kind: ErrorKind,
    message: String,
}

impl ErrorReport {
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        ErrorReport {
            kind,
            message: msg.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The bare message, without the `error:` prefix.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for ErrorReport {
    fn from(value: std::io::Error) -> Self {
        ErrorReport {
            kind: ErrorKind::Internal,
            message: format!("I/O error: {value}"),
        }
    }
}

impl From<serde_json::Error> for ErrorReport {
    fn from(value: serde_json::Error) -> Self {
        ErrorReport {
            kind: ErrorKind::Internal,
            message: format!("JSON error: {value}"),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for ErrorReport {
    fn from(value: rusqlite::Error) -> Self {
        ErrorReport {
            kind: ErrorKind::Internal,
            message: format!("SQL error: {value}"),
        }
    }
}

impl Display for ErrorReport {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "error: {}", self.message)
    }
}

impl Error for ErrorReport {
    fn description(&self) -> &str {
        &self.message
    }
}

pub type Fallible<T> = Result<T, ErrorReport>;

/// An internal failure.
pub fn fail<T>(msg: impl Into<String>) -> Fallible<T> {
    Err(ErrorReport::new(ErrorKind::Internal, msg))
}

/// A missing or malformed request field.
pub fn invalid<T>(msg: impl Into<String>) -> Fallible<T> {
    Err(ErrorReport::new(ErrorKind::Validation, msg))
}

/// A referenced entity that does not exist.
pub fn not_found<T>(msg: impl Into<String>) -> Fallible<T> {
    Err(ErrorReport::new(ErrorKind::NotFound, msg))
}

/// A credential mismatch.
pub fn unauthorized<T>(msg: impl Into<String>) -> Fallible<T> {
    Err(ErrorReport::new(ErrorKind::Auth, msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ErrorReport::new(ErrorKind::NotFound, "User not found");
        assert_eq!(err.to_string(), "error: User not found");
        assert_eq!(err.message(), "User not found");
    }

    #[test]
    fn test_helpers() {
        let err = invalid::<()>("Username is required").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = not_found::<()>("Class not found").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = unauthorized::<()>("Invalid username or password").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
        let err = fail::<()>("boom").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ErrorReport::from(io);
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
