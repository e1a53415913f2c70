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

//! Credential policy and storage format. Plaintext passwords exist only as
//! transient arguments here; only the argon2 hash string is ever stored.

use argon2::Argon2;
use argon2::PasswordHasher;
use argon2::PasswordVerifier;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;

use crate::error::Fallible;
use crate::error::fail;
use crate::error::invalid;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum length of a user attribute before it participates in the
/// similarity check. Short usernames would otherwise reject too much.
const MIN_ATTRIBUTE_LENGTH: usize = 4;

/// Checks a candidate password against the strength policy: minimum length,
/// not purely numeric, and not too similar to the username or email.
pub fn check_strength(password: &str, username: &str, email: &str) -> Fallible<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return invalid(format!(
            "This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
        ));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return invalid("This password is entirely numeric.");
    }
    if too_similar(password, username) {
        return invalid("The password is too similar to the username.");
    }
    // Only the local part of the email matters; everyone shares the domain.
    let local_part = email.split('@').next().unwrap_or(email);
    if too_similar(password, local_part) {
        return invalid("The password is too similar to the email address.");
    }
    Ok(())
}

fn too_similar(password: &str, attribute: &str) -> bool {
    if attribute.chars().count() < MIN_ATTRIBUTE_LENGTH {
        return false;
    }
    let password = password.to_lowercase();
    let attribute = attribute.to_lowercase();
    password.contains(&attribute) || attribute.contains(&password)
}

/// Hashes a password with argon2 and a fresh random salt.
pub fn hash_password(password: &str) -> Fallible<String> {
    let salt = SaltString::generate(&mut OsRng);
    match Argon2::default().hash_password(password.as_bytes(), &salt) {
        Ok(hash) => Ok(hash.to_string()),
        Err(e) => fail(format!("Password hashing failed: {e}")),
    }
}

/// Verifies a password against a stored hash. An unparseable hash counts as
/// a mismatch rather than an error.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_too_short() {
        let err = check_strength("abc1", "alice", "a@x.com").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_entirely_numeric() {
        let err = check_strength("1234567890", "alice", "a@x.com").unwrap_err();
        assert_eq!(
            err.message(),
            "This password is entirely numeric."
        );
    }

    #[test]
    fn test_similar_to_username() {
        let err = check_strength("xXalice99", "alice", "a@x.com").unwrap_err();
        assert_eq!(err.message(), "The password is too similar to the username.");
    }

    #[test]
    fn test_similar_to_email() {
        let err = check_strength("alice.smith1", "zorp", "alice.smith@x.com").unwrap_err();
        assert_eq!(
            err.message(),
            "The password is too similar to the email address."
        );
    }

    #[test]
    fn test_short_username_not_checked() {
        // Three-character attributes are below the similarity threshold.
        assert!(check_strength("abcdefgh", "abc", "abc@x.com").is_ok());
    }

    #[test]
    fn test_good_password() {
        assert!(check_strength("Str0ng!Pass", "alice", "a@x.com").is_ok());
    }

    #[test]
    fn test_hash_and_verify() -> Fallible<()> {
        let hash = hash_password("Str0ng!Pass")?;
        assert_ne!(hash, "Str0ng!Pass");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Str0ng!Pass", &hash));
        assert!(!verify_password("wrong", &hash));
        Ok(())
    }

    #[test]
    fn test_verify_garbage_hash() {
        assert!(!verify_password("anything", "not-a-hash"));
    }

    #[test]
    fn test_distinct_salts() -> Fallible<()> {
        let a = hash_password("Str0ng!Pass")?;
        let b = hash_password("Str0ng!Pass")?;
        assert_ne!(a, b);
        Ok(())
    }
}
