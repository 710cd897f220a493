//! Password hashing.
//!
//! Hashes are PBKDF2-HMAC-SHA256 PHC strings
//! (`$pbkdf2-sha256$i=<rounds>,l=32$<salt>$<hash>`), so the round count
//! travels with each stored hash and can be raised without breaking
//! existing accounts.

use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::{Params, Pbkdf2};

use crate::error::{StoreError, StoreResult};

/// Default PBKDF2 iteration count.
pub const DEFAULT_HASH_ROUNDS: u32 = 600_000;

const HASH_LENGTH: usize = 32;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str, rounds: u32) -> StoreResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let params = Params {
        rounds,
        output_length: HASH_LENGTH,
    };

    Pbkdf2
        .hash_password_customized(password.as_bytes(), None, None, params, &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::hash_failed(e.to_string()))
}

/// Check `password` against a stored PHC hash. Malformed hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Pbkdf2.verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}
