// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential hashing with PBKDF2-HMAC-SHA256.
//!
//! Encoded form: `pbkdf2-sha256$<iterations>$<salt>$<hash>` with salt and
//! hash in unpadded URL-safe base64.

use std::num::NonZeroU32;

use base64ct::{Base64UrlUnpadded, Encoding};
use ring::{
    pbkdf2,
    rand::{SecureRandom, SystemRandom},
};

use super::error::AuthError;

const SCHEME: &str = "pbkdf2-sha256";
const ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let iterations = NonZeroU32::new(ITERATIONS)
        .ok_or_else(|| AuthError::InternalError("zero pbkdf2 iterations".into()))?;

    let mut salt = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| AuthError::InternalError("system randomness unavailable".into()))?;

    let mut hash = [0u8; HASH_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        &salt,
        password.as_bytes(),
        &mut hash,
    );

    Ok(format!(
        "{SCHEME}${ITERATIONS}${}${}",
        Base64UrlUnpadded::encode_string(&salt),
        Base64UrlUnpadded::encode_string(&hash)
    ))
}

/// Check a password against an encoded hash. Malformed hashes never match.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.split('$');
    let (Some(SCHEME), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };

    let Some(iterations) = iterations.parse::<u32>().ok().and_then(NonZeroU32::new) else {
        return false;
    };
    let (Ok(salt), Ok(hash)) = (
        Base64UrlUnpadded::decode_vec(salt),
        Base64UrlUnpadded::decode_vec(hash),
    ) else {
        return false;
    };

    pbkdf2::verify(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        &salt,
        password.as_bytes(),
        &hash,
    )
    .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_verifies() {
        let encoded = hash_password("correct horse").unwrap();
        assert!(encoded.starts_with("pbkdf2-sha256$100000$"));
        assert!(verify_password("correct horse", &encoded));
        assert!(!verify_password("battery staple", &encoded));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hashes_never_match() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "bcrypt$10$abc$def"));
        assert!(!verify_password("x", "pbkdf2-sha256$0$AAAA$AAAA"));
        assert!(!verify_password("x", "pbkdf2-sha256$1000$!!!$AAAA"));
    }
}
