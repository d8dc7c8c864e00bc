// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Public identifiers and secret tokens.
//!
//! Public ids are short and drawn uniformly from the 62 ASCII alphanumerics.
//! Uniqueness is not decided here: the post store checks candidates against
//! existing rows and its UNIQUE constraint is the final word.
//! Edit and CSRF tokens are 32 bytes from the OS RNG, hex-encoded.

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};

/// Length of a public post identifier.
pub const PUBLIC_ID_LEN: usize = 8;

/// Number of random bytes in an edit or CSRF token.
pub const TOKEN_BYTES: usize = 32;

/// Upper bound on identifier draws per insert before giving up.
pub const MAX_ID_ATTEMPTS: usize = 8;

/// Draw a candidate public id of `len` alphanumeric characters.
pub fn new_public_id(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// A fresh 64-character hex secret.
pub fn new_secret_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Whether `id` has the shape of a public id.
pub fn is_public_id(id: &str) -> bool {
    id.len() == PUBLIC_ID_LEN && id.bytes().all(|b| b.is_ascii_alphanumeric())
}
