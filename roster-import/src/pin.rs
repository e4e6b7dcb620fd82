//! PIN hashing with Argon2id.

use anyhow::Result;
use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHasher as _};

/// Hash a plaintext PIN into a PHC-formatted Argon2id string.
///
/// Every call salts with fresh randomness, so hashing the same PIN twice
/// yields two different strings. The plaintext is never logged or stored.
pub fn hash_pin(pin: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(pin.as_bytes(), &salt)
        .map_err(|err| anyhow::anyhow!("Failed to hash PIN: {}", err))?;
    Ok(hash.to_string())
}
