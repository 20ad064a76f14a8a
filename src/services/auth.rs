//! Password hashing for registered users (Argon2 encoded strings)

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, argon2::Error> {
    let salt: [u8; 16] = rand::random();
    argon2::hash_encoded(password.as_bytes(), &salt, &argon2::Config::default())
}

/// Check a password against an encoded hash; malformed hashes never match
pub fn verify_password(encoded: &str, password: &str) -> bool {
    argon2::verify_encoded(encoded, password.as_bytes()).unwrap_or(false)
}
