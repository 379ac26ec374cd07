//! Password credential hashing and verification.
//!
//! Current hashes are PBKDF2-HMAC-SHA256 strings of the form
//! `<iterations>$<salt_hex>$<derived_key_hex>`. Hashes without the `$`
//! separator are legacy bare SHA-256 hex digests, accepted only while
//! legacy support is enabled so that old accounts can be upgraded on login.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{debug, warn};

/// Default PBKDF2 iteration count for new hashes.
pub const DEFAULT_ITERATIONS: u32 = 600_000;

/// Lowest iteration count accepted when deriving a new hash.
pub const MIN_ITERATIONS: u32 = 100_000;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Derived key length in bytes.
pub const KEY_LEN: usize = 32;

/// Separator between the fields of a versioned hash.
pub const SEPARATOR: char = '$';

/// Credential derivation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The password or iteration count was rejected.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Storage format of a hash string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashFormat {
    /// Versioned PBKDF2-HMAC-SHA256 hash.
    Pbkdf2 {
        /// Iteration count embedded in the hash.
        iterations: u32,
    },
    /// Bare SHA-256 hex digest.
    LegacySha256,
    /// Anything else.
    Unknown,
}

/// Derives and verifies password hashes.
///
/// Holds no secrets; a single instance can be shared freely between threads.
#[derive(Debug, Clone, Copy)]
pub struct CredentialManager {
    allow_legacy: bool,
}

impl Default for CredentialManager {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CredentialManager {
    /// Create a manager. `allow_legacy` controls whether bare SHA-256
    /// digests can still authenticate.
    pub fn new(allow_legacy: bool) -> Self {
        Self { allow_legacy }
    }

    /// Whether legacy SHA-256 digests are accepted by [`verify`](Self::verify).
    pub fn allows_legacy(&self) -> bool {
        self.allow_legacy
    }

    /// Derive a hash with [`DEFAULT_ITERATIONS`].
    pub fn derive_default(&self, password: &str) -> Result<String, CredentialError> {
        self.derive(password, DEFAULT_ITERATIONS)
    }

    /// Derive a storable hash from a plaintext password.
    ///
    /// Every call draws a fresh 16-byte salt, so hashing the same password
    /// twice yields different strings.
    ///
    /// # Examples
    ///
    /// ```
    /// use vetagenda::CredentialManager;
    ///
    /// let manager = CredentialManager::default();
    /// let hash = manager.derive("senha123", 100_000).unwrap();
    /// assert!(hash.starts_with("100000$"));
    /// assert!(manager.verify(&hash, "senha123"));
    /// ```
    pub fn derive(&self, password: &str, iterations: u32) -> Result<String, CredentialError> {
        if password.trim().is_empty() {
            return Err(CredentialError::InvalidInput(
                "password cannot be empty".to_string(),
            ));
        }
        if iterations < MIN_ITERATIONS {
            return Err(CredentialError::InvalidInput(format!(
                "iteration count {iterations} is below the minimum of {MIN_ITERATIONS}"
            )));
        }

        let mut salt = [0u8; SALT_LEN];
        rand::rng().fill_bytes(&mut salt);

        let key = derive_key(password, &salt, iterations);
        Ok(format!(
            "{iterations}{SEPARATOR}{}{SEPARATOR}{}",
            hex::encode(salt),
            hex::encode(key)
        ))
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// Total over its inputs: malformed hashes, empty strings and unknown
    /// formats all yield `false`.
    pub fn verify(&self, hash_value: &str, password: &str) -> bool {
        if hash_value.is_empty() || password.is_empty() {
            return false;
        }

        if !hash_value.contains(SEPARATOR) {
            if !self.allow_legacy {
                warn!("legacy credential rejected: legacy hashes are disabled");
                return false;
            }
            let digest = hex::encode(Sha256::digest(password.as_bytes()));
            return bool::from(digest.as_bytes().ct_eq(hash_value.as_bytes()));
        }

        let Some((iterations, salt, stored)) = parse_versioned(hash_value) else {
            debug!("malformed credential hash");
            return false;
        };

        let key = derive_key(password, &salt, iterations);
        bool::from(key.as_slice().ct_eq(stored.as_slice()))
    }

    /// Classify a stored hash without verifying anything.
    pub fn inspect(hash_value: &str) -> HashFormat {
        if hash_value.contains(SEPARATOR) {
            return match parse_versioned(hash_value) {
                Some((iterations, _, _)) => HashFormat::Pbkdf2 { iterations },
                None => HashFormat::Unknown,
            };
        }
        if hash_value.len() == 64 && hash_value.bytes().all(|b| b.is_ascii_hexdigit()) {
            HashFormat::LegacySha256
        } else {
            HashFormat::Unknown
        }
    }

    /// Whether a stored hash should be re-derived after a successful login.
    ///
    /// True for legacy digests and for PBKDF2 hashes weaker than `target_iterations`.
    pub fn needs_upgrade(hash_value: &str, target_iterations: u32) -> bool {
        match Self::inspect(hash_value) {
            HashFormat::Pbkdf2 { iterations } => iterations < target_iterations,
            HashFormat::LegacySha256 => true,
            HashFormat::Unknown => false,
        }
    }
}

/// Split a versioned hash into its iteration count, salt and derived key.
fn parse_versioned(hash_value: &str) -> Option<(u32, Vec<u8>, Vec<u8>)> {
    let mut parts = hash_value.split(SEPARATOR);
    let (iterations, salt, key) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let iterations: u32 = iterations.parse().ok()?;
    if iterations == 0 {
        return None;
    }
    let salt = hex::decode(salt).ok()?;
    let key = hex::decode(key).ok()?;
    Some((iterations, salt, key))
}

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}
