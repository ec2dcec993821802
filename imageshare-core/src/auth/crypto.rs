use std::fmt;

use argon2::{
    Algorithm, Argon2, Params, ParamsBuilder, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use hmac::{Hmac, Mac};
use password_hash::Error as PasswordHashError;
use rand::{TryRngCore, rngs::OsRng};
use sha2::Sha256;
use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

type TokenMac = Hmac<Sha256>;

/// Random bytes behind session, verification and reset tokens.
pub const TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum AuthCryptoError {
    #[error("password pepper must not be empty")]
    EmptyPasswordPepper,
    #[error("token HMAC key must not be empty")]
    EmptyTokenKey,
    #[error("invalid Argon2 parameters: {0}")]
    InvalidArgon2Params(String),
    #[error("password hashing error: {0}")]
    PasswordHash(String),
    #[error("random source unavailable: {0}")]
    Random(String),
}

impl From<PasswordHashError> for AuthCryptoError {
    fn from(err: PasswordHashError) -> Self {
        AuthCryptoError::PasswordHash(err.to_string())
    }
}

/// Argon2id cost settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashCost {
    /// 64 MiB, 3 passes
    Production,
    /// Smallest parameters Argon2 accepts; tests only
    Minimal,
}

impl HashCost {
    fn params(self) -> Result<Params, AuthCryptoError> {
        let mut builder = ParamsBuilder::new();
        match self {
            HashCost::Production => builder.m_cost(64 * 1024).t_cost(3).p_cost(1),
            HashCost::Minimal => builder.m_cost(Params::MIN_M_COST).t_cost(1).p_cost(1),
        };
        builder
            .output_len(32)
            .build()
            .map_err(|err| AuthCryptoError::InvalidArgon2Params(err.to_string()))
    }
}

/// Password hashing and token digests.
///
/// Passwords are hashed with Argon2id over `password || pepper`. Opaque
/// tokens are never stored; only their keyed HMAC-SHA-256 digest is.
pub struct AuthCrypto {
    argon2: Argon2<'static>,
    pepper: Zeroizing<Vec<u8>>,
    token_mac: TokenMac,
}

impl fmt::Debug for AuthCrypto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCrypto")
            .field("argon2", &self.argon2.params())
            .finish_non_exhaustive()
    }
}

impl AuthCrypto {
    pub fn new(
        password_pepper: impl AsRef<[u8]>,
        token_hmac_key: impl AsRef<[u8]>,
    ) -> Result<Self, AuthCryptoError> {
        Self::with_cost(password_pepper, token_hmac_key, HashCost::Production)
    }

    /// Cheap hashing for tests.
    pub fn insecure_fast(
        password_pepper: impl AsRef<[u8]>,
        token_hmac_key: impl AsRef<[u8]>,
    ) -> Result<Self, AuthCryptoError> {
        Self::with_cost(password_pepper, token_hmac_key, HashCost::Minimal)
    }

    pub fn with_cost(
        password_pepper: impl AsRef<[u8]>,
        token_hmac_key: impl AsRef<[u8]>,
        cost: HashCost,
    ) -> Result<Self, AuthCryptoError> {
        let pepper = password_pepper.as_ref();
        if pepper.is_empty() {
            return Err(AuthCryptoError::EmptyPasswordPepper);
        }
        let key = token_hmac_key.as_ref();
        if key.is_empty() {
            return Err(AuthCryptoError::EmptyTokenKey);
        }
        let token_mac =
            TokenMac::new_from_slice(key).map_err(|_| AuthCryptoError::EmptyTokenKey)?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, cost.params()?),
            pepper: Zeroizing::new(pepper.to_vec()),
            token_mac,
        })
    }

    fn with_pepper(&self, password: &str) -> Zeroizing<Vec<u8>> {
        let mut input = Zeroizing::new(Vec::with_capacity(password.len() + self.pepper.len()));
        input.extend_from_slice(password.as_bytes());
        input.extend_from_slice(&self.pepper);
        input
    }

    /// PHC string with a fresh random salt.
    pub fn hash_password(&self, password: &str) -> Result<String, AuthCryptoError> {
        let mut salt = [0u8; password_hash::Salt::RECOMMENDED_LENGTH];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|err| AuthCryptoError::Random(err.to_string()))?;
        let salt = SaltString::encode_b64(&salt)?;

        let input = self.with_pepper(password);
        Ok(self.argon2.hash_password(&input, &salt)?.to_string())
    }

    /// `Ok(false)` on mismatch; `Err` only when the stored hash is malformed.
    pub fn verify_password(&self, password: &str, stored: &str) -> Result<bool, AuthCryptoError> {
        let stored = PasswordHash::new(stored)?;
        let input = self.with_pepper(password);
        Ok(self.argon2.verify_password(&input, &stored).is_ok())
    }

    /// Hex digest under which a token is persisted and looked up.
    pub fn hash_token(&self, token: &str) -> String {
        let mut mac = self.token_mac.clone();
        mac.update(token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

/// A fresh opaque token, hex encoded.
pub fn generate_token() -> Result<String, AuthCryptoError> {
    let mut raw = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut raw)
        .map_err(|err| AuthCryptoError::Random(err.to_string()))?;
    let token = hex::encode(raw);
    raw.zeroize();
    Ok(token)
}
