//! Credential primitives: hashing, opaque tokens and input validation.

pub mod credentials;
pub mod crypto;

pub use credentials::{EmailAddress, Password, Username, CredentialError};
pub use crypto::{AuthCrypto, AuthCryptoError, generate_token};
