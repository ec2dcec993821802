//! Validated registration inputs.

use std::fmt;

use thiserror::Error;

use crate::error::ImageShareError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Username must be between 3 and 30 characters.")]
    UsernameLength,
    #[error("Username may only contain letters, digits and underscores.")]
    UsernameCharacters,
    #[error("Username cannot start or end with an underscore or contain '__'.")]
    UsernameFormat,
    #[error("Invalid email address.")]
    Email,
    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters.")]
    PasswordTooShort,
    #[error("Passwords do not match.")]
    PasswordMismatch,
}

impl From<CredentialError> for ImageShareError {
    fn from(err: CredentialError) -> Self {
        ImageShareError::Validation(err.to_string())
    }
}

/// Lowercased account name, 3-30 chars of `[a-z0-9_]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, CredentialError> {
        let name = raw.as_ref().trim().to_lowercase();
        let len = name.chars().count();

        if !(3..=30).contains(&len) {
            return Err(CredentialError::UsernameLength);
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(CredentialError::UsernameCharacters);
        }
        if name.starts_with('_') || name.ends_with('_') || name.contains("__") {
            return Err(CredentialError::UsernameFormat);
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trimmed, lowercased address with a plausible `local@domain.tld` shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, CredentialError> {
        let email = raw.as_ref().trim().to_lowercase();
        let Some((local, domain)) = email.split_once('@') else {
            return Err(CredentialError::Email);
        };

        let domain_ok = domain
            .split('.')
            .all(|label| !label.is_empty())
            && domain.contains('.');
        if local.is_empty()
            || !domain_ok
            || email.len() > 180
            || email.chars().any(char::is_whitespace)
        {
            return Err(CredentialError::Email);
        }

        Ok(Self(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Plaintext password that passed the length rule.
pub struct Password<'a>(&'a str);

impl<'a> Password<'a> {
    pub fn parse(raw: &'a str) -> Result<Self, CredentialError> {
        if raw.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(CredentialError::PasswordTooShort);
        }
        Ok(Self(raw))
    }

    pub fn confirmed(raw: &'a str, confirmation: &str) -> Result<Self, CredentialError> {
        let password = Self::parse(raw)?;
        if raw != confirmation {
            return Err(CredentialError::PasswordMismatch);
        }
        Ok(password)
    }

    pub fn expose(&self) -> &'a str {
        self.0
    }
}

impl fmt::Debug for Password<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}
