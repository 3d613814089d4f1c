//! Account registration and credential verification.
//!
//! Passwords are hashed with argon2id and stored as PHC strings. Login
//! failures use one fixed message so clients cannot tell whether the email or
//! the password was wrong.

use std::sync::Arc;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::password_hash::rand_core::OsRng;
use argon2::Argon2;
use serde_json::json;
use zeroize::Zeroize;

use super::error::Error;
use super::ports::{PersistenceError, UserRepository};
use super::user::{Email, FullName, User, UserId, UserValidationError};
use chrono::Utc;

/// Fixed message for all login failures.
const INVALID_CREDENTIALS_MESSAGE: &str = "invalid email or password";

/// Raw sign-up input before validation.
#[derive(Debug, Clone)]
pub struct Registration {
    pub fullname: String,
    pub email: String,
    pub password: String,
}

/// Registration and login over a [`UserRepository`].
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Argon2<'static>,
}

impl AuthService {
    /// Build the service over a repository port.
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self {
            users,
            hasher: Argon2::default(),
        }
    }

    /// Register a new account and return it.
    ///
    /// # Errors
    /// - `InvalidRequest` when a field is empty or the email is malformed.
    /// - `Conflict` when the email is already registered.
    pub async fn register(&self, input: Registration) -> Result<User, Error> {
        let Registration {
            fullname,
            email,
            mut password,
        } = input;

        let fullname = FullName::new(&fullname).map_err(map_validation_error)?;
        let email = Email::new(&email).map_err(map_validation_error)?;
        if password.trim().is_empty() {
            return Err(map_validation_error(UserValidationError::EmptyPassword));
        }

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(Error::conflict("an account already exists for this email"));
        }

        let password_hash = self.hash_password(&password)?;
        password.zeroize();

        let user = User {
            id: UserId::random(),
            fullname,
            email,
            password_hash,
            created_at: Utc::now(),
        };

        match self.users.insert(&user).await {
            Ok(()) => Ok(user),
            // Concurrent sign-up with the same email loses the unique-index
            // race rather than the lookup above.
            Err(PersistenceError::Duplicate { .. }) => {
                Err(Error::conflict("an account already exists for this email"))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Verify credentials and return the matching account.
    ///
    /// # Errors
    /// `InvalidCredentials` with one fixed message, whether the email was
    /// unknown or the hash mismatched.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, Error> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(Error::invalid_request("email and password are required"));
        }

        let email = match Email::new(email) {
            Ok(email) => email,
            Err(_) => return Err(Error::invalid_credentials(INVALID_CREDENTIALS_MESSAGE)),
        };

        let Some(user) = self.users.find_by_email(&email).await? else {
            return Err(Error::invalid_credentials(INVALID_CREDENTIALS_MESSAGE));
        };

        if !self.verify_password(password, &user.password_hash)? {
            return Err(Error::invalid_credentials(INVALID_CREDENTIALS_MESSAGE));
        }

        Ok(user)
    }

    /// Resolve a session-supplied id back to an account.
    ///
    /// # Errors
    /// `NotFound` when the account no longer exists.
    pub async fn resolve(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("user not found"))
    }

    fn hash_password(&self, password: &str) -> Result<String, Error> {
        let salt = SaltString::generate(&mut OsRng);
        self.hasher
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|error| Error::internal(format!("password hashing failed: {error}")))
    }

    fn verify_password(&self, password: &str, stored: &str) -> Result<bool, Error> {
        let parsed = PasswordHash::new(stored)
            .map_err(|error| Error::internal(format!("stored password hash is invalid: {error}")))?;
        Ok(self
            .hasher
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

fn map_validation_error(err: UserValidationError) -> Error {
    let field = match err {
        UserValidationError::EmptyFullName => "fullname",
        UserValidationError::EmptyEmail | UserValidationError::InvalidEmail => "email",
        UserValidationError::EmptyPassword => "password",
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field }))
}
