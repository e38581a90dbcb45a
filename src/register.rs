//! Sign-up validation and the registration handler.

use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::RegistrationError;
use crate::storage::{NewUser, UserStore};

pub const MSG_REQUIRED: &str = "All fields are required.";
pub const MSG_MISMATCH: &str = "Passwords do not match.";
pub const MSG_EXISTS: &str = "User already exists.";
pub const MSG_OK: &str = "User registered successfully.";

/// The fields posted by the sign-up form, under their form names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "signupConfirmPassword")]
    pub confirm_password: String,
}

impl SignUpForm {
    /// Joins a country code and a local number the way the form submits them.
    pub fn phone(country_code: &str, number: &str) -> String {
        let code = country_code.trim();
        let number = number.trim();
        if code.is_empty() || number.is_empty() {
            number.to_string()
        } else {
            format!("{} {}", code, number)
        }
    }

    pub fn validate(&self) -> Result<(), RegistrationError> {
        let fields = [
            &self.firstname,
            &self.lastname,
            &self.email,
            &self.phone_number,
            &self.password,
            &self.confirm_password,
        ];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(RegistrationError::Validation(MSG_REQUIRED.into()));
        }
        if self.password != self.confirm_password {
            return Err(RegistrationError::Validation(MSG_MISMATCH.into()));
        }
        Ok(())
    }
}

pub fn hash_password(password: &str) -> Result<String, RegistrationError> {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt).map_err(|e| RegistrationError::Hash(e.to_string()))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| RegistrationError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Validates `form`, rejects a known email, then stores the user.
///
/// The existence check and the insert are separate statements; two
/// concurrent registrations for one email can both succeed.
pub fn register(store: &UserStore, form: &SignUpForm) -> Result<String, RegistrationError> {
    form.validate()?;

    let email = form.email.trim();
    if store.email_exists(email)? {
        log::info!("registration rejected, {} already registered", email);
        return Err(RegistrationError::Conflict(MSG_EXISTS.into()));
    }

    let password_hash = hash_password(&form.password)?;
    let id = store.insert_user(&NewUser {
        firstname: form.firstname.trim().to_string(),
        lastname: form.lastname.trim().to_string(),
        email: email.to_string(),
        phone_number: form.phone_number.trim().to_string(),
        password_hash,
    })?;
    log::info!("registered user {} ({})", id, email);
    Ok(id)
}
