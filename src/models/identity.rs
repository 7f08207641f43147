// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed-in identity, stored profile and registration form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

/// Identity issued by the identity provider.
///
/// The session manager keeps a read-only copy per signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Identity {
    /// Opaque user id (also the document id of the profile)
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

/// Profile document stored at `users/{uid}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: String,
    pub birth_date: String,
    pub dni: String,
}

impl UserProfile {
    /// Merge a partial update into this profile. Absent fields are kept.
    pub fn merge(&mut self, update: ProfileUpdate) {
        let ProfileUpdate {
            name,
            surname,
            email,
            phone,
            birth_date,
            dni,
        } = update;

        if let Some(v) = name {
            self.name = v;
        }
        if let Some(v) = surname {
            self.surname = v;
        }
        if let Some(v) = email {
            self.email = v;
        }
        if let Some(v) = phone {
            self.phone = v;
        }
        if let Some(v) = birth_date {
            self.birth_date = v;
        }
        if let Some(v) = dni {
            self.dni = v;
        }
    }
}

/// Partial profile update from the settings form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    pub dni: Option<String>,
}

/// Sign-up form. Absent fields read as blank.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct Registration {
    #[validate(custom(function = "not_blank", message = "Name is required"))]
    pub name: String,
    #[validate(custom(function = "not_blank", message = "Surname is required"))]
    pub surname: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
    #[validate(custom(function = "phone_digits", message = "Phone must have at least 9 digits"))]
    pub phone: String,
    #[validate(custom(function = "not_blank", message = "Birth date is required"))]
    pub birth_date: String,
    #[validate(custom(function = "dni_digits", message = "DNI must have at least 8 digits"))]
    pub dni: String,
}

impl Registration {
    /// Display name pushed to the identity provider after sign-up.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name.trim(), self.surname.trim())
    }

    /// Profile document written after sign-up.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            name: self.name.trim().to_string(),
            surname: self.surname.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.clone(),
            birth_date: self.birth_date.clone(),
            dni: self.dni.clone(),
        }
    }
}

/// Reject empty and whitespace-only input.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

fn all_digits_at_least(value: &str, min: usize) -> bool {
    value.len() >= min && value.chars().all(|c| c.is_ascii_digit())
}

fn phone_digits(value: &str) -> Result<(), ValidationError> {
    if all_digits_at_least(value, 9) {
        Ok(())
    } else {
        Err(ValidationError::new("phone"))
    }
}

fn dni_digits(value: &str) -> Result<(), ValidationError> {
    if all_digits_at_least(value, 8) {
        Ok(())
    } else {
        Err(ValidationError::new("dni"))
    }
}
