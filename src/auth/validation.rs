use lazy_static::lazy_static;
use regex::Regex;

use crate::error::FieldError;

pub const USERNAME_LENGTH: &str = "Username must be between 3 and 20 characters";
pub const USERNAME_CHARSET: &str = "Username can only contain letters, numbers, and underscores";
pub const EMAIL_INVALID: &str = "Please provide a valid email address";
pub const PASSWORD_LENGTH: &str = "Password must be at least 6 characters long";
pub const PASSWORD_CLASSES: &str =
    "Password must contain at least one lowercase letter, one uppercase letter, and one number";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex compiles");
    }
    EMAIL_RE.is_match(email)
}

/// Lowercases the address; Gmail addresses also lose dots and `+tag` suffixes.
pub fn normalize_email(raw: &str) -> String {
    let email = raw.trim().to_lowercase();
    let Some((local, domain)) = email.rsplit_once('@') else {
        return email;
    };
    if domain == "gmail.com" || domain == "googlemail.com" {
        let local = local.split('+').next().unwrap_or(local).replace('.', "");
        return format!("{local}@gmail.com");
    }
    email
}

pub fn check_username(username: &str, errors: &mut Vec<FieldError>) {
    let len = username.chars().count();
    if !(3..=20).contains(&len) {
        errors.push(FieldError::new("username", USERNAME_LENGTH));
    }
    if username.is_empty()
        || !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        errors.push(FieldError::new("username", USERNAME_CHARSET));
    }
}

pub fn check_email(email: &str, errors: &mut Vec<FieldError>) {
    if !is_valid_email(email) {
        errors.push(FieldError::new("email", EMAIL_INVALID));
    }
}

pub fn check_password(password: &str, errors: &mut Vec<FieldError>) {
    if password.chars().count() < 6 {
        errors.push(FieldError::new("password", PASSWORD_LENGTH));
    }
    let lower = password.chars().any(|c| c.is_ascii_lowercase());
    let upper = password.chars().any(|c| c.is_ascii_uppercase());
    let digit = password.chars().any(|c| c.is_ascii_digit());
    if !(lower && upper && digit) {
        errors.push(FieldError::new("password", PASSWORD_CLASSES));
    }
}

pub fn require(field: &'static str, value: &str, message: &'static str, errors: &mut Vec<FieldError>) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, message));
    }
}
