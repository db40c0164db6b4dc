use thiserror::Error;

/// Maximum post length, counted in Unicode scalar values.
pub const MAX_CONTENT_CHARS: usize = 140;

/// Maximum nickname length for local signups.
pub const MAX_NICK_CHARS: usize = 15;

pub const MIN_PASSWORD_CHARS: usize = 8;

/// Errors returned when user input fails validation.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("content must not be empty")]
    EmptyContent,

    #[error("content must be at most 140 characters, got {0}")]
    ContentTooLong(usize),

    #[error("email is not a valid address: {0:?}")]
    InvalidEmail(String),

    #[error("nick must not be empty")]
    EmptyNick,

    #[error("nick must be at most 15 characters, got {0}")]
    NickTooLong(usize),

    #[error("password must be at least 8 characters")]
    PasswordTooShort,
}

/// Validate post content: non-blank and at most [`MAX_CONTENT_CHARS`] characters.
pub fn validate_content(content: &str) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    let len = content.chars().count();
    if len > MAX_CONTENT_CHARS {
        return Err(ValidationError::ContentTooLong(len));
    }
    Ok(())
}

/// Validate a local signup. Errors are returned in field order: email, nick, password.
pub fn validate_join(email: &str, nick: &str, password: &str) -> Result<(), ValidationError> {
    if !email_address::EmailAddress::is_valid(email) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }

    if nick.trim().is_empty() {
        return Err(ValidationError::EmptyNick);
    }
    let len = nick.chars().count();
    if len > MAX_NICK_CHARS {
        return Err(ValidationError::NickTooLong(len));
    }

    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ValidationError::PasswordTooShort);
    }

    Ok(())
}
