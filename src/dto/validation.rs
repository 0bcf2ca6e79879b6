//! Validation helpers for DTOs.

use validator::ValidationError;

const MAX_CODE_LENGTH: usize = 64;
const MAX_PREF_KEY_LENGTH: usize = 128;

/// Validates that a redemption code is 1 to 64 characters without whitespace.
///
/// # Examples
///
/// ```ignore
/// validate_code("GENSHINGIFT")  // Ok
/// validate_code("")             // Err - empty
/// validate_code("HSR 2024")     // Err - whitespace
/// ```
pub fn validate_code(code: &str) -> Result<(), ValidationError> {
    let length = code.chars().count();
    if length == 0 || length > MAX_CODE_LENGTH {
        let mut err = ValidationError::new("code_length");
        err.message = Some(
            format!("Code must be between 1 and {MAX_CODE_LENGTH} characters (got {length})")
                .into(),
        );
        return Err(err);
    }

    if code.chars().any(char::is_whitespace) {
        let mut err = ValidationError::new("code_format");
        err.message = Some("Code must not contain whitespace".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a preference key: 1 to 128 ASCII letters, digits, `.`, `_`, `-` or `:`.
pub fn validate_pref_key(key: &str) -> Result<(), ValidationError> {
    if key.is_empty() || key.len() > MAX_PREF_KEY_LENGTH {
        let mut err = ValidationError::new("pref_key_length");
        err.message = Some(
            format!("Preference key must be between 1 and {MAX_PREF_KEY_LENGTH} characters").into(),
        );
        return Err(err);
    }

    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | ':');
    if !key.chars().all(allowed) {
        let mut err = ValidationError::new("pref_key_format");
        err.message = Some("Preference key may only contain letters, digits, '.', '_', '-' or ':'".into());
        return Err(err);
    }

    Ok(())
}
