//! Input checks shared by the mutation services

use crate::error::{ApiError, ApiResult};

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn non_empty(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

pub fn email(value: &str) -> ApiResult<()> {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ApiError::Validation(format!("invalid email: {}", value))),
    }
}

pub fn password(value: &str) -> ApiResult<()> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Only the owner may modify an entity
pub fn owner(actor: &str, owner_id: &str, entity: &str) -> ApiResult<()> {
    if actor != owner_id {
        return Err(ApiError::Forbidden(format!(
            "only the author may modify this {}",
            entity
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_email() {
        assert!(email("khalil@example.com").is_ok());
        assert_matches!(email("khalil"), Err(ApiError::Validation(_)));
        assert_matches!(email("@example.com"), Err(ApiError::Validation(_)));
    }

    #[test]
    fn test_password_length() {
        assert!(password("secret").is_ok());
        assert_matches!(password("short"), Err(ApiError::Validation(_)));
    }

    #[test]
    fn test_owner() {
        assert!(owner("U1", "U1", "post").is_ok());
        assert_matches!(owner("U2", "U1", "post"), Err(ApiError::Forbidden(_)));
    }

    #[test]
    fn test_blank_is_empty() {
        assert_matches!(non_empty("title", "   "), Err(ApiError::Validation(_)));
    }
}
