//! Validation utilities shared by the engines

use bigdecimal::BigDecimal;

use crate::types::{CoreError, CoreResult};

/// Validate that a monetary amount is strictly positive
pub fn validate_positive_amount(what: &str, amount: &BigDecimal) -> CoreResult<()> {
    if *amount <= BigDecimal::from(0) {
        Err(CoreError::Validation(format!("{what} must be positive")))
    } else {
        Ok(())
    }
}

/// Validate that a quantity is strictly positive
pub fn validate_positive_quantity(what: &str, quantity: i64) -> CoreResult<()> {
    if quantity <= 0 {
        Err(CoreError::Validation(format!("{what} must be positive")))
    } else {
        Ok(())
    }
}

/// Validate an account code: non-empty, at most 20 characters,
/// alphanumeric plus dashes and dots
pub fn validate_account_code(code: &str) -> CoreResult<()> {
    if code.trim().is_empty() {
        return Err(CoreError::Validation(
            "account code cannot be empty".to_string(),
        ));
    }
    if code.len() > 20 {
        return Err(CoreError::Validation(
            "account code cannot exceed 20 characters".to_string(),
        ));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
    {
        return Err(CoreError::Validation(
            "account code can only contain alphanumeric characters, dashes, and dots".to_string(),
        ));
    }
    Ok(())
}

/// Validate a display name: non-empty, at most 100 characters
pub fn validate_name(what: &str, name: &str) -> CoreResult<()> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(format!("{what} cannot be empty")));
    }
    if name.len() > 100 {
        return Err(CoreError::Validation(format!(
            "{what} cannot exceed 100 characters"
        )));
    }
    Ok(())
}

/// Validate a description: non-empty, at most 500 characters
pub fn validate_description(description: &str) -> CoreResult<()> {
    if description.trim().is_empty() {
        return Err(CoreError::Validation(
            "description cannot be empty".to_string(),
        ));
    }
    if description.len() > 500 {
        return Err(CoreError::Validation(
            "description cannot exceed 500 characters".to_string(),
        ));
    }
    Ok(())
}
