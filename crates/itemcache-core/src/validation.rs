//! Request validation helpers.

use crate::ItemCacheError;
use validator::{Validate, ValidationErrors};

/// Extension trait for validation.
pub trait ValidateExt: Validate {
    /// Validates the struct and returns an `ItemCacheError` on failure.
    fn validate_request(&self) -> Result<(), ItemCacheError> {
        self.validate().map_err(validation_errors_to_error)
    }
}

impl<T: Validate> ValidateExt for T {}

/// Flattens `validator` field errors into a single validation error.
#[must_use]
pub fn validation_errors_to_error(errors: ValidationErrors) -> ItemCacheError {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                let message = error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), ToString::to_string);
                format!("{}: {}", field, message)
            })
        })
        .collect();
    messages.sort();

    ItemCacheError::Validation(messages.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Named {
        #[validate(length(min = 1, max = 8, message = "name must be 1-8 characters"))]
        name: String,
    }

    #[test]
    fn test_invalid_name_rejected() {
        let err = Named { name: String::new() }.validate_request().unwrap_err();
        assert!(matches!(err, ItemCacheError::Validation(ref m) if m.contains("name must be 1-8")));
    }

    #[test]
    fn test_valid_name_accepted() {
        assert!(Named { name: "ok".to_string() }.validate_request().is_ok());
    }
}
