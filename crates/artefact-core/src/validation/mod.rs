//! Validation helpers shared by request DTOs

use std::borrow::Cow;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

pub const MAX_CATEGORY_NAME_LENGTH: usize = 255;

/// Category names are 1..=255 characters once trimmed, counted as chars rather than bytes.
pub fn validate_category_name(name: &str) -> Result<(), ValidationError> {
    let len = name.trim().chars().count();
    if len == 0 {
        return Err(error_with_message("required", "Category name is required"));
    }
    if len > MAX_CATEGORY_NAME_LENGTH {
        return Err(error_with_message("length", "Category name too long"));
    }
    Ok(())
}

fn error_with_message(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// First human-readable message in a `ValidationErrors` tree, falling back to its Display form.
pub fn first_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    for (_, kind) in fields {
        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(msg) = list.iter().find_map(|e| e.message.as_ref()) {
                    return msg.to_string();
                }
            }
            ValidationErrorsKind::Struct(inner) => return first_message(inner),
            ValidationErrorsKind::List(items) => {
                if let Some((_, inner)) = items.iter().next() {
                    return first_message(inner);
                }
            }
        }
    }

    format!("Validation error: {}", errors)
}
