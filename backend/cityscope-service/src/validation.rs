//! Input normalisation and validation helpers shared by the request DTOs.

use crate::error::FieldError;
use once_cell::sync::Lazy;
use regex::Regex;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("valid username pattern"));

/// Letters, digits and underscores only
pub fn validate_username_chars(username: &str) -> Result<(), ValidationError> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err(ValidationError::new("username_chars")
            .with_message("Username can only contain letters, numbers, and underscores".into()))
    }
}

/// Trim surrounding whitespace in place
pub fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

/// Convert a Rust field name to the camelCase name clients send
pub fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for ch in field.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Flatten validator output into client-facing field errors, sorted by field
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out = Vec::new();
    for (field, kind) in errors.errors() {
        if let ValidationErrorsKind::Field(list) = kind {
            for err in list {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", camel_case(field)));
                out.push(FieldError::new(camel_case(field), message));
            }
        }
    }
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, max = 5, message = "too long"))]
        text_content: String,
        #[validate(custom(function = "validate_username_chars"))]
        username: String,
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("text_content"), "textContent");
        assert_eq!(camel_case("post_type"), "postType");
        assert_eq!(camel_case("bio"), "bio");
    }

    #[test]
    fn test_field_errors_use_client_names() {
        let sample = Sample {
            text_content: "abcdefg".to_string(),
            username: "bad name!".to_string(),
        };
        let errors = sample.validate().unwrap_err();
        let fields = field_errors(&errors);

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field, "textContent");
        assert_eq!(fields[0].message, "too long");
        assert_eq!(fields[1].field, "username");
    }

    #[test]
    fn test_trim_in_place() {
        let mut value = "  hello  ".to_string();
        trim_in_place(&mut value);
        assert_eq!(value, "hello");
    }
}
