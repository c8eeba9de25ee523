// ABOUTME: Pure validation functions for todo and tag input
// ABOUTME: Enforces text length, due-date range, tag-name charset, and hex colors

use chrono::{NaiveDate, Utc};

pub const MAX_TODO_TEXT_LEN: usize = 500;
pub const MAX_TAG_NAME_LEN: usize = 50;

/// Characters not allowed in tag names.
const INVALID_TAG_CHARS: &[char] = &['<', '>', '"', '/', '\\', '|', '?', '*'];

/// Validation error with the offending field and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_todo_text(text: &str) -> Result<(), ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("text", "Todo text is required"));
    }
    if trimmed.chars().count() > MAX_TODO_TEXT_LEN {
        return Err(ValidationError::new(
            "text",
            format!("Todo text must be at most {} characters", MAX_TODO_TEXT_LEN),
        ));
    }
    Ok(())
}

/// Due dates are optional, but when supplied at creation time they must be
/// today or later.
pub fn validate_due_date(due_date: Option<NaiveDate>) -> Result<(), ValidationError> {
    if let Some(date) = due_date {
        let today = Utc::now().date_naive();
        if date < today {
            return Err(ValidationError::new(
                "due_date",
                "Due date cannot be in the past",
            ));
        }
    }
    Ok(())
}

pub fn validate_tag_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("name", "Tag name is required"));
    }
    if trimmed.chars().count() > MAX_TAG_NAME_LEN {
        return Err(ValidationError::new(
            "name",
            format!("Tag name must be at most {} characters", MAX_TAG_NAME_LEN),
        ));
    }
    if trimmed.chars().any(|c| INVALID_TAG_CHARS.contains(&c)) {
        return Err(ValidationError::new(
            "name",
            "Tag name contains invalid characters",
        ));
    }
    Ok(())
}

/// Accepts `#` followed by exactly 3 or 6 hex digits.
pub fn validate_color(color: &str) -> Result<(), ValidationError> {
    let digits = match color.strip_prefix('#') {
        Some(rest) => rest,
        None => {
            return Err(ValidationError::new(
                "color",
                "Invalid color format. Use hex format (e.g. #FF0000)",
            ))
        }
    };

    let valid_len = digits.len() == 3 || digits.len() == 6;
    if !valid_len || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::new(
            "color",
            "Invalid color format. Use hex format (e.g. #FF0000)",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn empty_todo_text_is_rejected() {
        assert!(validate_todo_text("").is_err());
        assert!(validate_todo_text("   ").is_err());
    }

    #[test]
    fn long_todo_text_is_rejected() {
        let text = "x".repeat(MAX_TODO_TEXT_LEN + 1);
        assert!(validate_todo_text(&text).is_err());

        let text = "x".repeat(MAX_TODO_TEXT_LEN);
        assert!(validate_todo_text(&text).is_ok());
    }

    #[test]
    fn due_date_today_or_later_is_accepted() {
        let today = Utc::now().date_naive();
        assert!(validate_due_date(Some(today)).is_ok());
        assert!(validate_due_date(Some(today + Duration::days(7))).is_ok());
        assert!(validate_due_date(None).is_ok());
    }

    #[test]
    fn past_due_date_is_rejected() {
        let yesterday = Utc::now().date_naive() - Duration::days(1);
        assert!(validate_due_date(Some(yesterday)).is_err());
    }

    #[test]
    fn tag_name_charset_is_enforced() {
        assert!(validate_tag_name("Work").is_ok());
        assert!(validate_tag_name("").is_err());
        assert!(validate_tag_name("a/b").is_err());
        assert!(validate_tag_name("a|b").is_err());
        assert!(validate_tag_name(&"x".repeat(MAX_TAG_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn hex_colors_are_validated() {
        assert!(validate_color("#1976d2").is_ok());
        assert!(validate_color("#fff").is_ok());
        assert!(validate_color("1976d2").is_err());
        assert!(validate_color("#19762").is_err());
        assert!(validate_color("#gggggg").is_err());
    }
}
