//! Input validation shared by the stores and the moderation workflow.

use crate::ModerationError;

/// True when the value is empty or whitespace-only.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Reject the call when any of `fields` is blank.
///
/// `message` is reported as-is so callers keep their own wording.
pub fn require_non_blank(fields: &[&str], message: &str) -> Result<(), ModerationError> {
    if fields.iter().any(|field| is_blank(field)) {
        return Err(ModerationError::InputValidation(message.to_string()));
    }
    Ok(())
}
