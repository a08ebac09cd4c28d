pub mod battle;
pub mod result;
pub mod roster;
pub mod vote;

/// Rejects text that is empty once surrounding whitespace is dropped.
fn validate_not_blank(text: &str) -> Result<(), validator::ValidationError> {
    if text.trim().is_empty() {
        Err(validator::ValidationError::new("blank"))
    } else {
        Ok(())
    }
}
