//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted strength or weakness entry.
pub const MAX_LIST_ENTRY_LEN: usize = 500;

/// Rejects values that are empty once surrounding whitespace is removed.
///
/// # Examples
///
/// ```ignore
/// validate_not_blank("Equipo Rojo") // Ok
/// validate_not_blank("   ")         // Err
/// ```
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Every entry of a strengths/weaknesses list must be non-blank and reasonably short.
pub fn validate_list_entries(values: &[String]) -> Result<(), ValidationError> {
    for (index, value) in values.iter().enumerate() {
        if value.trim().is_empty() {
            let mut err = ValidationError::new("blank_entry");
            err.message = Some(format!("entry {index} is blank").into());
            return Err(err);
        }
        if value.chars().count() > MAX_LIST_ENTRY_LEN {
            let mut err = ValidationError::new("entry_too_long");
            err.message = Some(
                format!("entry {index} exceeds {MAX_LIST_ENTRY_LEN} characters").into(),
            );
            return Err(err);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_rejected() {
        assert!(validate_not_blank("Equipo Rojo").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank(" \t ").is_err());
    }

    #[test]
    fn list_entries_are_checked_individually() {
        assert!(validate_list_entries(&["Claridad".into(), "Estructura".into()]).is_ok());
        assert!(validate_list_entries(&[]).is_ok());

        let err = validate_list_entries(&["ok".into(), " ".into()]).unwrap_err();
        assert_eq!(err.code, "blank_entry");

        let long = "x".repeat(MAX_LIST_ENTRY_LEN + 1);
        let err = validate_list_entries(&[long]).unwrap_err();
        assert_eq!(err.code, "entry_too_long");
    }
}
