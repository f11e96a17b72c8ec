//! Package name validation.
//!
//! Valid package names:
//! - Must be non-empty
//! - Consist of one or more dot-separated segments
//! - Segments contain only ASCII letters, digits, and underscores
//! - Segments must not be empty and must not start with a digit

use crate::error::NameError;

fn invalid(name: &str, reason: impl Into<String>) -> NameError {
    NameError::InvalidName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a package name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use strata_types::validate_package_name;
///
/// assert!(validate_package_name("Core").is_ok());
/// assert!(validate_package_name("App.Web_2").is_ok());
/// assert!(validate_package_name("").is_err());
/// assert!(validate_package_name("App..Web").is_err());
/// ```
pub fn validate_package_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(invalid(name, "package name must not be empty"));
    }

    for segment in name.split('.') {
        if segment.is_empty() {
            return Err(invalid(name, "segments between dots must not be empty"));
        }

        let first = segment.chars().next().expect("segment is non-empty");
        if first.is_ascii_digit() {
            return Err(invalid(
                name,
                format!("segment {segment:?} must not start with a digit"),
            ));
        }

        if let Some(bad) = segment
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '_')
        {
            return Err(invalid(name, format!("contains forbidden character: {bad:?}")));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_simple_names() {
        assert!(validate_package_name("Core").is_ok());
        assert!(validate_package_name("core").is_ok());
        assert!(validate_package_name("_private").is_ok());
        assert!(validate_package_name("pkg2").is_ok());
    }

    #[test]
    fn valid_dotted_names() {
        assert!(validate_package_name("App.Web").is_ok());
        assert!(validate_package_name("App.Web.Config_v2").is_ok());
    }

    #[test]
    fn reject_empty_name() {
        assert!(validate_package_name("").is_err());
    }

    #[test]
    fn reject_empty_segments() {
        assert!(validate_package_name(".leading").is_err());
        assert!(validate_package_name("trailing.").is_err());
        assert!(validate_package_name("a..b").is_err());
    }

    #[test]
    fn reject_leading_digit_per_segment() {
        assert!(validate_package_name("2fast").is_err());
        assert!(validate_package_name("App.2fast").is_err());
    }

    #[test]
    fn digit_allowed_after_first_char() {
        assert!(validate_package_name("a2.b3c").is_ok());
    }

    #[test]
    fn reject_forbidden_chars() {
        assert!(validate_package_name("has space").is_err());
        assert!(validate_package_name("has-dash").is_err());
        assert!(validate_package_name("slash/name").is_err());
        assert!(validate_package_name("uni\u{e9}code").is_err());
    }

    #[test]
    fn error_names_the_rule() {
        let err = validate_package_name("App.9x").unwrap_err();
        let NameError::InvalidName { name, reason } = err;
        assert_eq!(name, "App.9x");
        assert!(reason.contains("digit"));
    }
}
