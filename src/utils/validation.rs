use crate::utils::error::{BuildError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(BuildError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(BuildError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BuildError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_one_of(field_name: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if !allowed.contains(&value) {
        return Err(BuildError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Unsupported value. Valid values: {}", allowed.join(", ")),
        });
    }
    Ok(())
}

pub fn validate_unique<'a, I>(field_name: &str, names: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(BuildError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: name.to_string(),
                reason: "Duplicate name".to_string(),
            });
        }
    }
    Ok(())
}

/// `subset` 中的每個名稱都必須出現在 `universe`
pub fn validate_subset(field_name: &str, subset: &[String], universe: &[String]) -> Result<()> {
    for name in subset {
        if !universe.contains(name) {
            return Err(BuildError::ConfigValidationError {
                field: field_name.to_string(),
                message: format!("'{}' is not a declared parameter", name),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("paths.workspace", "./bin").is_ok());
        assert!(validate_path("paths.workspace", "").is_err());
        assert!(validate_path("paths.workspace", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_one_of() {
        assert!(validate_one_of("logging.format", "json", &["compact", "json"]).is_ok());
        assert!(validate_one_of("logging.format", "xml", &["compact", "json"]).is_err());
    }

    #[test]
    fn test_validate_unique() {
        assert!(validate_unique("observations", ["inc_out", "prev"]).is_ok());
        assert!(validate_unique("observations", ["inc_out", "inc_out"]).is_err());
    }

    #[test]
    fn test_validate_subset() {
        let params = vec!["r0".to_string(), "vol".to_string()];
        assert!(validate_subset("par_diff", &["vol".to_string()], &params).is_ok());
        assert!(validate_subset("par_diff", &["sigma".to_string()], &params).is_err());
    }
}
