/// Maximum module name length.
const MAX_NAME_LEN: usize = 128;

/// Validate a module name for publishing.
///
/// Names must be non-empty, at most 128 characters, consist of ASCII
/// alphanumerics and hyphens, and must not start with a hyphen. A name is
/// used verbatim as a path segment, so `/` and `.` are rejected.
pub fn validate_module_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("module name must not be empty".to_string());
    }
    if name.len() > MAX_NAME_LEN {
        return Err(format!(
            "module name exceeds maximum length of {MAX_NAME_LEN} characters"
        ));
    }
    if name.starts_with('-') {
        return Err("module name must not start with a hyphen".to_string());
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(
            "module name must contain only alphanumeric characters and hyphens".to_string(),
        );
    }
    Ok(())
}

/// Validate a version label for publishing.
///
/// Labels become a single path segment, so they must be non-empty and
/// contain no path separator or `..`.
pub fn validate_version_label(label: &str) -> Result<(), String> {
    if label.trim().is_empty() {
        return Err("module version must not be empty".to_string());
    }
    if label.contains(['/', '\\']) {
        return Err(format!(
            "module version '{label}' must not contain a path separator"
        ));
    }
    if label.contains("..") || label == "." {
        return Err(format!(
            "module version '{label}' must not contain a relative path component"
        ));
    }
    Ok(())
}
