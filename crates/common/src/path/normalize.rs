// Project path canonicalization.
//
// Two forms are produced. The wire form only canonicalizes separators, so the
// server receives the caller's bytes for every component. The key form is the
// wire form in NFC, so composed and decomposed spellings of one name share an
// in-flight key.

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Maximum allowed path length in characters. Matches Linux `PATH_MAX`; the
/// service resolves project paths on a POSIX filesystem, which cannot open
/// anything longer.
pub const MAX_PATH_CHARS: usize = 4096;

/// Maximum allowed project name length in characters.
const MAX_PROJECT_CHARS: usize = 128;

/// The project root, returned for empty or slash-only paths.
pub const ROOT_PATH: &str = "/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("project name is empty")]
    EmptyProject,

    #[error("project name contains invalid character: {0:?}")]
    InvalidProject(char),

    #[error("name exceeds maximum length of {0} characters")]
    TooLong(usize),

    #[error("path contains directory traversal component: {0}")]
    Traversal(String),

    #[error("path contains null byte")]
    NullByte,

    #[error("path contains invalid component: {0}")]
    InvalidComponent(String),
}

/// Canonicalize a path inside a project into the form sent to the service.
///
/// Rules:
/// - Convert all separators to `/`
/// - Collapse consecutive `/` into one
/// - Always start with a single `/`, never end with one
/// - Empty and slash-only input is the project root `/`
/// - Reject `.` and `..` path components (traversal)
/// - Reject null bytes and whitespace-only components
/// - Enforce the `MAX_PATH_CHARS` limit
///
/// Component text is left untouched, including its Unicode form.
pub fn canonicalize_project_path(input: &str) -> Result<String, PathError> {
    if input.contains('\0') {
        return Err(PathError::NullByte);
    }

    let unified = input.replace('\\', "/");
    let components: Vec<&str> = unified.split('/').filter(|s| !s.is_empty()).collect();

    if components.is_empty() {
        return Ok(ROOT_PATH.to_string());
    }

    for component in &components {
        if *component == "." || *component == ".." {
            return Err(PathError::Traversal((*component).to_string()));
        }
        if component.trim().is_empty() {
            return Err(PathError::InvalidComponent(
                "(whitespace-only component)".to_string(),
            ));
        }
    }

    let result = format!("/{}", components.join("/"));

    if result.chars().count() > MAX_PATH_CHARS {
        return Err(PathError::TooLong(MAX_PATH_CHARS));
    }

    Ok(result)
}

/// Canonicalize a path and apply Unicode NFC, for comparing paths.
pub fn normalize_project_path(input: &str) -> Result<String, PathError> {
    canonicalize_project_path(input).map(|path| path.nfc().collect())
}

/// Normalize a project name: trimmed, NFC, no separators or control characters.
pub fn normalize_project_name(input: &str) -> Result<String, PathError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyProject);
    }
    if trimmed.contains('\0') {
        return Err(PathError::NullByte);
    }
    if let Some(bad) = trimmed.chars().find(|c| matches!(c, '/' | '\\') || c.is_control()) {
        return Err(PathError::InvalidProject(bad));
    }

    let normalized: String = trimmed.nfc().collect();
    if normalized == "." || normalized == ".." {
        return Err(PathError::Traversal(normalized));
    }
    if normalized.chars().count() > MAX_PROJECT_CHARS {
        return Err(PathError::TooLong(MAX_PROJECT_CHARS));
    }
    Ok(normalized)
}
