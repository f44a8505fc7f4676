use crate::error::{Error, Result};

/// A validated user identifier, also used as the user's directory name.
///
/// Rejects blank identifiers and anything that could escape the storage
/// root (path separators, `.`/`..` components).
///
/// # Examples
///
/// ```
/// use docchat::UserId;
///
/// let user = UserId::new("alice").unwrap();
/// assert_eq!(user.as_str(), "alice");
/// assert!(UserId::new("").is_err());
/// assert!(UserId::new("../etc").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidUserId);
        }
        if trimmed.contains(['/', '\\']) || trimmed == "." || trimmed == ".." {
            return Err(Error::InvalidUserId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
