use std::fmt;

use super::StoreError;

/// Characters a path segment may not contain.
const FORBIDDEN_CHARS: &[char] = &['.', '#', '$', '[', ']'];

/// A normalized, slash-separated location in the realtime tree.
///
/// The empty path addresses the root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    /// The root of the tree.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a path like `sessions/482913/users`. Leading and trailing slashes are ignored.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let mut segments = Vec::new();
        for segment in raw.trim_matches('/').split('/') {
            if segment.is_empty() {
                if raw.trim_matches('/').is_empty() {
                    break;
                }
                return Err(StoreError::InvalidPath(format!("Empty segment in path '{}'", raw)));
            }
            validate_segment(segment).map_err(|reason| {
                StoreError::InvalidPath(format!("Invalid segment '{}' in path '{}': {}", segment, raw, reason))
            })?;
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// Parent of every session subtree.
    pub fn sessions() -> Self {
        Self { segments: vec!["sessions".to_string()] }
    }

    /// Path of a session subtree.
    pub fn session(code: &str) -> Result<Self, StoreError> {
        Self::sessions().child(code)
    }

    /// Append one segment.
    pub fn child(&self, segment: &str) -> Result<Self, StoreError> {
        validate_segment(segment).map_err(|reason| {
            StoreError::InvalidPath(format!("Invalid segment '{}': {}", segment, reason))
        })?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    /// Append a relative, possibly multi-segment path.
    pub fn join(&self, relative: &StorePath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(relative.segments.iter().cloned());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// True when `self` equals `other` or lies above it.
    pub fn is_ancestor_or_self(&self, other: &StorePath) -> bool {
        self.segments.len() <= other.segments.len()
            && self.segments.iter().zip(other.segments.iter()).all(|(a, b)| a == b)
    }

    /// True when a write at one path can change the value observed at the other.
    pub fn overlaps(&self, other: &StorePath) -> bool {
        self.is_ancestor_or_self(other) || other.is_ancestor_or_self(self)
    }

    /// Strip `prefix` from the front of this path.
    pub fn relative_to(&self, prefix: &StorePath) -> Option<StorePath> {
        if !prefix.is_ancestor_or_self(self) {
            return None;
        }
        Some(Self {
            segments: self.segments[prefix.segments.len()..].to_vec(),
        })
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

fn validate_segment(segment: &str) -> Result<(), &'static str> {
    if segment.is_empty() {
        return Err("segment is empty");
    }
    if segment.contains('/') {
        return Err("segment contains '/'");
    }
    if segment.chars().any(|c| FORBIDDEN_CHARS.contains(&c) || c.is_control()) {
        return Err("segment contains a forbidden character");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays() {
        let path = StorePath::parse("/sessions/482913/users/").unwrap();
        assert_eq!(path.segments(), &["sessions", "482913", "users"]);
        assert_eq!(path.to_string(), "/sessions/482913/users");
        assert_eq!(path.key(), Some("users"));
    }

    #[test]
    fn root_parses_from_empty_and_slash() {
        assert!(StorePath::parse("").unwrap().is_root());
        assert!(StorePath::parse("/").unwrap().is_root());
    }

    #[test]
    fn rejects_bad_segments() {
        assert!(StorePath::parse("sessions//users").is_err());
        assert!(StorePath::parse("sessions/a.b").is_err());
        assert!(StorePath::parse("sessions/$x").is_err());
        assert!(StorePath::root().child("a/b").is_err());
    }

    #[test]
    fn overlap_is_symmetric_for_ancestors() {
        let session = StorePath::parse("sessions/1").unwrap();
        let users = StorePath::parse("sessions/1/users").unwrap();
        let other = StorePath::parse("sessions/2").unwrap();
        assert!(session.overlaps(&users));
        assert!(users.overlaps(&session));
        assert!(!users.overlaps(&other));
        assert_eq!(users.relative_to(&session).unwrap().segments(), &["users"]);
        assert!(other.relative_to(&session).is_none());
    }
}
