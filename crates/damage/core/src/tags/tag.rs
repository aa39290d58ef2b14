use std::fmt;
use std::str::FromStr;

use crate::error::{DamageError, ErrorSeverity};

/// Errors produced when parsing a tag from text.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
    #[error("tag is empty")]
    Empty,

    #[error("tag '{0}' contains an empty segment")]
    EmptySegment(String),

    #[error("tag '{0}' contains whitespace")]
    Whitespace(String),
}

impl DamageError for TagError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            TagError::Empty => "tag_empty",
            TagError::EmptySegment(_) => "tag_empty_segment",
            TagError::Whitespace(_) => "tag_whitespace",
        }
    }
}

/// Hierarchical dotted identifier, e.g. `"Damage.Immune.Fire"`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Tag(String);

impl Tag {
    pub const SEPARATOR: char = '.';

    /// Parses a tag, rejecting empty tags, empty segments, and whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, TagError> {
        let value = value.into();
        if value.is_empty() {
            return Err(TagError::Empty);
        }
        if value.chars().any(char::is_whitespace) {
            return Err(TagError::Whitespace(value));
        }
        if value.split(Self::SEPARATOR).any(str::is_empty) {
            return Err(TagError::EmptySegment(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the dotted segments of this tag.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(Self::SEPARATOR)
    }

    /// Number of segments (`"Status.Stunned"` has depth 2).
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Returns the direct parent tag, if any.
    pub fn parent(&self) -> Option<Tag> {
        self.0
            .rfind(Self::SEPARATOR)
            .map(|idx| Tag(self.0[..idx].to_owned()))
    }

    /// Returns true if `self` equals `other` or is a descendant of it.
    pub fn matches(&self, other: &Tag) -> bool {
        match self.0.strip_prefix(other.as_str()) {
            Some("") => true,
            Some(rest) => rest.starts_with(Self::SEPARATOR),
            None => false,
        }
    }
}

impl FromStr for Tag {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tag::new(s)
    }
}

impl TryFrom<String> for Tag {
    type Error = TagError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Tag::new(value)
    }
}

impl TryFrom<&str> for Tag {
    type Error = TagError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Tag::new(value)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.0
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", self.0)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> Tag {
        Tag::new(s).unwrap()
    }

    #[test]
    fn rejects_malformed_tags() {
        assert_eq!(Tag::new(""), Err(TagError::Empty));
        assert!(matches!(Tag::new("Status..Dead"), Err(TagError::EmptySegment(_))));
        assert!(matches!(Tag::new(".Status"), Err(TagError::EmptySegment(_))));
        assert!(matches!(Tag::new("Status.Dead."), Err(TagError::EmptySegment(_))));
        assert!(matches!(Tag::new("Status Dead"), Err(TagError::Whitespace(_))));
    }

    #[test]
    fn descendant_matches_ancestor() {
        assert!(tag("Damage.Fire.Dot").matches(&tag("Damage.Fire")));
        assert!(tag("Damage.Fire").matches(&tag("Damage")));
        assert!(tag("Damage.Fire").matches(&tag("Damage.Fire")));
    }

    #[test]
    fn sibling_with_shared_prefix_does_not_match() {
        assert!(!tag("Damage.Fireball").matches(&tag("Damage.Fire")));
        assert!(!tag("Damage").matches(&tag("Damage.Fire")));
    }

    #[test]
    fn parent_walks_up_one_segment() {
        assert_eq!(tag("Damage.Immune.Fire").parent(), Some(tag("Damage.Immune")));
        assert_eq!(tag("Damage").parent(), None);
        assert_eq!(tag("Damage.Immune.Fire").depth(), 3);
    }
}
