//! Hierarchical dotted identifiers.
//!
//! A [`Tag`] is one or more non-empty segments joined by `.`, e.g.
//! `Stat.Health.Max`. Ancestry is purely structural: `Stat` is an ancestor of
//! `Stat.Health.Max` because its segments are a proper prefix of the latter's.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Segment separator.
pub const SEPARATOR: char = '.';

/// Reasons a string is not a valid [`Tag`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    /// The input was the empty string.
    #[error("tag is empty")]
    Empty,
    /// The input had a leading, trailing or doubled separator.
    #[error("tag `{0}` contains an empty segment")]
    EmptySegment(String),
}

/// Immutable hierarchical property key.
///
/// Cloning is cheap (the text is shared). Ordering is lexicographic over the
/// text, which keeps every descendant of a tag in one contiguous run after
/// `"<tag>."`.
///
/// # Examples
///
/// ```rust
/// use cascade_props::Tag;
///
/// let max = Tag::new("Stat.Health.Max").unwrap();
/// assert_eq!(max.depth(), 3);
/// assert_eq!(max.parent(), Some(Tag::new("Stat.Health").unwrap()));
/// assert!(Tag::new("Stat").unwrap().is_ancestor_of(&max));
/// assert!(Tag::new("Stat..Max").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(Arc<str>);

impl Tag {
    /// Parses and validates a tag.
    pub fn new(text: impl AsRef<str>) -> Result<Self, TagError> {
        let text = text.as_ref();
        if text.is_empty() {
            return Err(TagError::Empty);
        }
        if text.split(SEPARATOR).any(str::is_empty) {
            return Err(TagError::EmptySegment(text.to_owned()));
        }
        Ok(Self(Arc::from(text)))
    }

    /// The dotted text of this tag.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.matches(SEPARATOR).count() + 1
    }

    /// Iterates the segments from the root down.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR)
    }

    /// The ancestor-or-self made of the first `depth` segments.
    ///
    /// Returns `None` for `depth == 0` or a depth beyond this tag's own.
    #[must_use]
    pub fn truncate(&self, depth: usize) -> Option<Tag> {
        let own = self.depth();
        if depth == 0 || depth > own {
            return None;
        }
        if depth == own {
            return Some(self.clone());
        }
        self.0
            .match_indices(SEPARATOR)
            .nth(depth - 1)
            .map(|(end, _)| Tag(Arc::from(&self.0[..end])))
    }

    /// The immediate parent, if this is not a root tag.
    #[must_use]
    pub fn parent(&self) -> Option<Tag> {
        self.truncate(self.depth() - 1)
    }

    /// Ancestors from the immediate parent up to the root segment.
    pub fn ancestors(&self) -> impl Iterator<Item = Tag> + '_ {
        (1..self.depth()).rev().filter_map(|depth| self.truncate(depth))
    }

    /// Appends one or more segments below this tag.
    pub fn child(&self, segments: &str) -> Result<Tag, TagError> {
        Tag::new(format!("{}{SEPARATOR}{segments}", self.0))
    }

    /// True if `other` lies strictly below this tag.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Tag) -> bool {
        other.0.len() > self.0.len()
            && other.0.starts_with(&*self.0)
            && other.0[self.0.len()..].starts_with(SEPARATOR)
    }

    /// True if this tag lies strictly below `other`.
    #[inline]
    #[must_use]
    pub fn is_descendant_of(&self, other: &Tag) -> bool {
        other.is_ancestor_of(self)
    }

    /// How many levels this tag sits below `ancestor`, if it is a descendant.
    #[must_use]
    pub fn relative_depth(&self, ancestor: &Tag) -> Option<usize> {
        self.is_descendant_of(ancestor)
            .then(|| self.depth() - ancestor.depth())
    }

    /// The string every descendant of this tag starts with.
    pub(crate) fn descendant_prefix(&self) -> String {
        format!("{}{SEPARATOR}", self.0)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({:?})", &*self.0)
    }
}

impl Borrow<str> for Tag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.0
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
        tag.0.to_string()
    }
}
