//! Derived, read-only views over a [`HistoryTree`].
//!
//! Filtering never touches the base tree: every call returns a fresh copy in
//! which a bucket survives only if at least one of its commands matched.

use regex::Regex;

use crate::bucket::BucketId;
use crate::error::HistoryError;
use crate::tree::{CommandNode, HistoryTree};

/// Filter `tree` with an arbitrary predicate over command nodes.
pub fn filter(
    tree: &HistoryTree,
    predicate: impl FnMut(BucketId, &CommandNode) -> bool,
) -> HistoryTree {
    tree.retain(predicate)
}

/// Field-by-field equality query. Unset fields are ignored; a query with no
/// fields set matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExactQuery {
    pub command: Option<String>,
    pub timestamp: Option<String>,
    pub status: Option<String>,
    pub bucket: Option<BucketId>,
}

impl ExactQuery {
    pub fn command(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            ..Self::default()
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.command.is_none()
            && self.timestamp.is_none()
            && self.status.is_none()
            && self.bucket.is_none()
    }

    pub fn matches(&self, bucket: BucketId, node: &CommandNode) -> bool {
        if self.is_empty() {
            return false;
        }
        self.command.as_ref().is_none_or(|c| *c == node.command_text)
            && self
                .timestamp
                .as_ref()
                .is_none_or(|t| node.timestamp.as_ref() == Some(t))
            && self
                .status
                .as_ref()
                .is_none_or(|s| node.status.as_ref() == Some(s))
            && self.bucket.is_none_or(|b| b == bucket)
    }
}

/// A compiled filter.
#[derive(Debug, Clone)]
pub enum Predicate {
    Exact(ExactQuery),
    /// Case-sensitive regex search over the command text, optionally limited
    /// to one bucket.
    Pattern {
        regex: Regex,
        bucket: Option<BucketId>,
    },
}

impl Predicate {
    /// Compile a user-typed pattern. An empty pattern means "no filter" and
    /// yields `Ok(None)`; whitespace is matched like any other text.
    ///
    /// # Errors
    /// Returns [`HistoryError::InvalidFilterPattern`] if the regex does not compile.
    pub fn pattern(text: &str) -> Result<Option<Self>, HistoryError> {
        if text.is_empty() {
            return Ok(None);
        }
        let regex =
            Regex::new(text).map_err(|e| HistoryError::InvalidFilterPattern(e.to_string()))?;
        Ok(Some(Self::Pattern {
            regex,
            bucket: None,
        }))
    }

    /// Restrict a pattern predicate to `bucket`. No effect on exact queries,
    /// which carry their own bucket field.
    #[must_use]
    pub fn in_bucket(self, bucket: BucketId) -> Self {
        match self {
            Self::Pattern { regex, .. } => Self::Pattern {
                regex,
                bucket: Some(bucket),
            },
            exact @ Self::Exact(_) => exact,
        }
    }

    pub fn matches(&self, bucket: BucketId, node: &CommandNode) -> bool {
        match self {
            Self::Exact(query) => query.matches(bucket, node),
            Self::Pattern { regex, bucket: only } => {
                only.is_none_or(|b| b == bucket) && regex.is_match(&node.command_text)
            }
        }
    }

    pub fn apply(&self, tree: &HistoryTree) -> HistoryTree {
        filter(tree, |bucket, node| self.matches(bucket, node))
    }
}

/// Apply an optional predicate; `None` returns an unfiltered copy.
pub fn view(tree: &HistoryTree, predicate: Option<&Predicate>) -> HistoryTree {
    predicate.map_or_else(|| tree.clone(), |p| p.apply(tree))
}

#[cfg(test)]
mod tests;
