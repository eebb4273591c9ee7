use crate::tree::NodeRef;

/// Failures surfaced by [`crate::index::HistoryIndex`].
///
/// Store errors carry the full `anyhow` context chain rendered with `{:#}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// The backing log could not be read or is corrupt.
    StoreRead(String),
    /// An append, replace or removal failed at the durable layer.
    StoreWrite(String),
    /// A filter pattern did not compile. Callers keep their previous view.
    InvalidFilterPattern(String),
    /// `update_last` was called while the `Today` bucket is empty.
    EmptyBucket,
    /// The handle does not point at a command node (anymore).
    NodeNotFound(NodeRef),
}

impl HistoryError {
    pub(crate) fn read(err: &anyhow::Error) -> Self {
        Self::StoreRead(format!("{err:#}"))
    }

    pub(crate) fn write(err: &anyhow::Error) -> Self {
        Self::StoreWrite(format!("{err:#}"))
    }

    /// Whether the error is worth showing to a user, as opposed to a broken
    /// caller contract.
    pub const fn is_user_facing(&self) -> bool {
        matches!(self, Self::StoreRead(_) | Self::StoreWrite(_))
    }
}

impl std::fmt::Display for HistoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreRead(msg) => write!(f, "failed to read history log: {msg}"),
            Self::StoreWrite(msg) => write!(f, "failed to write history log: {msg}"),
            Self::InvalidFilterPattern(msg) => write!(f, "invalid filter pattern: {msg}"),
            Self::EmptyBucket => write!(f, "no command in today's history to update"),
            Self::NodeNotFound(node) => write!(f, "no history command at {node}"),
        }
    }
}

impl std::error::Error for HistoryError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::BucketId;

    #[test]
    fn store_errors_keep_context_chain() {
        let err = anyhow::anyhow!("permission denied").context("open /tmp/log");
        let e = HistoryError::read(&err);
        assert_eq!(
            e.to_string(),
            "failed to read history log: open /tmp/log: permission denied"
        );
        assert!(e.is_user_facing());
    }

    #[test]
    fn contract_errors_are_not_user_facing() {
        assert!(!HistoryError::EmptyBucket.is_user_facing());
        let missing = HistoryError::NodeNotFound(NodeRef::command(BucketId::Today, 3));
        assert!(!missing.is_user_facing());
        assert_eq!(missing.to_string(), "no history command at today:3");
    }
}
