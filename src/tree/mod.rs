//! The bucketed history tree and its node types.

use chrono::NaiveDate;
use serde::Serialize;

use crate::bucket::{BucketId, classify_timestamp};
use crate::entry::LogEntry;

/// Leaf node: one executed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandNode {
    pub command_text: String,
    pub timestamp: Option<String>,
    pub status: Option<String>,
    /// Position of the backing entry in the log store.
    pub(crate) source_index: usize,
}

impl CommandNode {
    pub(crate) fn from_entry(entry: &LogEntry, source_index: usize) -> Self {
        Self {
            command_text: entry.display_command().to_owned(),
            timestamp: entry.timestamp.clone(),
            status: entry.status.clone(),
            source_index,
        }
    }

    /// Index of the backing entry in the log store as of the last mutation.
    pub const fn source_index(&self) -> usize {
        self.source_index
    }
}

/// Inner node: all commands of one recency bucket. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketNode {
    bucket_id: BucketId,
    children: Vec<CommandNode>,
}

impl BucketNode {
    pub const fn bucket_id(&self) -> BucketId {
        self.bucket_id
    }

    pub fn label(&self) -> &'static str {
        self.bucket_id.label()
    }

    pub fn children(&self) -> &[CommandNode] {
        &self.children
    }
}

/// A node of either kind, borrowed from a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node<'a> {
    Bucket(&'a BucketNode),
    Command(&'a CommandNode),
}

impl Node<'_> {
    pub fn label(&self) -> &str {
        match self {
            Self::Bucket(b) => b.label(),
            Self::Command(c) => &c.command_text,
        }
    }
}

/// Handle to a node by position. Handles are plain values and go stale when
/// the tree changes; they are re-resolved on every use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Bucket(BucketId),
    Command { bucket: BucketId, position: usize },
}

impl NodeRef {
    pub const fn command(bucket: BucketId, position: usize) -> Self {
        Self::Command { bucket, position }
    }

    pub const fn bucket_id(self) -> BucketId {
        match self {
            Self::Bucket(bucket) | Self::Command { bucket, .. } => bucket,
        }
    }
}

impl std::fmt::Display for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bucket(b) => write!(f, "{b}"),
            Self::Command { bucket, position } => write!(f, "{bucket}:{position}"),
        }
    }
}

/// Parses `bucket` or `bucket:position`, e.g. `today` or `yesterday:2`.
impl std::str::FromStr for NodeRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            None => Ok(Self::Bucket(s.parse()?)),
            Some((bucket, position)) => {
                let position = position
                    .parse()
                    .map_err(|e| format!("bad position '{position}': {e}"))?;
                Ok(Self::command(bucket.parse()?, position))
            }
        }
    }
}

/// Root of the history: bucket nodes in ascending [`BucketId`] order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct HistoryTree {
    buckets: Vec<BucketNode>,
}

impl HistoryTree {
    /// Group `entries` into buckets relative to `today`.
    ///
    /// Children keep log order; empty buckets are never created.
    pub fn build(entries: &[LogEntry], today: NaiveDate) -> Self {
        let mut tree = Self::default();
        for (index, entry) in entries.iter().enumerate() {
            let bucket = classify_timestamp(entry.timestamp.as_deref(), today);
            tree.bucket_mut_or_insert(bucket)
                .children
                .push(CommandNode::from_entry(entry, index));
        }
        tree
    }

    pub fn buckets(&self) -> &[BucketNode] {
        &self.buckets
    }

    pub fn bucket(&self, id: BucketId) -> Option<&BucketNode> {
        self.buckets.iter().find(|b| b.bucket_id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn command_count(&self) -> usize {
        self.buckets.iter().map(|b| b.children.len()).sum()
    }

    pub fn get(&self, node: NodeRef) -> Option<Node<'_>> {
        match node {
            NodeRef::Bucket(id) => self.bucket(id).map(Node::Bucket),
            NodeRef::Command { .. } => self.command(node).map(Node::Command),
        }
    }

    pub fn command(&self, node: NodeRef) -> Option<&CommandNode> {
        let NodeRef::Command { bucket, position } = node else {
            return None;
        };
        self.bucket(bucket)?.children.get(position)
    }

    /// Handle of the last command in `bucket`, if any.
    pub fn last_in(&self, bucket: BucketId) -> Option<NodeRef> {
        let len = self.bucket(bucket)?.children.len();
        len.checked_sub(1).map(|pos| NodeRef::command(bucket, pos))
    }

    /// Depth-first walk: each bucket followed by its commands.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeRef, Node<'_>)> + '_ {
        self.buckets.iter().flat_map(|b| {
            std::iter::once((NodeRef::Bucket(b.bucket_id), Node::Bucket(b))).chain(
                b.children.iter().enumerate().map(move |(pos, c)| {
                    (NodeRef::command(b.bucket_id, pos), Node::Command(c))
                }),
            )
        })
    }

    /// Handles of every command node accepted by `pred`, in tree order.
    pub fn find(&self, mut pred: impl FnMut(BucketId, &CommandNode) -> bool) -> Vec<NodeRef> {
        self.buckets
            .iter()
            .flat_map(|b| {
                b.children
                    .iter()
                    .enumerate()
                    .map(move |(pos, c)| (b.bucket_id, pos, c))
            })
            .filter(|&(bucket, _, c)| pred(bucket, c))
            .map(|(bucket, pos, _)| NodeRef::command(bucket, pos))
            .collect()
    }

    /// Copy of the tree keeping only accepted commands and the buckets that
    /// still have children.
    pub fn retain(&self, mut pred: impl FnMut(BucketId, &CommandNode) -> bool) -> Self {
        let buckets = self
            .buckets
            .iter()
            .filter_map(|b| {
                let children: Vec<CommandNode> = b
                    .children
                    .iter()
                    .filter(|&c| pred(b.bucket_id, c))
                    .cloned()
                    .collect();
                (!children.is_empty()).then_some(BucketNode {
                    bucket_id: b.bucket_id,
                    children,
                })
            })
            .collect();
        Self { buckets }
    }

    /// Append `node` as the last child of `bucket`, creating the bucket in
    /// order if needed.
    pub(crate) fn push(&mut self, bucket: BucketId, node: CommandNode) -> NodeRef {
        let children = &mut self.bucket_mut_or_insert(bucket).children;
        children.push(node);
        NodeRef::command(bucket, children.len() - 1)
    }

    /// Detach a command; drops its bucket when it becomes empty.
    pub(crate) fn remove(&mut self, node: NodeRef) -> Option<CommandNode> {
        let NodeRef::Command { bucket, position } = node else {
            return None;
        };
        let slot = self.buckets.iter().position(|b| b.bucket_id == bucket)?;
        let children = &mut self.buckets[slot].children;
        if position >= children.len() {
            return None;
        }
        let removed = children.remove(position);
        if children.is_empty() {
            self.buckets.remove(slot);
        }
        Some(removed)
    }

    pub(crate) fn replace(&mut self, node: NodeRef, with: CommandNode) -> Option<CommandNode> {
        let NodeRef::Command { bucket, position } = node else {
            return None;
        };
        let slot = self
            .buckets
            .iter_mut()
            .find(|b| b.bucket_id == bucket)?
            .children
            .get_mut(position)?;
        Some(std::mem::replace(slot, with))
    }

    /// Close the gap a durable removal at `removed` left in the log.
    pub(crate) fn shift_after_removal(&mut self, removed: usize) {
        for node in self.buckets.iter_mut().flat_map(|b| b.children.iter_mut()) {
            if node.source_index > removed {
                node.source_index -= 1;
            }
        }
    }

    fn bucket_mut_or_insert(&mut self, id: BucketId) -> &mut BucketNode {
        let slot = match self.buckets.binary_search_by_key(&id, |b| b.bucket_id) {
            Ok(slot) => slot,
            Err(slot) => {
                self.buckets.insert(
                    slot,
                    BucketNode {
                        bucket_id: id,
                        children: Vec::new(),
                    },
                );
                slot
            }
        };
        &mut self.buckets[slot]
    }
}
