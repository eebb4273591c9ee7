//! The live history index: a [`HistoryTree`] kept in step with a [`LogStore`].
//!
//! Every mutation touches the durable side first and the tree second, so a
//! failed write never leaves the two diverged. Node handles are re-resolved
//! on every call; nothing here holds on to positions across mutations.

use crate::bucket::{BucketId, Clock};
use crate::entry::LogEntry;
use crate::error::HistoryError;
use crate::events::{HistoryEvent, HistoryObserver, NoopObserver};
use crate::filter::{self, ExactQuery, Predicate};
use crate::route::{Route, Router};
use crate::store::LogStore;
use crate::tree::{CommandNode, HistoryTree, Node, NodeRef};

pub struct HistoryIndex<S: LogStore> {
    store: S,
    tree: HistoryTree,
    filter: Option<Predicate>,
    clock: Clock,
    router: Router,
    observer: Box<dyn HistoryObserver>,
}

impl<S: LogStore> HistoryIndex<S> {
    /// Create an index over `store` with an empty tree. Call [`Self::load`]
    /// to populate it.
    pub fn new(store: S) -> Self {
        Self {
            store,
            tree: HistoryTree::default(),
            filter: None,
            clock: Clock::System,
            router: Router::default(),
            observer: Box::new(NoopObserver),
        }
    }

    #[must_use]
    pub const fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: impl HistoryObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Direct access to the backing log. Changes made here are not reflected
    /// in the tree until the next reload.
    pub const fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// The unfiltered tree.
    pub const fn tree(&self) -> &HistoryTree {
        &self.tree
    }

    /// Owned copy of the unfiltered tree.
    pub fn snapshot(&self) -> HistoryTree {
        self.tree.clone()
    }

    /// Owned copy of the tree as currently filtered.
    pub fn view(&self) -> HistoryTree {
        filter::view(&self.tree, self.filter.as_ref())
    }

    /// Group `entries` into buckets relative to the index's clock.
    pub fn build(&self, entries: &[LogEntry]) -> HistoryTree {
        HistoryTree::build(entries, self.clock.today())
    }

    // --- loading ---

    /// Populate the tree from the store. On a read failure the tree is left
    /// empty, since nothing known about this store can be shown.
    ///
    /// # Errors
    /// Returns [`HistoryError::StoreRead`] if the store cannot be read.
    pub fn load(&mut self) -> Result<(), HistoryError> {
        self.rebuild(true)
    }

    /// Discard the tree and rebuild it from a fresh read. On a read failure
    /// the previous tree is kept.
    ///
    /// # Errors
    /// Returns [`HistoryError::StoreRead`] if the store cannot be read.
    pub fn reload_from_scratch(&mut self) -> Result<(), HistoryError> {
        self.rebuild(false)
    }

    /// Point the index at another log (the active workspace changed) and
    /// load it. Returns the previous store.
    ///
    /// # Errors
    /// Returns [`HistoryError::StoreRead`] if the new store cannot be read; the
    /// store is switched regardless and the tree is left empty.
    pub fn switch_store(&mut self, store: S) -> (S, Result<(), HistoryError>) {
        let previous = std::mem::replace(&mut self.store, store);
        let loaded = self.load();
        (previous, loaded)
    }

    fn rebuild(&mut self, empty_on_error: bool) -> Result<(), HistoryError> {
        match self.store.read_all() {
            Ok(entries) => {
                self.tree = self.build(&entries);
                tracing::debug!(
                    store = %self.store.describe(),
                    entries = entries.len(),
                    buckets = self.tree.buckets().len(),
                    "history loaded"
                );
            }
            Err(e) => {
                if empty_on_error {
                    self.tree = HistoryTree::default();
                }
                let err = self.fail(HistoryError::read(&e));
                self.changed();
                return Err(err);
            }
        }
        self.changed();
        Ok(())
    }

    // --- mutation ---

    /// Persist `entry` and add it as the newest command of `Today`.
    ///
    /// # Errors
    /// Returns [`HistoryError::StoreWrite`] if the append fails; the tree is
    /// left untouched.
    pub fn append(&mut self, entry: &LogEntry) -> Result<NodeRef, HistoryError> {
        if let Err(e) = self.store.append(entry) {
            return Err(self.fail(HistoryError::write(&e)));
        }
        let kept = self.kept(self.tree.command_count(), entry);
        Ok(self.record_appended(&kept))
    }

    /// Add an entry the caller already wrote to the store.
    pub fn record_appended(&mut self, entry: &LogEntry) -> NodeRef {
        let source_index = self.tree.command_count();
        let node = self
            .tree
            .push(BucketId::Today, CommandNode::from_entry(entry, source_index));
        tracing::debug!(command = entry.display_command(), source_index, "history appended");
        self.changed();
        node
    }

    /// Replace the newest command of `Today` with `entry` in both the store and
    /// the tree. Used when a running command finishes.
    ///
    /// # Errors
    /// [`HistoryError::EmptyBucket`] if `Today` has no commands; store errors
    /// leave the tree untouched.
    pub fn update_last(&mut self, entry: &LogEntry) -> Result<NodeRef, HistoryError> {
        let (node, last) = self.last_today()?;
        let (index, _) = self.resolve(&last)?;
        if let Err(e) = self.store.replace_at(index, entry) {
            return Err(self.fail(HistoryError::write(&e)));
        }
        let kept = self.kept(index, entry);
        self.tree
            .replace(node, CommandNode::from_entry(&kept, index));
        self.changed();
        Ok(node)
    }

    /// Tree-only variant of [`Self::update_last`] for entries the caller
    /// already rewrote in the store.
    ///
    /// # Errors
    /// [`HistoryError::EmptyBucket`] if `Today` has no commands.
    pub fn record_updated(&mut self, entry: &LogEntry) -> Result<NodeRef, HistoryError> {
        let (node, last) = self.last_today()?;
        self.tree
            .replace(node, CommandNode::from_entry(entry, last.source_index));
        self.changed();
        Ok(node)
    }

    /// Remove a command from the store and the tree. Returns the store index
    /// that was deleted.
    ///
    /// # Errors
    /// [`HistoryError::NodeNotFound`] for handles that do not name a command;
    /// store errors leave the tree untouched.
    pub fn remove(&mut self, node: NodeRef) -> Result<usize, HistoryError> {
        let Some(target) = self.tree.command(node).cloned() else {
            return Err(self.fail(HistoryError::NodeNotFound(node)));
        };
        self.notify(format!("Removing <{}>", target.command_text));

        let (index, _) = self.resolve(&target)?;
        if let Err(e) = self.store.remove_at(index) {
            return Err(self.fail(HistoryError::write(&e)));
        }

        self.tree.remove(node);
        if index == target.source_index {
            self.tree.shift_after_removal(index);
        } else {
            // The log moved underneath us; positions of other nodes are suspect.
            tracing::debug!(
                expected = target.source_index,
                actual = index,
                "history indices drifted, reloading"
            );
            if self.reload_from_scratch().is_err() {
                self.tree.shift_after_removal(index);
            }
        }
        self.changed();
        self.emit(&HistoryEvent::CommandRemoved { index });
        self.notify(format!("<{}> removed", target.command_text));
        Ok(index)
    }

    /// The entry as the store kept it at `index` after writing `entry`.
    /// Plain-text logs drop everything but the command; nodes must mirror
    /// that or they no longer resolve.
    fn kept(&self, index: usize, entry: &LogEntry) -> LogEntry {
        self.store
            .read_all()
            .ok()
            .and_then(|entries| entries.into_iter().nth(index))
            .filter(|e| e.display_command() == entry.display_command())
            .unwrap_or_else(|| entry.clone())
    }

    fn last_today(&mut self) -> Result<(NodeRef, CommandNode), HistoryError> {
        let found = self
            .tree
            .last_in(BucketId::Today)
            .and_then(|node| Some((node, self.tree.command(node)?.clone())));
        found.ok_or_else(|| self.fail(HistoryError::EmptyBucket))
    }

    /// Locate `node`'s entry in a fresh read of the store.
    ///
    /// Timestamped entries are matched on (command, timestamp). Entries without
    /// a timestamp are identified by their maintained position, which is
    /// checked against the command text. Either way the candidate closest to
    /// the remembered position wins.
    fn resolve(&mut self, node: &CommandNode) -> Result<(usize, LogEntry), HistoryError> {
        let entries = match self.store.read_all() {
            Ok(entries) => entries,
            Err(e) => return Err(self.fail(HistoryError::read(&e))),
        };
        let text = node.command_text.as_str();
        let ts = node.timestamp.as_deref();

        // A stored entry without info at the remembered position is accepted
        // on command text alone.
        let in_place = entries.get(node.source_index).is_some_and(|e| {
            e.matches(text, ts) || (e.timestamp.is_none() && e.display_command() == text)
        });
        let index = if in_place {
            Some(node.source_index)
        } else {
            entries
                .iter()
                .enumerate()
                .filter(|(_, e)| e.matches(text, ts))
                .map(|(i, _)| i)
                .min_by_key(|i| i.abs_diff(node.source_index))
        };

        match index {
            Some(i) => Ok((i, entries[i].clone())),
            None => {
                let msg = format!("<{text}> is no longer in {}", self.store.describe());
                Err(self.fail(HistoryError::StoreRead(msg)))
            }
        }
    }

    // --- filtering ---

    /// Filter the view by a regex over command text. Only an empty pattern
    /// clears the filter. Returns `false` (and keeps the current view) if the pattern
    /// does not compile.
    pub fn set_filter(&mut self, pattern: &str) -> bool {
        match Predicate::pattern(pattern) {
            Ok(predicate) => {
                self.filter = predicate;
                self.changed();
                true
            }
            Err(e) => {
                tracing::debug!("{e}");
                false
            }
        }
    }

    /// Filter the view with an arbitrary predicate.
    pub fn set_predicate(&mut self, predicate: Option<Predicate>) {
        self.filter = predicate;
        self.changed();
    }

    pub const fn predicate(&self) -> Option<&Predicate> {
        self.filter.as_ref()
    }

    /// Handles of every command matching `query` in the unfiltered tree.
    pub fn find(&self, query: &ExactQuery) -> Vec<NodeRef> {
        self.tree.find(|bucket, node| query.matches(bucket, node))
    }

    // --- selection ---

    /// Look up the full log entry behind a command node. Bucket nodes yield
    /// `Ok(None)`.
    ///
    /// # Errors
    /// [`HistoryError::NodeNotFound`] for stale handles; store read errors.
    pub fn select(&mut self, node: NodeRef) -> Result<Option<LogEntry>, HistoryError> {
        let target = match self.tree.get(node) {
            Some(Node::Bucket(_)) => return Ok(None),
            Some(Node::Command(c)) => c.clone(),
            None => return Err(self.fail(HistoryError::NodeNotFound(node))),
        };
        self.notify(target.command_text.clone());
        let (_, entry) = self.resolve(&target)?;
        self.emit(&HistoryEvent::CommandSelected(target));
        Ok(Some(entry))
    }

    /// Hand a command over for execution. Bucket nodes yield `None`; the
    /// renderer toggles their expansion instead.
    pub fn activate(&mut self, node: NodeRef) -> Option<Route> {
        let target = self.tree.command(node)?.clone();
        let route = self.router.route(&target.command_text);
        self.emit(&HistoryEvent::CommandActivated {
            node: target,
            route,
        });
        Some(route)
    }

    // --- events ---

    fn emit(&mut self, event: &HistoryEvent) {
        self.observer.on_event(event);
    }

    fn notify(&mut self, message: String) {
        self.emit(&HistoryEvent::Notify(message));
    }

    fn changed(&mut self) {
        let view = self.view();
        self.emit(&HistoryEvent::HistoryChanged(view));
    }

    /// Report `err` and hand it back for returning.
    fn fail(&mut self, err: HistoryError) -> HistoryError {
        if err.is_user_facing() {
            tracing::warn!("{err}");
            self.notify(err.to_string());
        } else {
            tracing::debug!("{err}");
        }
        err
    }
}
