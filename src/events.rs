//! Outbound notifications for renderers and the execution layer.

use std::sync::mpsc::Sender;

use crate::route::Route;
use crate::tree::{CommandNode, HistoryTree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEvent {
    /// The visible tree changed; carries an owned snapshot of the current view.
    HistoryChanged(HistoryTree),
    /// Short human-readable status line.
    Notify(String),
    CommandSelected(CommandNode),
    /// The log entry at `index` was durably deleted; later entries moved
    /// down by one.
    CommandRemoved { index: usize },
    /// The user asked to run `node`; `route` says which launcher should take it.
    CommandActivated { node: CommandNode, route: Route },
}

/// Receiver of [`HistoryEvent`]s, injected into the index.
pub trait HistoryObserver {
    fn on_event(&mut self, event: &HistoryEvent);
}

/// Observer used when nobody is listening.
pub struct NoopObserver;

impl HistoryObserver for NoopObserver {
    fn on_event(&mut self, _event: &HistoryEvent) {}
}

impl<F: FnMut(&HistoryEvent)> HistoryObserver for F {
    fn on_event(&mut self, event: &HistoryEvent) {
        self(event);
    }
}

/// Forwards events over a channel, e.g. to a UI thread. Send failures (the
/// receiver hung up) are ignored.
pub struct ChannelObserver(pub Sender<HistoryEvent>);

impl HistoryObserver for ChannelObserver {
    fn on_event(&mut self, event: &HistoryEvent) {
        if self.0.send(event.clone()).is_err() {
            tracing::trace!("history event receiver dropped");
        }
    }
}
