pub mod bucket;
pub mod config;
pub mod entry;
pub mod error;
pub mod events;
pub mod filter;
pub mod index;
pub mod logging;
pub mod route;
pub mod store;
pub mod tree;

pub use bucket::{BucketId, Clock};
pub use entry::LogEntry;
pub use error::HistoryError;
pub use index::HistoryIndex;
pub use tree::{HistoryTree, NodeRef};
