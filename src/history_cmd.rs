use chrono::NaiveDate;

use cmdhist::bucket::{BucketId, Clock};
use cmdhist::config::HistoryConfig;
use cmdhist::entry::LogEntry;
use cmdhist::events::HistoryEvent;
use cmdhist::filter::Predicate;
use cmdhist::route::{Route, Router};
use cmdhist::store::{self, LogStore};
use cmdhist::tree::NodeRef;
use cmdhist::{HistoryError, HistoryIndex};

pub type Index = HistoryIndex<Box<dyn LogStore>>;

/// Open the configured log and load it into an index whose notifications are
/// echoed to stderr.
pub fn open_index(cfg: &HistoryConfig, today: Option<NaiveDate>) -> anyhow::Result<Index> {
    let log = store::open(&cfg.log_path, cfg.format)?;
    let clock = today.map_or(Clock::System, Clock::Fixed);
    let router = Router::new(cfg.ignored_pattern.as_deref())?;
    let mut index = HistoryIndex::new(log)
        .with_clock(clock)
        .with_router(router)
        .with_observer(|event: &HistoryEvent| {
            if let HistoryEvent::Notify(msg) = event {
                eprintln!("[cmdhist] {msg}");
            }
        });
    index.load()?;
    Ok(index)
}

pub fn cmd_tree(index: &mut Index, filter: Option<&str>, json: bool) -> anyhow::Result<i32> {
    if let Some(pattern) = filter {
        index.set_predicate(Predicate::pattern(pattern)?);
    }
    let view = index.view();

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(0);
    }
    if view.is_empty() {
        eprintln!("[cmdhist] no history entries found");
        return Ok(0);
    }
    for bucket in view.buckets() {
        println!("{}", bucket.label());
        for (pos, node) in bucket.children().iter().enumerate() {
            let status = node
                .status
                .as_deref()
                .map(|s| format!(" [{s}]"))
                .unwrap_or_default();
            println!(
                "  {}  {}{status}",
                NodeRef::command(bucket.bucket_id(), pos),
                node.command_text
            );
        }
    }
    Ok(0)
}

pub fn cmd_add(index: &mut Index, command_args: &[String]) -> anyhow::Result<i32> {
    let entry = LogEntry::launched_now(command_args.join(" "));
    let node = index.append(&entry)?;
    println!("{node}");
    Ok(0)
}

pub fn cmd_finish(index: &mut Index, status: &str) -> anyhow::Result<i32> {
    let Some(node) = index.tree().last_in(BucketId::Today) else {
        return Err(HistoryError::EmptyBucket.into());
    };
    let Some(last) = index.tree().command(node).cloned() else {
        return Err(HistoryError::NodeNotFound(node).into());
    };

    // Keep whatever else the log recorded about the run.
    let recorded = index
        .store()
        .read_all()
        .ok()
        .and_then(|entries| entries.into_iter().nth(last.source_index()))
        .filter(|e| e.matches(&last.command_text, last.timestamp.as_deref()));
    let mut entry = recorded.unwrap_or_else(|| LogEntry {
        command: last.command_text.clone(),
        timestamp: last.timestamp.clone(),
        ..LogEntry::default()
    });
    entry.status = Some(status.to_owned());

    let node = index.update_last(&entry)?;
    println!("{node}");
    Ok(0)
}

pub fn cmd_rm(index: &mut Index, node: NodeRef) -> anyhow::Result<i32> {
    index.remove(node)?;
    Ok(0)
}

pub fn cmd_show(index: &mut Index, node: NodeRef) -> anyhow::Result<i32> {
    let Some(entry) = index.select(node)? else {
        eprintln!("[cmdhist] {node} is a bucket, not a command");
        return Ok(1);
    };
    println!("{}", serde_json::to_string_pretty(&entry)?);
    Ok(0)
}

pub fn cmd_run(index: &mut Index, node: NodeRef) -> anyhow::Result<i32> {
    let Some(command) = index.tree().command(node).map(|c| c.command_text.clone()) else {
        return Err(HistoryError::NodeNotFound(node).into());
    };
    let Some(route) = index.activate(node) else {
        return Err(HistoryError::NodeNotFound(node).into());
    };
    let launcher = match route {
        Route::Shell => "shell",
        Route::Tool => "tool",
    };
    println!("{launcher}\t{command}");
    Ok(0)
}
