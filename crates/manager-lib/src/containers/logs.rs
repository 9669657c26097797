//! Bounded log retrieval for managed containers

use super::ContainerCatalog;
use crate::error::ManagerResult;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Absolute log window resolved from relative "seconds ago" parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    /// Epoch seconds, inclusive lower bound, never negative
    pub since: Option<i64>,
    /// Epoch seconds, upper bound; may be at or before the epoch
    pub until: Option<i64>,
}

impl Window {
    /// Resolve `since`/`until` (seconds before `now`) into absolute bounds.
    ///
    /// A lower bound before the epoch is clamped to the epoch. An upper bound
    /// before the epoch is kept so `is_empty` can report it.
    pub fn relative_to(now: DateTime<Utc>, since: Option<u64>, until: Option<u64>) -> Self {
        let ago = |secs: u64| {
            now.timestamp()
                .saturating_sub(i64::try_from(secs).unwrap_or(i64::MAX))
        };

        Self {
            since: since.map(|secs| ago(secs).max(0)),
            until: until.map(ago),
        }
    }

    /// True when no log line can fall inside the window.
    ///
    /// The runtime reads an upper bound of 0 as "unbounded", so a window
    /// ending at or before the epoch must never be passed through.
    pub fn is_empty(&self) -> bool {
        match (self.since, self.until) {
            (_, Some(until)) if until <= 0 => true,
            (Some(since), Some(until)) => since > until,
            _ => false,
        }
    }
}

/// Retrieves timestamped log lines of a managed container
#[derive(Clone)]
pub struct LogWindow {
    catalog: ContainerCatalog,
}

impl LogWindow {
    pub fn new(catalog: ContainerCatalog) -> Self {
        Self { catalog }
    }

    /// Log lines of `id` between `since` and `until` seconds ago.
    ///
    /// Without bounds the full available history is returned. Each line
    /// keeps the timestamp prefix the runtime put in front of it.
    pub async fn get_logs(
        &self,
        id: &str,
        since: Option<u64>,
        until: Option<u64>,
    ) -> ManagerResult<Vec<String>> {
        let container = self.catalog.get_owned(id).await?;
        let window = Window::relative_to(Utc::now(), since, until);

        if window.is_empty() {
            debug!(container_id = %container.id, ?window, "Log window is empty");
            return Ok(Vec::new());
        }

        let raw = self
            .catalog
            .runtime()
            .logs(&container.id, window.since, window.until)
            .await?;

        Ok(split_log_lines(&raw))
    }
}

/// Split raw log output into lines, dropping the trailing empty line
pub fn split_log_lines(raw: &str) -> Vec<String> {
    let trimmed = raw.trim_end_matches(['\n', '\r']);
    if trimmed.is_empty() {
        return Vec::new();
    }

    trimmed
        .split('\n')
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect()
}
