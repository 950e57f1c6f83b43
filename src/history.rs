//! # Report History Module
//!
//! Persistence of analysis reports as a bounded, newest-first JSON array.
//! Each run's report is inserted at index 0, the array truncated to the
//! configured capacity and rewritten as a whole. The bounded structure is an
//! explicit abstraction so the ≤capacity / newest-first invariant is testable
//! independently of file I/O.
//!
//! An absent, unreadable or non-array history file is treated as an empty
//! history; that condition is logged but never surfaced to the caller.

use serde_json::Value;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::errors::{error_logging, AppError, AppResult};
use crate::report::AnalysisReport;

/// File name of the rolling history inside the output directory
pub const HISTORY_FILE_NAME: &str = "Prescription.json";

/// Bounded, newest-first collection of report values
#[derive(Debug, Clone)]
pub struct ReportHistory {
    entries: VecDeque<Value>,
    capacity: usize,
}

impl ReportHistory {
    /// Create an empty history with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of retained entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert an entry at the front, evicting the oldest entries past capacity
    pub fn push_front(&mut self, entry: Value) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// The most recent entry, if any
    pub fn front(&self) -> Option<&Value> {
        self.entries.front()
    }

    /// Iterate entries newest-first
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter()
    }

    /// Load a history from a JSON array file
    ///
    /// A file that is absent, unreadable or does not contain a JSON array is
    /// treated as an empty history. Entries beyond capacity are dropped.
    pub fn load(path: &Path, capacity: usize) -> Self {
        let mut history = Self::with_capacity(capacity);

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => {
                debug!("No readable history file at {:?}, starting empty", path);
                return history;
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Array(values)) => {
                for value in values.into_iter().take(capacity) {
                    history.entries.push_back(value);
                }
            }
            Ok(_) => {
                warn!("History file {:?} is not a JSON array, treating as empty", path);
            }
            Err(e) => {
                warn!("History file {:?} is not valid JSON ({}), treating as empty", path, e);
            }
        }

        history
    }

    /// Write the whole history to a pretty-printed JSON array file
    ///
    /// Creates the parent directory if needed.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    AppError::FileSystem(format!(
                        "Failed to create output directory {:?}: {}",
                        parent, e
                    ))
                })?;
            }
        }

        let entries: Vec<&Value> = self.entries.iter().collect();
        let serialized = serde_json::to_string_pretty(&entries)
            .map_err(|e| AppError::FileSystem(format!("Failed to serialize history: {}", e)))?;

        fs::write(path, serialized).map_err(|e| {
            AppError::FileSystem(format!("Failed to write history file {:?}: {}", path, e))
        })?;

        debug!("Wrote {} history entries to {:?}", self.entries.len(), path);
        Ok(())
    }
}

/// Path of the history file inside an output directory
pub fn history_file_path(output_dir: &str) -> PathBuf {
    Path::new(output_dir).join(HISTORY_FILE_NAME)
}

/// Append a report to the history file: load, insert at the front, truncate
/// to capacity, rewrite
pub fn append_report(output_dir: &str, report: &AnalysisReport, capacity: usize) -> AppResult<()> {
    let path = history_file_path(output_dir);

    let value = serde_json::to_value(report)
        .map_err(|e| AppError::Internal(format!("Failed to serialize report: {}", e)))?;

    let mut history = ReportHistory::load(&path, capacity);
    history.push_front(value);

    if let Err(e) = history.save(&path) {
        error_logging::log_filesystem_error(&e, "append_report", path.to_str());
        return Err(e);
    }
    Ok(())
}
