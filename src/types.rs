//! Core types for the scheduled-task subsystem

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::parser::CronExpression;

/// Result type alias for scheduler operations
pub type Result<T> = std::result::Result<T, SchedError>;

/// Scheduler errors
#[derive(Debug, Error)]
pub enum SchedError {
    /// Time expression or cron syntax could not be parsed
    #[error("Invalid time expression: {0}")]
    InvalidExpression(String),

    /// Command failed safety validation
    #[error("{0}")]
    CommandRejected(String),

    /// Per-project task cap reached
    #[error("{0}")]
    LimitExceeded(String),

    /// Too many tasks created in the trailing hour
    #[error("Rate limit: {0}")]
    RateLimited(String),

    /// A task with the same schedule and command already exists
    #[error("Similar task already exists: {0}")]
    DuplicateTask(String),

    /// Task id not present in the store
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// No execution log exists for the task
    #[error("No logs found for task: {0}")]
    LogsNotFound(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Neither a systemd user session nor cron is usable
    #[error("No scheduler available. Install cron or enable the systemd user session.")]
    SchedulerUnavailable,

    /// Scheduler installation failed
    #[error("Sync failed: {0}")]
    Sync(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Capabilities that make a task write-enabled
const WRITE_CAPABILITIES: [&str; 3] = ["Bash", "Edit", "Write"];

/// The capability that marks a task as autonomous
pub const AUTONOMOUS_CAPABILITY: &str = "Bash";

/// Tool permissions granted to a scheduled task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPermissions {
    /// Ordered set of capability names the task may use
    pub allowed_tools: Vec<String>,
    /// Derived: true iff no write capability is present
    pub read_only: bool,
}

impl TaskPermissions {
    /// Build permissions from a tool list, deduplicating while preserving
    /// order and deriving the read-only flag.
    pub fn new(tools: Vec<String>) -> Self {
        let mut allowed_tools: Vec<String> = Vec::with_capacity(tools.len());
        for tool in tools {
            if !allowed_tools.contains(&tool) {
                allowed_tools.push(tool);
            }
        }
        let read_only = !allowed_tools
            .iter()
            .any(|t| WRITE_CAPABILITIES.contains(&t.as_str()));
        Self {
            allowed_tools,
            read_only,
        }
    }

    /// Whether the unrestricted execution capability is granted
    pub fn is_autonomous(&self) -> bool {
        self.allowed_tools.iter().any(|t| t == AUTONOMOUS_CAPABILITY)
    }
}

/// A scheduled task definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique slug, `{adjective}-{noun}-{NNN}`
    pub id: String,

    /// Disabled tasks stay in the store but are never installed
    pub enabled: bool,

    /// Display name (defaults to a command prefix)
    pub name: String,

    /// Canonical 5-field cron expression
    pub schedule: String,

    /// Normalized human-readable form of the schedule
    pub schedule_human: String,

    /// Prompt/command handed to the runner
    pub command: String,

    /// Directory the runner starts in
    pub working_directory: PathBuf,

    /// Execution timeout in seconds
    pub timeout: u64,

    /// Tool permissions
    pub permissions: TaskPermissions,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Session that created the task
    pub created_by: String,

    /// Last execution timestamp, if any
    pub last_run: Option<DateTime<Utc>>,

    /// Outcome of the last execution, if any
    pub last_status: Option<String>,
}

impl Task {
    /// Whether this task is enabled and holds the autonomous capability
    pub fn is_autonomous(&self) -> bool {
        self.enabled && self.permissions.is_autonomous()
    }

    /// Next trigger time after now, when the stored schedule still parses
    pub fn next_run(&self) -> Option<DateTime<Utc>> {
        CronExpression::parse(&self.schedule)
            .ok()?
            .next_after(Utc::now())
    }
}

/// Current persisted document version
pub const TASK_SET_VERSION: &str = "1.0";

/// Versioned, ordered collection of tasks, persisted as one document.
/// Order is preserved and is the rendering order for sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSet {
    pub version: String,
    pub tasks: Vec<Task>,
}

impl Default for TaskSet {
    fn default() -> Self {
        Self {
            version: TASK_SET_VERSION.to_string(),
            tasks: Vec::new(),
        }
    }
}

impl TaskSet {
    /// Look up a task by id
    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Look up a task by id, mutably
    pub fn find_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Whether any task already uses this id
    pub fn contains_id(&self, id: &str) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    /// Number of tasks created at or after the cutoff
    pub fn created_since(&self, cutoff: DateTime<Utc>) -> usize {
        self.tasks.iter().filter(|t| t.created > cutoff).count()
    }

    /// Number of enabled tasks holding the autonomous capability
    pub fn enabled_autonomous(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_autonomous()).count()
    }

    /// Id of an existing task with identical schedule and command, if any
    pub fn find_duplicate(&self, schedule: &str, command: &str) -> Option<&str> {
        self.tasks
            .iter()
            .find(|t| t.schedule == schedule && t.command == command)
            .map(|t| t.id.as_str())
    }
}
