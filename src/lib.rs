//! Cronbridge - declarative scheduled tasks on top of cron or systemd
//!
//! Provides the core of a scheduled-task manager:
//! - Natural language schedule parsing ("Every weekday at 9am")
//! - Standard 5-field cron syntax validation
//! - A validated, audited task store with safety and rate limits
//! - Idempotent projection of the enabled task set onto the OS scheduler
//!   (a managed crontab block, or systemd service+timer pairs)
//!
//! ## Quick Start
//!
//! ```ignore
//! use cronbridge::{SchedulerConfig, SchedulerSync, TaskManager};
//!
//! let config = SchedulerConfig::new("/path/to/project");
//! let manager = TaskManager::new(config.clone());
//!
//! // Create a task from a natural language schedule
//! let task = manager
//!     .create("Every weekday at 9am", "review open pull requests", None, None)
//!     .await?;
//!
//! // Project all enabled tasks onto the detected scheduler
//! let sync = SchedulerSync::new(config);
//! let outcome = sync.sync(&manager.list().await?, false).await?;
//! println!("installed via {}: {:?}", outcome.method, outcome.applied);
//! ```

pub mod natural;

mod audit;
mod calendar;
mod config;
mod parser;
mod store;
mod sync;
mod types;

pub use audit::{AuditAction, AuditLog};
pub use calendar::cron_to_calendar;
pub use config::{
    SchedulerConfig, DEFAULT_ALLOWED_TOOLS, DEFAULT_LOG_LINES, DEFAULT_TIMEOUT_SECS,
    MAX_AUTONOMOUS_TASKS, MAX_TASKS_PER_HOUR, MAX_TASKS_PER_PROJECT,
};
pub use natural::{parse_schedule, ParsedSchedule};
pub use parser::CronExpression;
pub use store::{FileScheduleStore, MemoryScheduleStore, ScheduleStore, TaskManager};
pub use sync::{
    SchedulerKind, SchedulerSync, SyncFailure, SyncOutcome, CRONTAB_BLOCK_BEGIN,
    CRONTAB_BLOCK_END,
};
pub use types::{Result, SchedError, Task, TaskPermissions, TaskSet};
