//! Configuration for the scheduler subsystem.
//!
//! All components take an explicit [`SchedulerConfig`] instead of reading
//! process-wide state, so independent instances (and concurrent tests) can
//! point at separate directories.

use std::path::{Path, PathBuf};

/// Maximum number of tasks per project
pub const MAX_TASKS_PER_PROJECT: usize = 10;

/// Maximum number of task creations in a trailing hour
pub const MAX_TASKS_PER_HOUR: usize = 5;

/// Maximum number of enabled autonomous (Bash-capable) tasks
pub const MAX_AUTONOMOUS_TASKS: usize = 1;

/// Default execution timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Tools granted when the caller does not specify any
pub const DEFAULT_ALLOWED_TOOLS: [&str; 3] = ["Read", "Grep", "Glob"];

/// Default number of log lines returned by the logs operation
pub const DEFAULT_LOG_LINES: usize = 50;

/// Directory under the project root holding all scheduler state
const DATA_DIR: &str = ".cronbridge";

/// Scheduler configuration, constructed once and passed into each component
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Project the tasks belong to; also the default working directory
    pub project_dir: PathBuf,
    /// OS user recorded in audit entries
    pub user: String,
    /// Session identifier recorded on created tasks and audit entries
    pub session_id: String,
    /// Executable invoked for each task
    pub runner_bin: String,
    /// Per-project task cap
    pub max_tasks: usize,
    /// Per-hour creation cap
    pub max_tasks_per_hour: usize,
    /// Enabled autonomous task cap
    pub max_autonomous: usize,
    /// Where pre-sync crontab backups are written
    pub backup_dir: PathBuf,
    /// Where systemd user units are written
    pub systemd_user_dir: PathBuf,
}

impl SchedulerConfig {
    /// Build a configuration for a project directory, picking up the OS
    /// user and session identity from the environment when present.
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        let project_dir = project_dir.into();
        let home = dirs::home_dir();
        let backup_dir = home
            .as_deref()
            .unwrap_or(project_dir.as_path())
            .join(DATA_DIR)
            .join("backups");
        let systemd_user_dir = home
            .as_deref()
            .unwrap_or(project_dir.as_path())
            .join(".config")
            .join("systemd")
            .join("user");

        Self {
            project_dir,
            user: std::env::var("USER").unwrap_or_else(|_| "unknown".to_string()),
            session_id: std::env::var("CRONBRIDGE_SESSION_ID")
                .unwrap_or_else(|_| "unknown".to_string()),
            runner_bin: "claude".to_string(),
            max_tasks: MAX_TASKS_PER_PROJECT,
            max_tasks_per_hour: MAX_TASKS_PER_HOUR,
            max_autonomous: MAX_AUTONOMOUS_TASKS,
            backup_dir,
            systemd_user_dir,
        }
    }

    /// Override the recorded user
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Override the session identifier
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Override the runner executable
    pub fn with_runner_bin(mut self, bin: impl Into<String>) -> Self {
        self.runner_bin = bin.into();
        self
    }

    /// Override the crontab backup directory
    pub fn with_backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = dir.into();
        self
    }

    /// Override the systemd user unit directory
    pub fn with_systemd_user_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.systemd_user_dir = dir.into();
        self
    }

    /// Scheduler state directory inside the project
    pub fn data_dir(&self) -> PathBuf {
        self.project_dir.join(DATA_DIR)
    }

    /// Persisted task document
    pub fn schedules_file(&self) -> PathBuf {
        self.data_dir().join("schedules.json")
    }

    /// Per-task execution logs
    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }

    /// Execution log for one task
    pub fn task_log_file(&self, task_id: &str) -> PathBuf {
        self.logs_dir().join(format!("{task_id}.log"))
    }

    /// Append-only audit log
    pub fn audit_log_file(&self) -> PathBuf {
        self.logs_dir().join("audit.log")
    }
}

impl SchedulerConfig {
    /// Configuration rooted entirely inside one directory, for tests and
    /// sandboxed use: backups and unit files stay under the project.
    pub fn rooted(project_dir: impl AsRef<Path>) -> Self {
        let dir = project_dir.as_ref().to_path_buf();
        Self::new(&dir)
            .with_backup_dir(dir.join(DATA_DIR).join("backups"))
            .with_systemd_user_dir(dir.join(DATA_DIR).join("systemd"))
    }
}
