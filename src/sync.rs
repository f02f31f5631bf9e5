//! Projection of the enabled task set onto the OS scheduler
//!
//! Detects the available scheduler (systemd user timers preferred, then
//! cron) and installs the enabled tasks into it idempotently:
//!
//! - **cron**: the tool owns a managed block bounded by two sentinel
//!   comment lines inside the user crontab and fully rewrites it on each
//!   sync; everything outside the block is preserved. The pre-sync crontab
//!   is backed up before any write.
//! - **systemd**: one oneshot service + timer pair per task, named from a
//!   stable hash of the project path so re-syncs overwrite and cleanup
//!   never touches units of other projects. Per-unit failures are
//!   collected; partial success is a valid terminal state.
//!
//! Concurrent syncs from multiple operators race on the crontab with
//! last-write-wins semantics; the backup is loss protection, not a
//! transaction.

use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use crate::audit::{AuditAction, AuditLog};
use crate::calendar::cron_to_calendar;
use crate::config::SchedulerConfig;
use crate::parser::CronExpression;
use crate::types::{Result, SchedError, Task};

/// First line of the managed crontab block
pub const CRONTAB_BLOCK_BEGIN: &str = "# CRONBRIDGE-MANAGED-TASKS";
/// Last line of the managed crontab block
pub const CRONTAB_BLOCK_END: &str = "# END-CRONBRIDGE-MANAGED-TASKS";

/// Prefix of all generated systemd unit names
const UNIT_PREFIX: &str = "cronbridge";

/// Probe timeout for scheduler detection
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Available OS scheduler backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerKind {
    Systemd,
    Cron,
}

impl std::fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerKind::Systemd => write!(f, "systemd"),
            SchedulerKind::Cron => write!(f, "cron"),
        }
    }
}

/// A task that could not be installed during a systemd sync
#[derive(Debug, Clone)]
pub struct SyncFailure {
    pub task_id: String,
    pub error: String,
}

/// Result of one sync run
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub method: SchedulerKind,
    pub dry_run: bool,
    /// Ids installed (or, on dry run, that would be installed)
    pub applied: Vec<String>,
    /// Per-unit failures (systemd only; cron installs all-or-nothing)
    pub failed: Vec<SyncFailure>,
    /// Crontab backup taken before the write, when one existed
    pub backup: Option<PathBuf>,
    /// Rendered output (dry run only)
    pub rendered: Option<String>,
}

impl SyncOutcome {
    pub fn success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Synchronizes a task list into the detected OS scheduler
pub struct SchedulerSync {
    config: SchedulerConfig,
    audit: AuditLog,
}

impl SchedulerSync {
    pub fn new(config: SchedulerConfig) -> Self {
        let audit = AuditLog::new(&config);
        Self { config, audit }
    }

    /// Detect the available scheduler. A systemd user session wins when the
    /// status probe exits 0 (running) or 3 (no active units); otherwise a
    /// runnable `crontab` binary selects cron.
    pub async fn detect(&self) -> Option<SchedulerKind> {
        if probe_systemd().await {
            return Some(SchedulerKind::Systemd);
        }
        if probe_cron().await {
            return Some(SchedulerKind::Cron);
        }
        None
    }

    /// Sync to the detected scheduler
    pub async fn sync(&self, tasks: &[Task], dry_run: bool) -> Result<SyncOutcome> {
        let kind = self
            .detect()
            .await
            .ok_or(SchedError::SchedulerUnavailable)?;
        self.sync_to(kind, tasks, dry_run).await
    }

    /// Sync to a specific backend, bypassing detection
    pub async fn sync_to(
        &self,
        kind: SchedulerKind,
        tasks: &[Task],
        dry_run: bool,
    ) -> Result<SyncOutcome> {
        let installable = installable_tasks(tasks);

        let outcome = match kind {
            SchedulerKind::Cron => self.sync_cron(&installable, dry_run).await?,
            SchedulerKind::Systemd => self.sync_systemd(&installable, dry_run).await?,
        };

        if !dry_run {
            self.audit
                .record(
                    AuditAction::Sync,
                    "-",
                    Some(&format!("method={} tasks={}", kind, outcome.applied.len())),
                )
                .await?;
        }
        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Cron backend
    // ------------------------------------------------------------------

    /// One crontab entry invoking the runner for a task
    fn render_cron_command(&self, task: &Task) -> String {
        let tools = task.permissions.allowed_tools.join(",");
        let log = self.config.task_log_file(&task.id);
        format!(
            "cd \"{}\" && timeout {} {} -p \"{}\" --allowedTools \"{}\" >> \"{}\" 2>&1",
            task.working_directory.display(),
            task.timeout,
            self.config.runner_bin,
            task.command,
            tools,
            log.display()
        )
    }

    /// Managed block lines for the enabled task set. Contains no
    /// timestamps: rendering the same set twice is byte-identical.
    fn render_managed_block(&self, tasks: &[&Task]) -> Vec<String> {
        let mut lines = vec![
            CRONTAB_BLOCK_BEGIN.to_string(),
            format!("# Project: {}", self.config.project_dir.display()),
            format!("# Tasks: {}", tasks.len()),
        ];
        for task in tasks {
            lines.push(format!("# Task: {} - {}", task.id, task.name));
            lines.push(format!("{} {}", task.schedule, self.render_cron_command(task)));
        }
        lines.push(CRONTAB_BLOCK_END.to_string());
        lines
    }

    /// Merge the managed block into existing crontab content, replacing
    /// any previous block and leaving foreign lines untouched.
    fn compose_crontab(&self, existing: &str, tasks: &[&Task]) -> String {
        let mut lines = strip_managed_block(existing);
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        if !tasks.is_empty() {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.extend(self.render_managed_block(tasks));
        }
        lines.join("\n") + "\n"
    }

    async fn sync_cron(&self, tasks: &[&Task], dry_run: bool) -> Result<SyncOutcome> {
        let existing = read_crontab().await;
        let new_crontab = self.compose_crontab(existing.as_deref().unwrap_or(""), tasks);
        let applied: Vec<String> = tasks.iter().map(|t| t.id.clone()).collect();

        if dry_run {
            return Ok(SyncOutcome {
                method: SchedulerKind::Cron,
                dry_run: true,
                applied,
                failed: Vec::new(),
                backup: None,
                rendered: Some(new_crontab),
            });
        }

        fs::create_dir_all(self.config.logs_dir()).await?;

        let backup = match &existing {
            Some(content) => match self.backup_crontab(content).await {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!("Crontab backup failed, continuing: {e}");
                    None
                }
            },
            None => None,
        };

        install_crontab(&new_crontab).await.map_err(|e| {
            SchedError::Sync(match &backup {
                Some(path) => format!("{e}; pre-sync backup retained at {}", path.display()),
                None => e.to_string(),
            })
        })?;

        tracing::info!("Installed {} task(s) into crontab", applied.len());
        Ok(SyncOutcome {
            method: SchedulerKind::Cron,
            dry_run: false,
            applied,
            failed: Vec::new(),
            backup,
            rendered: None,
        })
    }

    /// Write the pre-sync crontab to a timestamped backup file
    async fn backup_crontab(&self, content: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.config.backup_dir).await?;
        let name = format!(
            "crontab-{}.bak",
            chrono::Utc::now().format("%Y%m%d-%H%M%S")
        );
        let path = self.config.backup_dir.join(name);
        fs::write(&path, content).await?;
        Ok(path)
    }

    // ------------------------------------------------------------------
    // Systemd backend
    // ------------------------------------------------------------------

    /// Stable 8-hex-char namespace for this project's units
    fn project_hash(&self) -> String {
        let digest = Sha256::digest(self.config.project_dir.to_string_lossy().as_bytes());
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        hex[..8].to_string()
    }

    /// Deterministic unit base name for a task
    fn unit_base(&self, task_id: &str) -> String {
        format!("{UNIT_PREFIX}-{}-{task_id}", self.project_hash())
    }

    fn render_service_unit(&self, task: &Task) -> String {
        let tools = task.permissions.allowed_tools.join(",");
        let log = self.config.task_log_file(&task.id);
        format!(
            "[Unit]\n\
             Description=Scheduled task: {}\n\
             Documentation=file://{}\n\
             \n\
             [Service]\n\
             Type=oneshot\n\
             WorkingDirectory={}\n\
             ExecStart=/bin/bash -c '{} -p \"{}\" --allowedTools \"{}\" >> \"{}\" 2>&1'\n\
             TimeoutStartSec={}\n",
            task.name,
            self.config.schedules_file().display(),
            task.working_directory.display(),
            self.config.runner_bin,
            task.command,
            tools,
            log.display(),
            task.timeout
        )
    }

    fn render_timer_unit(&self, task: &Task) -> String {
        format!(
            "[Unit]\n\
             Description=Timer for scheduled task: {}\n\
             \n\
             [Timer]\n\
             OnCalendar={}\n\
             Persistent=true\n\
             \n\
             [Install]\n\
             WantedBy=timers.target\n",
            task.name,
            cron_to_calendar(&task.schedule)
        )
    }

    /// Remove previously generated units in this project's namespace.
    /// Units of other projects (different hash) are never touched.
    async fn remove_project_units(&self, dry_run: bool) -> Result<()> {
        let prefix = format!("{UNIT_PREFIX}-{}-", self.project_hash());
        let dir = &self.config.systemd_user_dir;
        if !dir.exists() {
            return Ok(());
        }

        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with(&prefix) || !name.ends_with(".service") {
                continue;
            }
            if dry_run {
                continue;
            }
            let timer_name = name.replace(".service", ".timer");
            let timer_path = dir.join(&timer_name);
            if timer_path.exists() {
                let _ = systemctl_user(&["disable", timer_name.as_str()]).await;
                fs::remove_file(&timer_path).await?;
            }
            fs::remove_file(entry.path()).await?;
        }
        Ok(())
    }

    async fn sync_systemd(&self, tasks: &[&Task], dry_run: bool) -> Result<SyncOutcome> {
        self.remove_project_units(dry_run).await?;

        let mut applied = Vec::new();
        let mut failed = Vec::new();
        let mut rendered = String::new();

        for task in tasks {
            let base = self.unit_base(&task.id);
            let service = self.render_service_unit(task);
            let timer = self.render_timer_unit(task);

            if dry_run {
                rendered.push_str(&format!("# {base}.service\n{service}\n"));
                rendered.push_str(&format!("# {base}.timer\n{timer}\n"));
                applied.push(task.id.clone());
                continue;
            }

            match self.install_unit_pair(&base, &service, &timer).await {
                Ok(()) => applied.push(task.id.clone()),
                Err(e) => {
                    tracing::error!("Failed to install unit for task {}: {e}", task.id);
                    failed.push(SyncFailure {
                        task_id: task.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if !dry_run {
            tracing::info!(
                "Systemd sync: {} installed, {} failed",
                applied.len(),
                failed.len()
            );
        }
        Ok(SyncOutcome {
            method: SchedulerKind::Systemd,
            dry_run,
            applied,
            failed,
            backup: None,
            rendered: if dry_run { Some(rendered) } else { None },
        })
    }

    /// Write, reload, enable, and start one service+timer pair
    async fn install_unit_pair(&self, base: &str, service: &str, timer: &str) -> Result<()> {
        fs::create_dir_all(&self.config.systemd_user_dir).await?;
        fs::create_dir_all(self.config.logs_dir()).await?;

        let timer_name = format!("{base}.timer");
        fs::write(
            self.config.systemd_user_dir.join(format!("{base}.service")),
            service,
        )
        .await?;
        fs::write(self.config.systemd_user_dir.join(&timer_name), timer).await?;

        systemctl_user(&["daemon-reload"]).await?;
        systemctl_user(&["enable", timer_name.as_str()]).await?;
        systemctl_user(&["start", timer_name.as_str()]).await?;
        Ok(())
    }
}

/// Enabled tasks whose stored schedule still parses; anything else is
/// skipped with a warning rather than failing the whole sync.
fn installable_tasks(tasks: &[Task]) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| t.enabled)
        .filter(|t| match CronExpression::parse(&t.schedule) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    "Skipping task {} with invalid schedule '{}': {e}",
                    t.id,
                    t.schedule
                );
                false
            }
        })
        .collect()
}

/// Remove a previously installed managed block, keeping all other lines
fn strip_managed_block(content: &str) -> Vec<String> {
    let mut kept = Vec::new();
    let mut in_block = false;
    for line in content.lines() {
        if line.trim() == CRONTAB_BLOCK_BEGIN {
            in_block = true;
            continue;
        }
        if line.trim() == CRONTAB_BLOCK_END {
            in_block = false;
            continue;
        }
        if !in_block {
            kept.push(line.to_string());
        }
    }
    kept
}

/// Current user crontab content, or None when unavailable
async fn read_crontab() -> Option<String> {
    let output = Command::new("crontab").arg("-l").output().await.ok()?;
    if output.status.success() {
        Some(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        None
    }
}

/// Replace the user crontab via `crontab -`
async fn install_crontab(content: &str) -> Result<()> {
    let mut child = Command::new("crontab")
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(content.as_bytes()).await?;
    }
    let output = child.wait_with_output().await?;
    if !output.status.success() {
        return Err(SchedError::Sync(format!(
            "crontab install failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

/// Run `systemctl --user <args>`, mapping failure to a sync error
async fn systemctl_user(args: &[&str]) -> Result<()> {
    let output = Command::new("systemctl")
        .arg("--user")
        .args(args)
        .output()
        .await?;
    if !output.status.success() {
        return Err(SchedError::Sync(format!(
            "systemctl --user {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

async fn probe_systemd() -> bool {
    let probe = Command::new("systemctl").args(["--user", "status"]).output();
    match timeout(PROBE_TIMEOUT, probe).await {
        // 0 = running, 3 = no active units; both mean the session is usable
        Ok(Ok(output)) => matches!(output.status.code(), Some(0) | Some(3)),
        _ => false,
    }
}

async fn probe_cron() -> bool {
    let probe = Command::new("crontab").arg("-l").output();
    matches!(timeout(PROBE_TIMEOUT, probe).await, Ok(Ok(_)))
}
