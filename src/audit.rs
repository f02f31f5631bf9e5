//! Append-only audit trail
//!
//! Every mutating operation appends one line to the audit file:
//!
//! ```text
//! 2026-08-08T09:15:02Z CREATE task=swift-scan-042 user=alice session=s-7f2 schedule=0 9 * * 1-5
//! ```
//!
//! Entries are never modified or deleted.

use chrono::{DateTime, SecondsFormat, Utc};
use std::path::PathBuf;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::config::SchedulerConfig;
use crate::types::Result;

/// Auditable actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Create,
    Enable,
    Disable,
    Delete,
    Sync,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuditAction::Create => "CREATE",
            AuditAction::Enable => "ENABLE",
            AuditAction::Disable => "DISABLE",
            AuditAction::Delete => "DELETE",
            AuditAction::Sync => "SYNC",
        };
        write!(f, "{s}")
    }
}

/// Append-only audit log bound to one project's audit file
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
    user: String,
    session: String,
}

impl AuditLog {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            path: config.audit_log_file(),
            user: config.user.clone(),
            session: config.session_id.clone(),
        }
    }

    /// Append one entry; the parent directory is created on demand.
    pub async fn record(
        &self,
        action: AuditAction,
        task_id: &str,
        details: Option<&str>,
    ) -> Result<()> {
        let line = format_entry(Utc::now(), action, task_id, &self.user, &self.session, details);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Render one audit line, newline-terminated
fn format_entry(
    timestamp: DateTime<Utc>,
    action: AuditAction,
    task_id: &str,
    user: &str,
    session: &str,
    details: Option<&str>,
) -> String {
    let ts = timestamp.to_rfc3339_opts(SecondsFormat::Secs, true);
    match details {
        Some(details) => format!("{ts} {action} task={task_id} user={user} session={session} {details}\n"),
        None => format!("{ts} {action} task={task_id} user={user} session={session}\n"),
    }
}
