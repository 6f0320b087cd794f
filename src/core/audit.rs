//! Append-only audit trail for catalog mutations
//!
//! Every admin edit records who did what with before/after snapshots.
//! Auditing is fire-and-forget: a failed write warns on stderr but
//! never blocks the mutation itself.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// One audit entry, serialized as a JSON line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: String,
    pub at: DateTime<Utc>,
    pub actor: String,
    /// Action name, e.g. "unit.create", "edge.delete"
    pub action: String,
    /// Entity code the action targeted
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<serde_json::Value>,
}

impl AuditRecord {
    pub fn new(
        actor: &str,
        action: &str,
        subject: &str,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: Ulid::new().to_string(),
            at: Utc::now(),
            actor: actor.to_string(),
            action: action.to_string(),
            subject: subject.to_string(),
            before,
            after,
        }
    }
}

/// Destination for audit records
pub trait AuditSink {
    fn record(&self, record: &AuditRecord);
}

/// JSONL file sink at `.metron/audit.jsonl`
pub struct JsonlAuditLog {
    path: PathBuf,
}

impl JsonlAuditLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn append(&self, record: &AuditRecord) -> std::io::Result<()> {
        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

impl AuditSink for JsonlAuditLog {
    fn record(&self, record: &AuditRecord) {
        if let Err(e) = self.append(record) {
            eprintln!("warning: audit log write failed: {}", e);
        }
    }
}

/// Discards all records (tests)
pub struct NullAudit;

impl AuditSink for NullAudit {
    fn record(&self, _record: &AuditRecord) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_jsonl_appends_one_line_per_record() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("audit.jsonl");
        let log = JsonlAuditLog::new(path.clone());

        log.record(&AuditRecord::new(
            "alice",
            "unit.create",
            "cm",
            None,
            Some(serde_json::json!({"code": "cm"})),
        ));
        log.record(&AuditRecord::new(
            "alice",
            "unit.delete",
            "cm",
            Some(serde_json::json!({"code": "cm"})),
            None,
        ));

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: AuditRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.action, "unit.create");
        assert_eq!(first.subject, "cm");
        assert!(first.before.is_none());
        assert!(first.after.is_some());
    }
}
