//! In-memory session store for the compliance pipeline.
//!
//! Maps an opaque [`FileId`] to everything one upload accumulates over its
//! lifetime: the original file, its extracted text, the compliance report,
//! and the corrected output. Records live for the server process lifetime;
//! `remove` exists for explicit cleanup.
//!
//! Concurrency: the outer map sits behind an `RwLock` that is write-locked
//! only to insert or remove records, so unrelated sessions never serialize
//! against each other. Each record carries its own modify mutex; concurrent
//! modifies of the same id queue behind the in-flight one.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;

use shared_types::{ComplianceReport, FileId, ModifiedDocument, UploadedFile};

/// Pipeline stage of one session: `Uploaded → Analyzed → Modified`.
///
/// The stage is derived from which artifacts the record holds, so it can
/// never disagree with the stored data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStage {
    Uploaded,
    Analyzed,
    Modified,
}

impl std::fmt::Display for SessionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStage::Uploaded => "uploaded",
            SessionStage::Analyzed => "analyzed",
            SessionStage::Modified => "modified",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session not found: {0}")]
    NotFound(FileId),

    #[error("session {id} is in stage '{stage}', which does not allow {operation}")]
    InvalidState {
        id: FileId,
        stage: SessionStage,
        operation: &'static str,
    },

    #[error("a modify is already in flight for session {0}")]
    Conflict(FileId),
}

struct SessionRecord {
    file: UploadedFile,
    text: String,
    report: Option<ComplianceReport>,
    modified: Option<ModifiedDocument>,
    created_at: DateTime<Utc>,
    modify_lock: Arc<Mutex<()>>,
}

impl SessionRecord {
    fn stage(&self) -> SessionStage {
        if self.modified.is_some() {
            SessionStage::Modified
        } else if self.report.is_some() {
            SessionStage::Analyzed
        } else {
            SessionStage::Uploaded
        }
    }
}

/// Cloned-out snapshot of one session record.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub file_id: FileId,
    pub filename: String,
    pub text: String,
    pub report: Option<ComplianceReport>,
    pub modified: Option<ModifiedDocument>,
    pub created_at: DateTime<Utc>,
}

impl SessionView {
    pub fn stage(&self) -> SessionStage {
        if self.modified.is_some() {
            SessionStage::Modified
        } else if self.report.is_some() {
            SessionStage::Analyzed
        } else {
            SessionStage::Uploaded
        }
    }
}

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<FileId, SessionRecord>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an accepted upload and its extracted text under a fresh id.
    pub async fn put(&self, file: UploadedFile, text: String) -> FileId {
        let id = FileId::new();
        let record = SessionRecord {
            file,
            text,
            report: None,
            modified: None,
            created_at: Utc::now(),
            modify_lock: Arc::new(Mutex::new(())),
        };
        self.sessions.write().await.insert(id.clone(), record);
        debug!(file_id = %id, "session created");
        id
    }

    pub async fn get(&self, id: &FileId) -> Result<SessionView, StoreError> {
        let sessions = self.sessions.read().await;
        let record = sessions
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(SessionView {
            file_id: id.clone(),
            filename: record.file.filename.clone(),
            text: record.text.clone(),
            report: record.report.clone(),
            modified: record.modified.clone(),
            created_at: record.created_at,
        })
    }

    /// Attach the compliance report produced for this upload.
    pub async fn set_report(
        &self,
        id: &FileId,
        report: ComplianceReport,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        let record = sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        record.report = Some(report);
        Ok(())
    }

    /// Store the corrected output, replacing any previous one wholesale.
    ///
    /// Requires the session to be analyzed: a modify result without a
    /// report would put the record in an unreachable state.
    pub async fn set_modified(
        &self,
        id: &FileId,
        modified: ModifiedDocument,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        let record = sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if record.report.is_none() {
            return Err(StoreError::InvalidState {
                id: id.clone(),
                stage: record.stage(),
                operation: "storing a modified document",
            });
        }
        record.modified = Some(modified);
        Ok(())
    }

    /// Fetch the corrected output; only valid once a modify has completed.
    pub async fn modified_document(&self, id: &FileId) -> Result<ModifiedDocument, StoreError> {
        let sessions = self.sessions.read().await;
        let record = sessions
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        record
            .modified
            .clone()
            .ok_or_else(|| StoreError::InvalidState {
                id: id.clone(),
                stage: record.stage(),
                operation: "download",
            })
    }

    /// Per-session modify lock. Callers hold the returned guard for the
    /// duration of the provider call so a second modify for the same id
    /// queues instead of interleaving writes.
    pub async fn modify_guard(&self, id: &FileId) -> Result<OwnedMutexGuard<()>, StoreError> {
        let lock = self.modify_lock(id).await?;
        Ok(lock.lock_owned().await)
    }

    /// Fail-fast variant of [`modify_guard`](Self::modify_guard) for callers
    /// that prefer `Conflict` over queueing.
    pub async fn try_modify_guard(&self, id: &FileId) -> Result<OwnedMutexGuard<()>, StoreError> {
        let lock = self.modify_lock(id).await?;
        lock.try_lock_owned()
            .map_err(|_| StoreError::Conflict(id.clone()))
    }

    async fn modify_lock(&self, id: &FileId) -> Result<Arc<Mutex<()>>, StoreError> {
        let sessions = self.sessions.read().await;
        let record = sessions
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(Arc::clone(&record.modify_lock))
    }

    /// Explicit cleanup for one session.
    pub async fn remove(&self, id: &FileId) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        sessions
            .remove(id)
            .map(|_| debug!(file_id = %id, "session removed"))
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_types::{ComplianceStatus, DocumentFormat};

    fn upload(name: &str) -> UploadedFile {
        UploadedFile {
            filename: name.to_string(),
            format: DocumentFormat::Pdf,
            data: vec![0u8; 8],
        }
    }

    fn report(score: u8) -> ComplianceReport {
        ComplianceReport {
            overall_compliance: ComplianceStatus::Compliant,
            compliance_score: score,
            summary: "fine".to_string(),
            violations: vec![],
            suggestions: vec![],
        }
    }

    fn modified(content: &str) -> ModifiedDocument {
        ModifiedDocument {
            filename: "modified_a.txt".to_string(),
            content: content.to_string(),
            preview: content.to_string(),
        }
    }

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let store = SessionStore::new();
        let id = store.put(upload("a.pdf"), "hello".to_string()).await;
        let view = store.get(&id).await.unwrap();
        assert_eq!(view.filename, "a.pdf");
        assert_eq!(view.text, "hello");
        assert_eq!(view.stage(), SessionStage::Uploaded);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found_everywhere() {
        let store = SessionStore::new();
        let ghost = FileId::new();
        assert!(matches!(store.get(&ghost).await, Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.set_report(&ghost, report(90)).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.modified_document(&ghost).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(store.remove(&ghost).await, Err(StoreError::NotFound(_))));
        // A miss never creates a session.
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn stage_advances_with_artifacts() {
        let store = SessionStore::new();
        let id = store.put(upload("a.pdf"), "text".to_string()).await;
        store.set_report(&id, report(50)).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap().stage(), SessionStage::Analyzed);
        store.set_modified(&id, modified("fixed")).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap().stage(), SessionStage::Modified);
    }

    #[tokio::test]
    async fn modified_before_report_is_invalid_state() {
        let store = SessionStore::new();
        let id = store.put(upload("a.pdf"), "text".to_string()).await;
        let err = store.set_modified(&id, modified("x")).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidState {
                stage: SessionStage::Uploaded,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn download_before_modify_is_invalid_state() {
        let store = SessionStore::new();
        let id = store.put(upload("a.pdf"), "text".to_string()).await;
        store.set_report(&id, report(40)).await.unwrap();
        let err = store.modified_document(&id).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidState {
                stage: SessionStage::Analyzed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn second_modified_replaces_the_first() {
        let store = SessionStore::new();
        let id = store.put(upload("a.pdf"), "text".to_string()).await;
        store.set_report(&id, report(40)).await.unwrap();
        store.set_modified(&id, modified("first")).await.unwrap();
        store.set_modified(&id, modified("second")).await.unwrap();
        let doc = store.modified_document(&id).await.unwrap();
        assert_eq!(doc.content, "second");
    }

    #[tokio::test]
    async fn try_modify_guard_conflicts_while_held() {
        let store = SessionStore::new();
        let id = store.put(upload("a.pdf"), "text".to_string()).await;
        let _held = store.modify_guard(&id).await.unwrap();
        let err = store.try_modify_guard(&id).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn modify_guards_for_different_sessions_are_independent() {
        let store = SessionStore::new();
        let a = store.put(upload("a.pdf"), "a".to_string()).await;
        let b = store.put(upload("b.pdf"), "b".to_string()).await;
        let _guard_a = store.modify_guard(&a).await.unwrap();
        // Unrelated session is not serialized behind `a`.
        assert!(store.try_modify_guard(&b).await.is_ok());
    }

    #[tokio::test]
    async fn queued_modify_proceeds_after_guard_drops() {
        let store = SessionStore::new();
        let id = store.put(upload("a.pdf"), "text".to_string()).await;
        let guard = store.modify_guard(&id).await.unwrap();

        let store2 = store.clone();
        let id2 = id.clone();
        let waiter = tokio::spawn(async move { store2.modify_guard(&id2).await.is_ok() });

        drop(guard);
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn remove_forgets_the_session() {
        let store = SessionStore::new();
        let id = store.put(upload("a.pdf"), "text".to_string()).await;
        store.remove(&id).await.unwrap();
        assert!(matches!(store.get(&id).await, Err(StoreError::NotFound(_))));
    }
}
