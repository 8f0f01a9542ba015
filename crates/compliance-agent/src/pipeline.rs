//! The pipeline facade: `process`, `modify`, `download`, `status`.
//!
//! Orchestrates validation, extraction, analysis, and modification over the
//! session store. A session is created only after analysis succeeds, so a
//! failed provider call leaves nothing behind and a retried upload starts
//! clean.

use std::sync::Arc;

use tracing::info;

use session_store::{SessionStore, SessionView, StoreError};
use shared_types::{ComplianceReport, FileId, ModifiedDocument};

use crate::analyzer::ComplianceAnalyzer;
use crate::error::PipelineError;
use crate::modifier::DocumentModifier;
use crate::policy::CallPolicy;
use crate::provider::ChatProvider;

pub struct Pipeline {
    store: SessionStore,
    analyzer: ComplianceAnalyzer,
    modifier: DocumentModifier,
}

impl Pipeline {
    pub fn new(provider: Arc<dyn ChatProvider>, policy: CallPolicy) -> Self {
        Self {
            store: SessionStore::new(),
            analyzer: ComplianceAnalyzer::new(Arc::clone(&provider), policy.clone()),
            modifier: DocumentModifier::new(provider, policy),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Upload + analyze: validate the file, extract its text, run the
    /// compliance analysis, and store everything under a fresh id.
    pub async fn process(
        &self,
        filename: &str,
        data: Vec<u8>,
    ) -> Result<(FileId, ComplianceReport), PipelineError> {
        let file = doc_extract::validate_upload(filename, data)?;
        let text = doc_extract::extract_text(&file)?;
        let report = self.analyzer.analyze(&text).await?;

        let id = self.store.put(file, text).await;
        self.store.set_report(&id, report.clone()).await?;
        info!(
            file_id = %id,
            score = report.compliance_score,
            violations = report.violations.len(),
            "document processed"
        );
        Ok((id, report))
    }

    /// Produce (or reproduce) the corrected document for an analyzed
    /// session. Concurrent calls for the same id queue behind each other;
    /// the later writer's result replaces the earlier one wholesale.
    pub async fn modify(&self, id: &FileId) -> Result<ModifiedDocument, PipelineError> {
        let view = self.store.get(id).await?;
        let report = view.report.as_ref().ok_or_else(|| StoreError::InvalidState {
            id: id.clone(),
            stage: view.stage(),
            operation: "modify",
        })?;

        let _guard = self.store.modify_guard(id).await?;
        let doc = self
            .modifier
            .rewrite(&view.filename, &view.text, report)
            .await?;
        self.store.set_modified(id, doc.clone()).await?;
        info!(file_id = %id, "document modified");
        Ok(doc)
    }

    /// Serve the corrected document; only valid once `modify` completed.
    pub async fn download(&self, id: &FileId) -> Result<(String, Vec<u8>), PipelineError> {
        let doc = self.store.modified_document(id).await?;
        Ok((doc.filename, doc.content.into_bytes()))
    }

    pub async fn status(&self, id: &FileId) -> Result<SessionView, PipelineError> {
        Ok(self.store.get(id).await?)
    }
}
