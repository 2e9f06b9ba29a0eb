//! Upload-and-seal state machine.
//!
//! `SealingMachine::dispatch` is a pure transition function: it mutates the
//! machine for one action and returns the side effects the driver must run.
//! Async results (hash, seal probe) carry the generation of the file
//! selection that started them; results from an older generation are dropped.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;

use crate::error::SealError;
use crate::form::LoanForm;
use crate::models::{
    DraftSnapshot, FileMetadata, SealMode, SealModeToggles, SealRequest, SealResponse,
    SelectedFile, UploadFailure, UploadState, VerifyResult,
};
use crate::validation::{FieldError, FieldId};

/// Heartbeat ceiling while the seal call is in flight.
pub const PROGRESS_CEILING: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Validating,
    Submitting,
    Success,
    Failed,
}

/// The document being prepared for sealing.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadDraft {
    pub file: Option<SelectedFile>,
    /// Empty until the hash of `file` has been computed
    pub file_hash: String,
    pub form: LoanForm,
    pub etid: u32,
}

impl UploadDraft {
    pub fn new(etid: u32) -> Self {
        Self {
            file: None,
            file_hash: String::new(),
            form: LoanForm::new(),
            etid,
        }
    }

    pub fn metadata_text(&self) -> String {
        self.form.metadata_text()
    }

    pub fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot {
            file: self.file.as_ref().map(SelectedFile::metadata),
            metadata: self.metadata_text(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug)]
pub enum Action {
    FileSelected(SelectedFile),
    HashComputed { generation: u64, hash: String },
    HashFailed { generation: u64, error: SealError },
    SealCheckCompleted {
        generation: u64,
        result: Option<VerifyResult>,
    },
    FieldChanged { field: FieldId, value: String },
    /// Full replacement text from the raw metadata editor
    MetadataEdited(String),
    DocumentImported(serde_json::Value),
    DraftRestored(DraftSnapshot),
    QuantumSafeToggled(bool),
    MaximumSecurityToggled(bool),
    EtidChanged(u32),
    SubmitRequested,
    ProgressTick,
    SealSucceeded(SealResponse),
    SealFailed(SealError),
    RetryRequested,
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ComputeHash { generation: u64, path: PathBuf },
    CheckExistingSeal {
        generation: u64,
        hash: String,
        etid: u32,
    },
    Seal { mode: SealMode, request: SealRequest },
    SaveDraft(DraftSnapshot),
    ClearDraft,
}

#[derive(Debug, Clone)]
pub struct SealingMachine {
    phase: Phase,
    draft: UploadDraft,
    upload: UploadState,
    toggles: SealModeToggles,
    existing_seal: Option<VerifyResult>,
    result: Option<SealResponse>,
    submitted_mode: Option<SealMode>,
    last_error: Option<SealError>,
    /// Non-blocking notification (hash failure, bad metadata JSON, ...)
    notice: Option<UploadFailure>,
    field_errors: BTreeMap<FieldId, String>,
    restored_file: Option<FileMetadata>,
    generation: u64,
    default_etid: u32,
    progress_step: u8,
}

impl SealingMachine {
    pub fn new(default_etid: u32, progress_step: u8) -> Self {
        Self {
            phase: Phase::Idle,
            draft: UploadDraft::new(default_etid),
            upload: UploadState::default(),
            toggles: SealModeToggles::default(),
            existing_seal: None,
            result: None,
            submitted_mode: None,
            last_error: None,
            notice: None,
            field_errors: BTreeMap::new(),
            restored_file: None,
            generation: 0,
            default_etid,
            progress_step: progress_step.max(1),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn draft(&self) -> &UploadDraft {
        &self.draft
    }

    pub fn upload(&self) -> &UploadState {
        &self.upload
    }

    pub fn mode(&self) -> SealMode {
        self.toggles.mode()
    }

    pub fn toggles(&self) -> SealModeToggles {
        self.toggles
    }

    pub fn existing_seal(&self) -> Option<&VerifyResult> {
        self.existing_seal.as_ref()
    }

    pub fn result(&self) -> Option<&SealResponse> {
        self.result.as_ref()
    }

    /// Mode used by the last submission.
    pub fn submitted_mode(&self) -> Option<SealMode> {
        self.submitted_mode
    }

    pub fn last_error(&self) -> Option<&SealError> {
        self.last_error.as_ref()
    }

    pub fn notice(&self) -> Option<&UploadFailure> {
        self.notice.as_ref()
    }

    pub fn field_error(&self, field: FieldId) -> Option<&str> {
        self.field_errors.get(&field).map(String::as_str)
    }

    pub fn restored_file(&self) -> Option<&FileMetadata> {
        self.restored_file.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True when the backend already holds a valid seal for the current hash.
    pub fn is_already_sealed(&self) -> bool {
        self.existing_seal.as_ref().is_some_and(|r| r.is_valid)
    }

    pub fn can_submit(&self) -> bool {
        matches!(self.phase, Phase::Idle | Phase::Failed)
            && self.draft.file.is_some()
            && !self.draft.file_hash.is_empty()
            && !self.is_already_sealed()
    }

    pub fn can_retry(&self) -> bool {
        self.phase == Phase::Failed && self.upload.error.as_ref().is_some_and(|e| e.retryable)
    }

    fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Validating | Phase::Submitting)
    }

    fn save_draft(&self) -> Effect {
        Effect::SaveDraft(self.draft.snapshot())
    }

    fn record_inline(&mut self, field: FieldId, error: Option<FieldError>) {
        match error {
            Some(err) => {
                self.field_errors.insert(field, err.message);
            }
            None => {
                self.field_errors.remove(&field);
            }
        }
    }

    fn is_stale(&self, generation: u64, what: &str) -> bool {
        if generation != self.generation {
            tracing::debug!(
                generation,
                current = self.generation,
                "Dropping stale {} result",
                what
            );
            return true;
        }
        false
    }

    pub fn dispatch(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::FileSelected(file) => {
                if self.is_busy() {
                    tracing::debug!("Ignoring file selection while a seal is in flight");
                    return Vec::new();
                }
                self.generation += 1;
                let path = file.path.clone();
                self.draft.file = Some(file);
                self.draft.file_hash.clear();
                self.existing_seal = None;
                self.result = None;
                self.notice = None;
                self.restored_file = None;
                if self.phase != Phase::Idle {
                    self.phase = Phase::Idle;
                    self.upload = UploadState::default();
                    self.last_error = None;
                }
                vec![
                    Effect::ComputeHash {
                        generation: self.generation,
                        path,
                    },
                    self.save_draft(),
                ]
            }
            Action::HashComputed { generation, hash } => {
                if self.is_stale(generation, "hash") {
                    return Vec::new();
                }
                self.draft.file_hash = hash.clone();
                vec![Effect::CheckExistingSeal {
                    generation,
                    hash,
                    etid: self.draft.etid,
                }]
            }
            Action::HashFailed { generation, error } => {
                if self.is_stale(generation, "hash") {
                    return Vec::new();
                }
                error.log("Failed to calculate file hash");
                self.notice = Some(UploadFailure::from(&error));
                Vec::new()
            }
            Action::SealCheckCompleted { generation, result } => {
                if self.is_stale(generation, "seal check") {
                    return Vec::new();
                }
                if let Some(existing) = result.as_ref().filter(|r| r.is_valid) {
                    tracing::info!(
                        artifact_id = existing.artifact_id.as_deref().unwrap_or("unknown"),
                        "Document is already sealed"
                    );
                }
                self.existing_seal = result;
                Vec::new()
            }
            Action::FieldChanged { field, value } => {
                if self.is_busy() {
                    return Vec::new();
                }
                let error = self.draft.form.set(field, &value);
                self.record_inline(field, error);
                vec![self.save_draft()]
            }
            Action::MetadataEdited(text) => {
                if self.is_busy() {
                    return Vec::new();
                }
                match self.draft.form.apply_metadata_text(&text) {
                    Ok(errors) => {
                        self.field_errors = errors
                            .into_iter()
                            .map(|e| (e.field, e.message))
                            .collect();
                        self.notice = None;
                        vec![self.save_draft()]
                    }
                    Err(err) => {
                        self.notice = Some(UploadFailure::from(&err));
                        Vec::new()
                    }
                }
            }
            Action::DocumentImported(document) => {
                if self.is_busy() {
                    return Vec::new();
                }
                let written = self.draft.form.populate_from_json(&document);
                for field in written {
                    let error =
                        crate::validation::validate_field(field, self.draft.form.get(field));
                    self.record_inline(field, error);
                }
                vec![self.save_draft()]
            }
            Action::DraftRestored(snapshot) => {
                if self.is_busy() {
                    return Vec::new();
                }
                match self.draft.form.apply_metadata_text(&snapshot.metadata) {
                    Ok(_) => self.restored_file = snapshot.file,
                    Err(err) => {
                        tracing::warn!(error = %err, "Draft metadata could not be restored");
                    }
                }
                Vec::new()
            }
            Action::QuantumSafeToggled(enabled) => {
                if !self.is_busy() {
                    self.toggles.set_quantum_safe(enabled);
                }
                Vec::new()
            }
            Action::MaximumSecurityToggled(enabled) => {
                if !self.is_busy() {
                    self.toggles.set_maximum_security(enabled);
                }
                Vec::new()
            }
            Action::EtidChanged(etid) => {
                if self.is_busy() || etid == self.draft.etid {
                    return Vec::new();
                }
                self.draft.etid = etid;
                self.existing_seal = None;
                if self.draft.file_hash.is_empty() {
                    // The pending hash result will check against the new etid.
                    return Vec::new();
                }
                // A check for the previous etid may still be in flight.
                self.generation += 1;
                vec![Effect::CheckExistingSeal {
                    generation: self.generation,
                    hash: self.draft.file_hash.clone(),
                    etid,
                }]
            }
            Action::SubmitRequested => self.begin_submit(),
            Action::RetryRequested => {
                if !self.can_retry() {
                    tracing::debug!(phase = ?self.phase, "Retry not available");
                    return Vec::new();
                }
                self.begin_submit()
            }
            Action::ProgressTick => {
                if self.phase == Phase::Submitting {
                    self.upload.progress = self
                        .upload
                        .progress
                        .saturating_add(self.progress_step)
                        .min(PROGRESS_CEILING);
                }
                Vec::new()
            }
            Action::SealSucceeded(response) => {
                if self.phase != Phase::Submitting {
                    return Vec::new();
                }
                tracing::info!(
                    artifact_id = %response.artifact_id,
                    walacor_tx_id = %response.walacor_tx_id,
                    "Document sealed"
                );
                self.phase = Phase::Success;
                self.upload.is_uploading = false;
                self.upload.progress = 100;
                self.upload.error = None;
                self.last_error = None;
                self.result = Some(response);
                vec![Effect::ClearDraft]
            }
            Action::SealFailed(error) => {
                if self.phase != Phase::Submitting {
                    return Vec::new();
                }
                error.log("Sealing failed");
                self.phase = Phase::Failed;
                self.upload.is_uploading = false;
                self.upload.progress = 0;
                self.upload.validation_errors = error.field_errors().to_vec();
                self.upload.error = Some(UploadFailure::from(&error));
                self.last_error = Some(error);
                vec![self.save_draft()]
            }
            Action::Reset => {
                tracing::info!("Resetting upload workflow");
                let generation = self.generation + 1;
                *self = SealingMachine::new(self.default_etid, self.progress_step);
                self.generation = generation;
                vec![Effect::ClearDraft]
            }
        }
    }

    /// Idle/Failed → Validating → Submitting, or back to Idle on validation failure.
    fn begin_submit(&mut self) -> Vec<Effect> {
        if !matches!(self.phase, Phase::Idle | Phase::Failed) {
            tracing::debug!(phase = ?self.phase, "Submit ignored");
            return Vec::new();
        }
        if self.is_already_sealed() {
            let artifact = self
                .existing_seal
                .as_ref()
                .and_then(|r| r.artifact_id.clone())
                .unwrap_or_default();
            self.notice = Some(UploadFailure::from(&SealError::AlreadySealed(artifact)));
            return Vec::new();
        }

        self.phase = Phase::Validating;

        let hash = self.draft.file_hash.clone();
        let Some(file) = self.draft.file.clone().filter(|_| !hash.is_empty()) else {
            return self.fail_validation(SealError::InvalidInput(
                "Select a document and wait for its hash before sealing".to_string(),
            ));
        };

        let request = match self
            .draft
            .form
            .to_seal_request(&file, &hash, self.draft.etid)
        {
            Ok(request) => request,
            Err(err) => return self.fail_validation(err),
        };

        let mode = self.toggles.mode();
        tracing::info!(mode = %mode, file = %file.file_name, "Submitting document for sealing");
        self.phase = Phase::Submitting;
        self.submitted_mode = Some(mode);
        self.last_error = None;
        self.notice = None;
        self.upload = UploadState {
            is_uploading: true,
            progress: 0,
            error: None,
            validation_errors: Vec::new(),
        };
        vec![Effect::Seal { mode, request }]
    }

    fn fail_validation(&mut self, error: SealError) -> Vec<Effect> {
        let errors = error.field_errors().to_vec();
        for err in &errors {
            self.field_errors.insert(err.field, err.message.clone());
        }
        self.phase = Phase::Idle;
        self.upload.is_uploading = false;
        self.upload.progress = 0;
        self.upload.validation_errors = errors;
        self.upload.error = Some(UploadFailure::from(&error));
        self.last_error = Some(error);
        Vec::new()
    }
}
