//! Async driver for [`SealingMachine`].
//!
//! The session feeds actions to the machine and executes the effects it
//! returns: hashing on the blocking pool, the existing-seal probe, the seal
//! call with its progress heartbeat, and draft persistence.

use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::config::ClientConfig;
use crate::error::SealError;
use crate::hashing::{hash_file, inspect_file};
use crate::models::{DraftSnapshot, SealMode, SealModeToggles, SealRequest, SealResponse};
use crate::store::LocalStore;
use crate::validation::FieldId;

use super::backend::{check_existing_seal, SealingBackend};
use super::machine::{Action, Effect, Phase, SealingMachine};

pub struct SealingSession<B> {
    backend: B,
    store: Option<LocalStore>,
    machine: SealingMachine,
    max_file_size: u64,
    progress_tick: Duration,
    progress: watch::Sender<u8>,
}

impl<B: SealingBackend> SealingSession<B> {
    pub fn new(backend: B, config: &ClientConfig) -> Self {
        let (progress, _) = watch::channel(0);
        Self {
            backend,
            store: Some(LocalStore::open(&config.state_dir)),
            machine: SealingMachine::new(config.default_etid, config.progress_step),
            max_file_size: config.max_file_size_bytes,
            progress_tick: config.progress_tick(),
            progress,
        }
    }

    /// Replace the draft store. `None` disables draft persistence.
    pub fn with_store(mut self, store: Option<LocalStore>) -> Self {
        self.store = store;
        self
    }

    pub fn machine(&self) -> &SealingMachine {
        &self.machine
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Heartbeat progress, 0..=100.
    pub fn subscribe_progress(&self) -> watch::Receiver<u8> {
        self.progress.subscribe()
    }

    pub async fn dispatch(&mut self, action: Action) {
        let mut queue: VecDeque<Effect> = self.machine.dispatch(action).into();
        self.publish_progress();
        while let Some(effect) = queue.pop_front() {
            if let Some(next) = self.run_effect(effect).await {
                queue.extend(self.machine.dispatch(next));
                self.publish_progress();
            }
        }
    }

    /// Pick a file, hash it and probe for an existing seal.
    pub async fn select_file(&mut self, path: &Path) -> Result<(), SealError> {
        let file = inspect_file(path, self.max_file_size)?;
        tracing::debug!(file = %file.file_name, size = file.size, "File selected");
        self.dispatch(Action::FileSelected(file)).await;
        Ok(())
    }

    /// Set one form field. Returns the inline error, if any.
    pub async fn set_field(&mut self, field: FieldId, value: &str) -> Option<String> {
        self.dispatch(Action::FieldChanged {
            field,
            value: value.to_string(),
        })
        .await;
        self.machine.field_error(field).map(str::to_string)
    }

    /// Replace the form from raw metadata JSON text. Unparseable text leaves
    /// the form untouched.
    pub async fn edit_metadata(&mut self, text: &str) -> Result<(), SealError> {
        self.dispatch(Action::MetadataEdited(text.to_string())).await;
        match self.machine.notice() {
            Some(notice) => Err(SealError::InvalidInput(notice.message.clone())),
            None => Ok(()),
        }
    }

    /// Pre-fill the form from a JSON document on disk.
    pub async fn import_document(&mut self, path: &Path) -> Result<(), SealError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SealError::InvalidInput(format!("{}: {}", path.display(), e)))?;
        let document: serde_json::Value = serde_json::from_str(&raw)?;
        self.dispatch(Action::DocumentImported(document)).await;
        Ok(())
    }

    pub async fn set_mode(&mut self, mode: SealMode) {
        let toggles = SealModeToggles::from(mode);
        self.dispatch(Action::QuantumSafeToggled(toggles.quantum_safe()))
            .await;
        self.dispatch(Action::MaximumSecurityToggled(toggles.maximum_security()))
            .await;
    }

    pub async fn set_etid(&mut self, etid: u32) {
        self.dispatch(Action::EtidChanged(etid)).await;
    }

    /// Load the saved draft, if any, into the form.
    pub async fn restore_draft(&mut self) -> Result<Option<DraftSnapshot>, SealError> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        let Some(snapshot) = store.load_draft()? else {
            return Ok(None);
        };
        tracing::info!(saved_at = %snapshot.timestamp, "Restoring saved draft");
        self.dispatch(Action::DraftRestored(snapshot.clone())).await;
        Ok(Some(snapshot))
    }

    pub async fn submit(&mut self) -> Result<SealResponse, SealError> {
        if self.machine.phase() == Phase::Success {
            return Err(SealError::InvalidInput(
                "This document was already sealed in this session; reset to start over"
                    .to_string(),
            ));
        }
        self.dispatch(Action::SubmitRequested).await;
        self.outcome()
    }

    pub async fn retry(&mut self) -> Result<SealResponse, SealError> {
        if !self.machine.can_retry() {
            return Err(SealError::InvalidInput(
                "There is no retryable failure to retry".to_string(),
            ));
        }
        self.dispatch(Action::RetryRequested).await;
        self.outcome()
    }

    pub async fn reset(&mut self) {
        self.dispatch(Action::Reset).await;
    }

    fn outcome(&self) -> Result<SealResponse, SealError> {
        if self.machine.phase() == Phase::Success {
            return self
                .machine
                .result()
                .cloned()
                .ok_or_else(|| SealError::Unknown("Seal result missing".to_string()));
        }
        if self.machine.is_already_sealed() {
            let artifact = self
                .machine
                .existing_seal()
                .and_then(|r| r.artifact_id.clone())
                .unwrap_or_default();
            return Err(SealError::AlreadySealed(artifact));
        }
        Err(self.machine.last_error().cloned().unwrap_or_else(|| {
            SealError::InvalidInput("Submission is not available right now".to_string())
        }))
    }

    fn publish_progress(&self) {
        self.progress.send_replace(self.machine.upload().progress);
    }

    async fn run_effect(&mut self, effect: Effect) -> Option<Action> {
        match effect {
            Effect::ComputeHash { generation, path } => {
                let max_size = self.max_file_size;
                let result = tokio::task::spawn_blocking(move || hash_file(&path, max_size))
                    .await
                    .map_err(|e| SealError::Unknown(format!("hash task failed: {}", e)))
                    .and_then(|r| r);
                Some(match result {
                    Ok(digest) => {
                        tracing::debug!(hash = %digest.hash, "File hashed");
                        Action::HashComputed {
                            generation,
                            hash: digest.hash,
                        }
                    }
                    Err(error) => Action::HashFailed { generation, error },
                })
            }
            Effect::CheckExistingSeal {
                generation,
                hash,
                etid,
            } => {
                let result = check_existing_seal(&self.backend, &hash, etid).await;
                Some(Action::SealCheckCompleted { generation, result })
            }
            Effect::Seal { mode, request } => Some(self.run_seal(mode, &request).await),
            Effect::SaveDraft(snapshot) => {
                if let Some(store) = &self.store {
                    if let Err(e) = store.save_draft(&snapshot) {
                        e.log("Failed to save draft");
                    }
                }
                None
            }
            Effect::ClearDraft => {
                if let Some(store) = &self.store {
                    if let Err(e) = store.clear_draft() {
                        e.log("Failed to clear draft");
                    }
                }
                None
            }
        }
    }

    /// Run the seal call while a ticker advances the heartbeat. The ticker is
    /// dropped as soon as the call settles, on either path.
    async fn run_seal(&mut self, mode: SealMode, request: &SealRequest) -> Action {
        let mut ticker = tokio::time::interval(self.progress_tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        let seal = self.backend.seal(mode, request);
        tokio::pin!(seal);

        let outcome = loop {
            tokio::select! {
                outcome = &mut seal => break outcome,
                _ = ticker.tick() => {
                    self.machine.dispatch(Action::ProgressTick);
                    self.progress.send_replace(self.machine.upload().progress);
                }
            }
        };

        match outcome {
            Ok(response) => Action::SealSucceeded(response),
            Err(error) => Action::SealFailed(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::complete_form;
    use crate::hashing::hash_bytes;
    use crate::models::{VerifyResponse, VerifyResult};
    use crate::ErrorKind;
    use crate::ErrorMetadata;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeBackend {
        existing: Option<VerifyResult>,
        verify_fails: bool,
        seal_delay: Duration,
        seal_results: Mutex<VecDeque<Result<SealResponse, SealError>>>,
        seal_calls: Mutex<Vec<(SealMode, SealRequest)>>,
    }

    impl FakeBackend {
        fn with_results(results: Vec<Result<SealResponse, SealError>>) -> Self {
            Self {
                seal_results: Mutex::new(results.into()),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<(SealMode, SealRequest)> {
            self.seal_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SealingBackend for FakeBackend {
        async fn verify(&self, _hash: &str, _etid: u32) -> Result<VerifyResponse, SealError> {
            if self.verify_fails {
                return Err(SealError::Network("connection refused".to_string()));
            }
            Ok(VerifyResponse {
                ok: self.existing.is_some(),
                data: self.existing.clone(),
                error: None,
            })
        }

        async fn seal(
            &self,
            mode: SealMode,
            request: &SealRequest,
        ) -> Result<SealResponse, SealError> {
            self.seal_calls
                .lock()
                .unwrap()
                .push((mode, request.clone()));
            if !self.seal_delay.is_zero() {
                tokio::time::sleep(self.seal_delay).await;
            }
            self.seal_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(SealError::Unknown("no scripted result".to_string())))
        }
    }

    fn sealed_response() -> SealResponse {
        SealResponse {
            artifact_id: "art-1".to_string(),
            walacor_tx_id: "tx-1".to_string(),
            sealed_at: "2026-10-17T09:30:00Z".to_string(),
            blockchain_proof: Some(serde_json::json!({"anchored": true})),
            comprehensive_seal: None,
            quantum_safe_seal: None,
            message: Some("sealed".to_string()),
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        store: LocalStore,
        pdf: std::path::PathBuf,
        content: Vec<u8>,
        config: ClientConfig,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("loan.pdf");
        let content: Vec<u8> = (0..2 * 1024 * 1024u32).map(|i| (i % 253) as u8).collect();
        std::fs::write(&pdf, &content).unwrap();
        let config = ClientConfig {
            state_dir: dir.path().join("state"),
            progress_tick_ms: 5,
            ..Default::default()
        };
        Fixture {
            store: LocalStore::open(&config.state_dir),
            _dir: dir,
            pdf,
            content,
            config,
        }
    }

    async fn ready_session(backend: FakeBackend, fx: &Fixture) -> SealingSession<FakeBackend> {
        let mut session =
            SealingSession::new(backend, &fx.config).with_store(Some(fx.store.clone()));
        session.select_file(&fx.pdf).await.unwrap();
        session
            .edit_metadata(&complete_form().metadata_text())
            .await
            .unwrap();
        session
    }

    #[tokio::test]
    async fn test_two_megabyte_pdf_seals_and_clears_draft() {
        let fx = fixture();
        let backend = FakeBackend::with_results(vec![Ok(sealed_response())]);
        let mut session = ready_session(backend, &fx).await;
        assert_eq!(session.machine().draft().file_hash, hash_bytes(&fx.content));
        assert!(session.machine().can_submit());
        assert!(fx.store.load_draft().unwrap().is_some());

        let progress = session.subscribe_progress();
        let response = session.submit().await.unwrap();
        assert_eq!(response.walacor_tx_id, "tx-1");
        assert_eq!(session.machine().phase(), Phase::Success);
        assert_eq!(*progress.borrow(), 100);

        let calls = session.backend().calls();
        assert_eq!(calls.len(), 1);
        let (mode, request) = &calls[0];
        assert_eq!(*mode, SealMode::Standard);
        assert_eq!(request.document_hash, hash_bytes(&fx.content));
        assert_eq!(request.file_size, 2 * 1024 * 1024);
        assert_eq!(request.file_name, "loan.pdf");
        assert_eq!(request.content_type, "application/pdf");
        assert_eq!(request.etid, 100001);

        assert_eq!(fx.store.load_draft().unwrap(), None);
    }

    #[tokio::test]
    async fn test_validation_failure_makes_no_seal_call() {
        let fx = fixture();
        let backend = FakeBackend::with_results(vec![Ok(sealed_response())]);
        let mut session = ready_session(backend, &fx).await;
        session.set_field(FieldId::BorrowerEmail, "").await;

        let err = session.submit().await.unwrap_err();
        assert_eq!(err.error_kind(), ErrorKind::Validation);
        assert_eq!(err.field_errors()[0].field, FieldId::BorrowerEmail);
        assert!(session.backend().calls().is_empty());
        assert_eq!(session.machine().phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_already_sealed_document_is_not_resubmitted() {
        let fx = fixture();
        let backend = FakeBackend {
            existing: Some(VerifyResult {
                is_valid: true,
                status: Some("sealed".to_string()),
                artifact_id: Some("art-0".to_string()),
                verified_at: None,
                details: None,
            }),
            ..FakeBackend::with_results(vec![Ok(sealed_response())])
        };
        let mut session = ready_session(backend, &fx).await;
        assert!(session.machine().is_already_sealed());
        assert!(!session.machine().can_submit());

        let err = session.submit().await.unwrap_err();
        assert_eq!(err, SealError::AlreadySealed("art-0".to_string()));
        assert!(session.backend().calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_seal_check_reads_as_not_sealed() {
        let fx = fixture();
        let backend = FakeBackend {
            verify_fails: true,
            ..FakeBackend::with_results(vec![Ok(sealed_response())])
        };
        let mut session = ready_session(backend, &fx).await;
        assert!(session.machine().existing_seal().is_none());
        assert!(session.submit().await.is_ok());
    }

    #[tokio::test]
    async fn test_quantum_safe_mode_uses_its_endpoint() {
        let fx = fixture();
        let backend = FakeBackend::with_results(vec![Ok(sealed_response())]);
        let mut session = ready_session(backend, &fx).await;
        session.set_mode(SealMode::QuantumSafe).await;
        session.submit().await.unwrap();

        let calls = session.backend().calls();
        assert_eq!(calls[0].0, SealMode::QuantumSafe);
        assert_eq!(calls[0].0.endpoint(), "seal-quantum-safe");
        assert_eq!(session.machine().submitted_mode(), Some(SealMode::QuantumSafe));
    }

    #[tokio::test]
    async fn test_retry_after_ledger_failure_resubmits_same_values() {
        let fx = fixture();
        let backend = FakeBackend::with_results(vec![
            Err(SealError::Walacor("Walacor service unavailable".to_string())),
            Ok(sealed_response()),
        ]);
        let mut session = ready_session(backend, &fx).await;
        let progress = session.subscribe_progress();

        let err = session.submit().await.unwrap_err();
        assert_eq!(err.error_kind(), ErrorKind::Walacor);
        assert_eq!(session.machine().phase(), Phase::Failed);
        assert_eq!(*progress.borrow(), 0);
        assert!(session.machine().can_retry());
        // Input survives the failure.
        let saved = fx.store.load_draft().unwrap().unwrap();
        assert!(saved.metadata.contains("LN-2026-0042"));

        session.retry().await.unwrap();
        let calls = session.backend().calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
        assert_eq!(fx.store.load_draft().unwrap(), None);
    }

    #[tokio::test]
    async fn test_retry_not_offered_for_rejected_input() {
        let fx = fixture();
        let backend = FakeBackend::with_results(vec![Err(SealError::from_response(
            422,
            r#"{"detail":"loan_id already exists"}"#,
        ))]);
        let mut session = ready_session(backend, &fx).await;
        session.submit().await.unwrap_err();
        assert!(!session.machine().can_retry());
        assert!(session.retry().await.is_err());
        assert_eq!(session.backend().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_heartbeat_stays_below_ceiling_until_completion() {
        let fx = fixture();
        let backend = FakeBackend {
            seal_delay: Duration::from_millis(80),
            ..FakeBackend::with_results(vec![Ok(sealed_response())])
        };
        let mut session = ready_session(backend, &fx).await;
        let mut progress = session.subscribe_progress();

        let watcher = tokio::spawn(async move {
            let mut seen = Vec::new();
            while progress.changed().await.is_ok() {
                let value = *progress.borrow_and_update();
                seen.push(value);
                if value == 100 {
                    break;
                }
            }
            seen
        });

        session.submit().await.unwrap();
        let seen = watcher.await.unwrap();
        assert_eq!(seen.last(), Some(&100));
        let before_completion = &seen[..seen.len() - 1];
        assert!(before_completion.iter().all(|p| *p <= 90));
        assert!(before_completion.iter().any(|p| *p > 0));
    }

    #[tokio::test]
    async fn test_draft_restores_into_new_session() {
        let fx = fixture();
        let first = ready_session(FakeBackend::default(), &fx).await;

        let mut second = SealingSession::new(FakeBackend::default(), &fx.config)
            .with_store(Some(fx.store.clone()));
        let snapshot = second.restore_draft().await.unwrap().unwrap();
        assert_eq!(snapshot.file.unwrap().file_name, "loan.pdf");
        assert_eq!(second.machine().draft().form, first.machine().draft().form);
    }

    #[tokio::test]
    async fn test_oversized_file_is_rejected_before_hashing() {
        let fx = fixture();
        let config = ClientConfig {
            max_file_size_bytes: 1024,
            ..fx.config.clone()
        };
        let mut session =
            SealingSession::new(FakeBackend::default(), &config).with_store(None);
        let err = session.select_file(&fx.pdf).await.unwrap_err();
        assert!(matches!(err, SealError::FileTooLarge { .. }));
        assert!(session.machine().draft().file.is_none());
    }

    #[tokio::test]
    async fn test_reset_clears_saved_draft() {
        let fx = fixture();
        let mut session = ready_session(FakeBackend::default(), &fx).await;
        assert!(fx.store.load_draft().unwrap().is_some());
        session.reset().await;
        assert_eq!(fx.store.load_draft().unwrap(), None);
        assert!(session.machine().draft().form.is_pristine());
    }
}
