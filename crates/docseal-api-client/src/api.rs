//! Domain methods for the sealing API client.
//!
//! Request and response types live in `docseal_core::models`.

use crate::ApiClient;
use async_trait::async_trait;
use docseal_core::models::{
    AuditTrail, BorrowerInfo, SealMode, SealRequest, SealResponse, VerifyRequest, VerifyResponse,
};
use docseal_core::{SealError, SealingBackend};

impl ApiClient {
    /// Look up a document hash. `ok: false` is returned as-is, not as an error.
    pub async fn verify(&self, hash: &str, etid: u32) -> Result<VerifyResponse, SealError> {
        let body = VerifyRequest {
            etid,
            payload_hash: hash.to_string(),
        };
        self.post_json("/verify", &body).await
    }

    /// Seal a loan document through the endpoint for `mode`.
    pub async fn seal(
        &self,
        mode: SealMode,
        request: &SealRequest,
    ) -> Result<SealResponse, SealError> {
        let path = format!("/loan-documents/{}", mode.endpoint());
        tracing::info!(
            mode = %mode,
            loan_id = %request.loan_id,
            document_hash = %request.document_hash,
            "Sealing loan document"
        );
        self.post_json(&path, request).await
    }

    /// Proof bundle of a sealed artifact. The bundle layout is backend-defined.
    pub async fn get_proof(&self, artifact_id: &str) -> Result<serde_json::Value, SealError> {
        self.get("/proof", &[("id", artifact_id.to_string())]).await
    }

    pub async fn get_borrower(&self, document_id: &str) -> Result<BorrowerInfo, SealError> {
        let path = format!(
            "/loan-documents/{}/borrower",
            urlencoding::encode(document_id)
        );
        self.get(&path, &[]).await
    }

    pub async fn get_audit_trail(&self, document_id: &str) -> Result<AuditTrail, SealError> {
        let path = format!(
            "/loan-documents/{}/audit-trail",
            urlencoding::encode(document_id)
        );
        self.get(&path, &[]).await
    }
}

#[async_trait]
impl SealingBackend for ApiClient {
    async fn verify(&self, hash: &str, etid: u32) -> Result<VerifyResponse, SealError> {
        ApiClient::verify(self, hash, etid).await
    }

    async fn seal(
        &self,
        mode: SealMode,
        request: &SealRequest,
    ) -> Result<SealResponse, SealError> {
        ApiClient::seal(self, mode, request).await
    }
}
