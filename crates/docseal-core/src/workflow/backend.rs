use async_trait::async_trait;

use crate::error::SealError;
use crate::models::{SealMode, SealRequest, SealResponse, VerifyResponse, VerifyResult};

/// Remote sealing service as seen by the upload workflow.
#[async_trait]
pub trait SealingBackend: Send + Sync {
    /// Look up a document hash in a record schema.
    async fn verify(&self, hash: &str, etid: u32) -> Result<VerifyResponse, SealError>;

    /// Seal a document through the endpoint selected by `mode`.
    async fn seal(&self, mode: SealMode, request: &SealRequest)
        -> Result<SealResponse, SealError>;
}

/// Best-effort probe for an existing seal.
///
/// Transport errors, `ok: false` envelopes and empty payloads all read as
/// "not sealed"; the probe must never block the user from continuing.
pub async fn check_existing_seal<B>(backend: &B, hash: &str, etid: u32) -> Option<VerifyResult>
where
    B: SealingBackend + ?Sized,
{
    match backend.verify(hash, etid).await {
        Ok(response) => {
            let error = response.error.clone();
            let result = response.into_result();
            if result.is_none() {
                tracing::debug!(
                    hash = %hash,
                    error = error.as_deref().unwrap_or("none"),
                    "No existing seal found"
                );
            }
            result
        }
        Err(e) => {
            tracing::debug!(hash = %hash, error = %e, "Seal check failed, assuming not sealed");
            None
        }
    }
}
