//! Rendering of seal outcomes, failures and verification results.

use std::fmt::{Display, Formatter, Result as FmtResult};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::models::{SealMode, SealResponse, UploadFailure, VerifyResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofBadge {
    BlockchainProof,
    ComprehensiveSeal,
    QuantumSafeSeal,
}

impl ProofBadge {
    pub fn label(&self) -> &'static str {
        match self {
            ProofBadge::BlockchainProof => "Blockchain proof",
            ProofBadge::ComprehensiveSeal => "Comprehensive seal",
            ProofBadge::QuantumSafeSeal => "Quantum-safe seal",
        }
    }
}

/// Badges for the proof sections present in a seal response.
pub fn proof_badges(response: &SealResponse) -> Vec<ProofBadge> {
    let present = |section: &Option<serde_json::Value>| {
        section.as_ref().is_some_and(|v| !v.is_null())
    };
    let mut badges = Vec::new();
    if present(&response.blockchain_proof) {
        badges.push(ProofBadge::BlockchainProof);
    }
    if present(&response.comprehensive_seal) {
        badges.push(ProofBadge::ComprehensiveSeal);
    }
    if present(&response.quantum_safe_seal) {
        badges.push(ProofBadge::QuantumSafeSeal);
    }
    badges
}

/// RFC 3339 timestamps are shown in UTC; anything else is shown verbatim.
pub fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts
            .with_timezone(&Utc)
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessSummary {
    pub artifact_id: String,
    pub transaction_id: String,
    pub sealed_at: String,
    pub mode: SealMode,
    pub badges: Vec<ProofBadge>,
    pub message: Option<String>,
}

impl SuccessSummary {
    pub fn new(response: &SealResponse, mode: SealMode) -> Self {
        Self {
            artifact_id: response.artifact_id.clone(),
            transaction_id: response.walacor_tx_id.clone(),
            sealed_at: format_timestamp(&response.sealed_at),
            mode,
            badges: proof_badges(response),
            message: response.message.clone(),
        }
    }
}

impl Display for SuccessSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "Document sealed")?;
        writeln!(f, "  Artifact ID:    {}", self.artifact_id)?;
        writeln!(f, "  Transaction ID: {}", self.transaction_id)?;
        writeln!(f, "  Sealed at:      {}", self.sealed_at)?;
        write!(f, "  Mode:           {}", self.mode.label())?;
        if !self.badges.is_empty() {
            let labels: Vec<_> = self.badges.iter().map(ProofBadge::label).collect();
            write!(f, "\n  Proofs:         {}", labels.join(", "))?;
        }
        if let Some(message) = &self.message {
            write!(f, "\n  {}", message)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub failure: UploadFailure,
    pub support_mailto: String,
}

impl ErrorReport {
    /// `context` is merged into the support dump (file name, hash, mode, ...).
    pub fn new(failure: &UploadFailure, support_email: &str, context: serde_json::Value) -> Self {
        Self {
            support_mailto: support_mailto(support_email, failure, context),
            failure: failure.clone(),
        }
    }
}

impl Display for ErrorReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(
            f,
            "Sealing failed [{}] {}",
            self.failure.kind, self.failure.message
        )?;
        if let Some(action) = &self.failure.suggested_action {
            writeln!(f, "  {}", action)?;
        }
        if self.failure.retryable {
            writeln!(f, "  This error is retryable; your input has been kept.")?;
        }
        write!(f, "  Contact support: {}", self.support_mailto)
    }
}

/// `mailto:` link whose body is a pretty-printed JSON dump of the failure.
pub fn support_mailto(
    support_email: &str,
    failure: &UploadFailure,
    context: serde_json::Value,
) -> String {
    let dump = json!({
        "error": failure,
        "context": context,
        "reported_at": Utc::now().to_rfc3339(),
    });
    let body = serde_json::to_string_pretty(&dump).unwrap_or_else(|_| dump.to_string());
    let subject = format!("Sealing error {}", failure.code);
    format!(
        "mailto:{}?subject={}&body={}",
        support_email,
        urlencoding::encode(&subject),
        urlencoding::encode(&body)
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Valid,
    Tampered,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReport {
    pub status: VerificationStatus,
    pub artifact_id: Option<String>,
    pub provided_hash: String,
    pub stored_hash: Option<String>,
    pub artifact_type: Option<String>,
    pub created_at: Option<String>,
    pub verified_at: Option<String>,
    pub backend_status: Option<String>,
}

impl VerificationReport {
    pub fn new(provided_hash: &str, result: Option<&VerifyResult>) -> Self {
        let Some(result) = result else {
            return Self {
                status: VerificationStatus::NotFound,
                artifact_id: None,
                provided_hash: provided_hash.to_string(),
                stored_hash: None,
                artifact_type: None,
                created_at: None,
                verified_at: None,
                backend_status: None,
            };
        };
        let details = result.details.clone().unwrap_or_default();
        let status = if result.is_valid {
            VerificationStatus::Valid
        } else if result.is_tampered() {
            VerificationStatus::Tampered
        } else {
            VerificationStatus::NotFound
        };
        Self {
            status,
            artifact_id: result.artifact_id.clone(),
            provided_hash: details
                .provided_hash
                .unwrap_or_else(|| provided_hash.to_string()),
            stored_hash: details.stored_hash,
            artifact_type: details.artifact_type,
            created_at: details.created_at.as_deref().map(format_timestamp),
            verified_at: result.verified_at.as_deref().map(format_timestamp),
            backend_status: result.status.clone(),
        }
    }
}

impl Display for VerificationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let headline = match self.status {
            VerificationStatus::Valid => "VALID: document matches its sealed record",
            VerificationStatus::Tampered => "TAMPERED: document differs from its sealed record",
            VerificationStatus::NotFound => "NOT FOUND: no sealed record for this hash",
        };
        write!(f, "{}", headline)?;
        let rows = [
            ("Artifact ID", self.artifact_id.as_deref()),
            ("Provided hash", Some(self.provided_hash.as_str())),
            ("Stored hash", self.stored_hash.as_deref()),
            ("Artifact type", self.artifact_type.as_deref()),
            ("Created at", self.created_at.as_deref()),
            ("Verified at", self.verified_at.as_deref()),
        ];
        for (label, value) in rows {
            if let Some(value) = value {
                write!(f, "\n  {:<14} {}", format!("{}:", label), value)?;
            }
        }
        Ok(())
    }
}
