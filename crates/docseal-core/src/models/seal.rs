use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which sealing endpoint a submission goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SealMode {
    #[default]
    Standard,
    MaximumSecurity,
    QuantumSafe,
}

impl SealMode {
    /// Path below `/api/loan-documents`.
    pub fn endpoint(&self) -> &'static str {
        match self {
            SealMode::Standard => "seal",
            SealMode::MaximumSecurity => "seal-maximum-security",
            SealMode::QuantumSafe => "seal-quantum-safe",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SealMode::Standard => "Standard",
            SealMode::MaximumSecurity => "Maximum security",
            SealMode::QuantumSafe => "Quantum-safe",
        }
    }
}

impl FromStr for SealMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "standard" => Ok(SealMode::Standard),
            "maximum-security" | "max-security" | "maximum" => Ok(SealMode::MaximumSecurity),
            "quantum-safe" | "quantum" => Ok(SealMode::QuantumSafe),
            _ => Err(anyhow::anyhow!("Invalid seal mode: {}", s)),
        }
    }
}

impl Display for SealMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.endpoint())
    }
}

/// The two mutually exclusive security toggles. Neither set means standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SealModeToggles {
    quantum_safe: bool,
    maximum_security: bool,
}

impl SealModeToggles {
    pub fn set_quantum_safe(&mut self, enabled: bool) {
        self.quantum_safe = enabled;
        if enabled {
            self.maximum_security = false;
        }
    }

    pub fn set_maximum_security(&mut self, enabled: bool) {
        self.maximum_security = enabled;
        if enabled {
            self.quantum_safe = false;
        }
    }

    pub fn quantum_safe(&self) -> bool {
        self.quantum_safe
    }

    pub fn maximum_security(&self) -> bool {
        self.maximum_security
    }

    pub fn mode(&self) -> SealMode {
        match (self.quantum_safe, self.maximum_security) {
            (true, _) => SealMode::QuantumSafe,
            (false, true) => SealMode::MaximumSecurity,
            (false, false) => SealMode::Standard,
        }
    }
}

impl From<SealMode> for SealModeToggles {
    fn from(mode: SealMode) -> Self {
        let mut toggles = SealModeToggles::default();
        match mode {
            SealMode::Standard => {}
            SealMode::MaximumSecurity => toggles.set_maximum_security(true),
            SealMode::QuantumSafe => toggles.set_quantum_safe(true),
        }
        toggles
    }
}

/// Body of the `POST /api/loan-documents/seal*` endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SealRequest {
    pub loan_id: String,
    pub document_type: String,
    pub loan_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_term_months: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_notes: Option<String>,
    pub created_by: String,
    pub document_hash: String,
    pub file_name: String,
    pub file_size: u64,
    pub content_type: String,
    pub etid: u32,
    pub borrower: BorrowerPayload,
    /// Free-form metadata entries that have no dedicated field.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowerPayload {
    pub full_name: String,
    pub date_of_birth: String,
    pub email: String,
    pub phone: String,
    pub address: AddressPayload,
    pub ssn_last4: String,
    pub id_type: String,
    pub id_last4: String,
    pub employment_status: String,
    pub annual_income: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co_borrower_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co_borrower_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressPayload {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

/// Response of a successful seal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SealResponse {
    pub artifact_id: String,
    pub walacor_tx_id: String,
    pub sealed_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockchain_proof: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comprehensive_seal: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantum_safe_seal: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggles_are_mutually_exclusive() {
        let mut toggles = SealModeToggles::default();
        assert_eq!(toggles.mode(), SealMode::Standard);

        toggles.set_quantum_safe(true);
        assert_eq!(toggles.mode(), SealMode::QuantumSafe);

        toggles.set_maximum_security(true);
        assert!(!toggles.quantum_safe());
        assert_eq!(toggles.mode(), SealMode::MaximumSecurity);

        toggles.set_quantum_safe(true);
        assert!(!toggles.maximum_security());

        toggles.set_quantum_safe(false);
        assert_eq!(toggles.mode(), SealMode::Standard);
    }

    #[test]
    fn test_mode_endpoints() {
        assert_eq!(SealMode::Standard.endpoint(), "seal");
        assert_eq!(SealMode::MaximumSecurity.endpoint(), "seal-maximum-security");
        assert_eq!(SealMode::QuantumSafe.endpoint(), "seal-quantum-safe");
        assert_eq!("quantum_safe".parse::<SealMode>().unwrap(), SealMode::QuantumSafe);
        assert!("ultra".parse::<SealMode>().is_err());
    }

    #[test]
    fn test_toggles_from_mode() {
        for mode in [
            SealMode::Standard,
            SealMode::MaximumSecurity,
            SealMode::QuantumSafe,
        ] {
            assert_eq!(SealModeToggles::from(mode).mode(), mode);
        }
    }

    #[test]
    fn test_seal_response_optional_proofs() {
        let raw = r#"{
            "artifact_id": "a1",
            "walacor_tx_id": "tx1",
            "sealed_at": "2026-10-17T09:30:00Z",
            "blockchain_proof": {"anchor": "0xabc"}
        }"#;
        let response: SealResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.artifact_id, "a1");
        assert!(response.blockchain_proof.is_some());
        assert!(response.quantum_safe_seal.is_none());
    }
}
