//! Read-only enrichment data for sealed loan documents (borrower view and audit trail).

use serde::{Deserialize, Serialize};

/// Borrower record as returned by `GET /api/loan-documents/{id}/borrower`.
/// Sensitive values arrive masked; anything unrecognised lands in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BorrowerInfo {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<serde_json::Value>,
    #[serde(default)]
    pub ssn_last4: Option<String>,
    #[serde(default)]
    pub id_type: Option<String>,
    #[serde(default)]
    pub id_last4: Option<String>,
    #[serde(default)]
    pub employment_status: Option<String>,
    #[serde(default)]
    pub annual_income: Option<serde_json::Value>,
    #[serde(default)]
    pub co_borrower_name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Audit trail for a sealed document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuditTrail {
    #[serde(default, alias = "artifact_id")]
    pub document_id: Option<String>,
    #[serde(default, alias = "audit_trail", alias = "entries")]
    pub events: Vec<AuditEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    #[serde(alias = "action", alias = "event")]
    pub event_type: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, alias = "user", alias = "user_id")]
    pub actor: Option<String>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_trail_accepts_alternate_keys() {
        let raw = r#"{
            "artifact_id": "a1",
            "audit_trail": [
                {"action": "sealed", "timestamp": "2026-10-17T09:30:00Z", "user": "ops"},
                {"event_type": "verified"}
            ]
        }"#;
        let trail: AuditTrail = serde_json::from_str(raw).unwrap();
        assert_eq!(trail.document_id.as_deref(), Some("a1"));
        assert_eq!(trail.events.len(), 2);
        assert_eq!(trail.events[0].event_type, "sealed");
        assert_eq!(trail.events[0].actor.as_deref(), Some("ops"));
        assert_eq!(trail.events[1].timestamp, None);
    }

    #[test]
    fn test_borrower_info_keeps_unknown_fields() {
        let raw = r#"{"full_name": "Jane Doe", "ssn_last4": "6789", "risk_tier": "low"}"#;
        let info: BorrowerInfo = serde_json::from_str(raw).unwrap();
        assert_eq!(info.full_name.as_deref(), Some("Jane Doe"));
        assert_eq!(info.extra["risk_tier"], "low");
    }
}
