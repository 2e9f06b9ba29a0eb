use serde::{Deserialize, Serialize};

/// Body of `POST /api/verify`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub etid: u32,
    #[serde(rename = "payloadHash")]
    pub payload_hash: String,
}

/// Envelope returned by `POST /api/verify`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub data: Option<VerifyResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerifyResponse {
    /// The verification result, if the backend produced one.
    pub fn into_result(self) -> Option<VerifyResult> {
        if self.ok {
            self.data
        } else {
            None
        }
    }
}

/// Sealed-record verification result. Owned by the backend; rendered only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyResult {
    pub is_valid: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub verified_at: Option<String>,
    #[serde(default)]
    pub details: Option<VerifyDetails>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VerifyDetails {
    #[serde(default)]
    pub stored_hash: Option<String>,
    #[serde(default)]
    pub provided_hash: Option<String>,
    #[serde(default)]
    pub artifact_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl VerifyResult {
    /// True when the backend reports a stored hash that differs from the one provided.
    pub fn is_tampered(&self) -> bool {
        if self.is_valid {
            return false;
        }
        match &self.details {
            Some(VerifyDetails {
                stored_hash: Some(stored),
                provided_hash: Some(provided),
                ..
            }) => !stored.eq_ignore_ascii_case(provided),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_request_uses_camel_case_hash() {
        let body = serde_json::to_value(VerifyRequest {
            etid: 100001,
            payload_hash: "ab".repeat(32),
        })
        .unwrap();
        assert_eq!(body["etid"], 100001);
        assert_eq!(body["payloadHash"], "ab".repeat(32));
    }

    #[test]
    fn test_verify_response_parses_backend_shape() {
        let raw = r#"{
            "ok": true,
            "data": {
                "is_valid": true,
                "status": "sealed",
                "artifact_id": "a1",
                "verified_at": "2026-10-01T12:00:00Z",
                "details": {
                    "stored_hash": "abc",
                    "provided_hash": "abc",
                    "artifact_type": "loan_document",
                    "created_at": "2026-09-30T08:00:00Z"
                }
            }
        }"#;
        let response: VerifyResponse = serde_json::from_str(raw).unwrap();
        let result = response.into_result().unwrap();
        assert!(result.is_valid);
        assert_eq!(result.artifact_id.as_deref(), Some("a1"));
        assert!(!result.is_tampered());
    }

    #[test]
    fn test_not_ok_yields_no_result() {
        let response: VerifyResponse =
            serde_json::from_str(r#"{"ok": false, "error": "not found"}"#).unwrap();
        assert!(response.into_result().is_none());
    }

    #[test]
    fn test_tampered_when_hashes_differ() {
        let result = VerifyResult {
            is_valid: false,
            status: Some("tampered".to_string()),
            artifact_id: Some("a1".to_string()),
            verified_at: None,
            details: Some(VerifyDetails {
                stored_hash: Some("aaa".to_string()),
                provided_hash: Some("bbb".to_string()),
                ..Default::default()
            }),
        };
        assert!(result.is_tampered());
    }
}
