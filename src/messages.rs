//! Approval messages exchanged with the desktop UI.
//!
//! Messages arrive as `{ "title": ..., "payload": ... }` envelopes. The title
//! picks the variant and the payload shape follows from it; an unknown title
//! is rejected at deserialization.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Generated code flagged for a security review before it may run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityEvaluationRequest {
    pub request_id: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub concerns: Vec<String>,
}

/// A planner response carrying code the user must approve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeResponseApproval {
    pub request_id: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planning_token: Option<String>,
    /// Set when a standing rule already approved this code.
    #[serde(default)]
    pub auto_approved: bool,
}

/// A question from the planner back to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrompterRequest {
    pub request_id: String,
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_option: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "title", content = "payload")]
pub enum ApprovalMessage {
    #[serde(rename = "Security Evaluation Request")]
    SecurityEvaluation(SecurityEvaluationRequest),
    #[serde(rename = "code response approval")]
    CodeResponseApproval(CodeResponseApproval),
    #[serde(rename = "prompter-request")]
    PrompterRequest(PrompterRequest),
}

impl ApprovalMessage {
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| AppError::ValidationError(format!("Unrecognized approval message: {}", e)))
    }

    /// Stable identifier of the variant, used in logs and responses.
    pub fn kind(&self) -> &'static str {
        match self {
            ApprovalMessage::SecurityEvaluation(_) => "security_evaluation",
            ApprovalMessage::CodeResponseApproval(_) => "code_response_approval",
            ApprovalMessage::PrompterRequest(_) => "prompter_request",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ApprovalMessage::SecurityEvaluation(_) => "Security Evaluation Request",
            ApprovalMessage::CodeResponseApproval(_) => "code response approval",
            ApprovalMessage::PrompterRequest(_) => "prompter-request",
        }
    }

    pub fn request_id(&self) -> &str {
        match self {
            ApprovalMessage::SecurityEvaluation(m) => &m.request_id,
            ApprovalMessage::CodeResponseApproval(m) => &m.request_id,
            ApprovalMessage::PrompterRequest(m) => &m.request_id,
        }
    }

    /// Whether the UI must block on a human answer.
    pub fn requires_decision(&self) -> bool {
        match self {
            ApprovalMessage::SecurityEvaluation(_) => true,
            ApprovalMessage::CodeResponseApproval(m) => !m.auto_approved,
            ApprovalMessage::PrompterRequest(_) => true,
        }
    }

    pub fn route(&self) -> MessageRoute {
        MessageRoute {
            kind: self.kind(),
            title: self.title(),
            request_id: self.request_id().to_string(),
            requires_decision: self.requires_decision(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRoute {
    pub kind: &'static str,
    pub title: &'static str,
    pub request_id: String,
    pub requires_decision: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_titles_select_variants() {
        let security = ApprovalMessage::from_value(json!({
            "title": "Security Evaluation Request",
            "payload": { "requestId": "r1", "code": "rm -rf /tmp/x", "riskLevel": "high" }
        }))
        .unwrap();
        assert_eq!(security.kind(), "security_evaluation");
        assert!(security.requires_decision());

        let prompter = ApprovalMessage::from_value(json!({
            "title": "prompter-request",
            "payload": { "requestId": "r2", "prompt": "Which repo?", "options": ["a", "b"] }
        }))
        .unwrap();
        assert_eq!(prompter.request_id(), "r2");
    }

    #[test]
    fn test_auto_approved_code_needs_no_decision() {
        let message = ApprovalMessage::from_value(json!({
            "title": "code response approval",
            "payload": { "requestId": "r3", "code": "print(1)", "autoApproved": true }
        }))
        .unwrap();

        let route = message.route();
        assert_eq!(route.kind, "code_response_approval");
        assert!(!route.requires_decision);
    }

    #[test]
    fn test_unknown_title_is_rejected() {
        let err = ApprovalMessage::from_value(json!({
            "title": "security evaluation request",
            "payload": { "requestId": "r1" }
        }))
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn test_payload_must_match_title() {
        let result = ApprovalMessage::from_value(json!({
            "title": "prompter-request",
            "payload": { "requestId": "r1", "code": "x" }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_serializes_back_to_envelope() {
        let message = ApprovalMessage::PrompterRequest(PrompterRequest {
            request_id: "r9".into(),
            prompt: "Continue?".into(),
            options: vec![],
            default_option: None,
        });
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["title"], "prompter-request");
        assert_eq!(value["payload"]["requestId"], "r9");
    }
}
