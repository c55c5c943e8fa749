// SPDX-FileCopyrightText: 2026 Civica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request and response types for the legal-answer backend wire protocol.

use civica_core::GradeCheck;
use serde::{Deserialize, Serialize};

/// Record status value the backend sets once the evaluation pipeline ran.
const STATUS_GRADED: &str = "graded";

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    pub language: &'a str,
}

/// Response of `POST /chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// The bot's answer text.
    pub response: String,
    /// Debugging information the backend optionally attaches.
    #[serde(default)]
    pub debug_info: Option<DebugInfo>,
}

/// Optional per-reply debugging block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DebugInfo {
    /// The normalized query actually used for the legal lookup.
    #[serde(default)]
    pub translated_query: Option<String>,
}

/// Response of `GET /logs`: recent evaluation records, most-recent first.
#[derive(Debug, Clone, Deserialize)]
pub struct LogsResponse {
    #[serde(default)]
    pub logs: Vec<EvaluationRecord>,
}

/// One evaluation record. Records carry more fields on the wire (query,
/// timestamp, model reply); only the grading fields matter here.
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationRecord {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub judge_score: Option<i64>,
    #[serde(default)]
    pub judge_reason: Option<String>,
}

impl LogsResponse {
    /// Grading status of the most recent evaluation record.
    ///
    /// An empty list, a non-graded front record, or a graded record without
    /// a score all mean "not yet graded" -- a scoreless graded record would
    /// otherwise produce a completion with nothing to show.
    pub fn latest_check(&self) -> GradeCheck {
        match self.logs.first() {
            Some(record) if record.status == STATUS_GRADED => match record.judge_score {
                Some(score) => GradeCheck::Graded {
                    score,
                    reason: record.judge_reason.clone().unwrap_or_default(),
                },
                None => GradeCheck::NotYetGraded,
            },
            _ => GradeCheck::NotYetGraded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> LogsResponse {
        serde_json::from_str(json).expect("should deserialize")
    }

    #[test]
    fn graded_front_record_yields_graded() {
        let logs = parse(
            r#"{"logs": [
                {"status": "graded", "judge_score": 85, "judge_reason": "well grounded"},
                {"status": "pending"}
            ]}"#,
        );
        assert_eq!(
            logs.latest_check(),
            GradeCheck::Graded {
                score: 85,
                reason: "well grounded".into()
            }
        );
    }

    #[test]
    fn pending_front_record_yields_not_yet_graded() {
        let logs = parse(
            r#"{"logs": [
                {"status": "pending"},
                {"status": "graded", "judge_score": 70}
            ]}"#,
        );
        // Only the most recent record counts.
        assert_eq!(logs.latest_check(), GradeCheck::NotYetGraded);
    }

    #[test]
    fn empty_logs_yield_not_yet_graded() {
        let logs = parse(r#"{"logs": []}"#);
        assert_eq!(logs.latest_check(), GradeCheck::NotYetGraded);

        let logs = parse(r#"{}"#);
        assert_eq!(logs.latest_check(), GradeCheck::NotYetGraded);
    }

    #[test]
    fn graded_without_score_yields_not_yet_graded() {
        let logs = parse(r#"{"logs": [{"status": "graded"}]}"#);
        assert_eq!(logs.latest_check(), GradeCheck::NotYetGraded);
    }

    #[test]
    fn missing_reason_defaults_to_empty() {
        let logs = parse(r#"{"logs": [{"status": "graded", "judge_score": 90}]}"#);
        assert_eq!(
            logs.latest_check(),
            GradeCheck::Graded {
                score: 90,
                reason: String::new()
            }
        );
    }

    #[test]
    fn extra_record_fields_are_ignored() {
        let logs = parse(
            r#"{"logs": [{
                "status": "graded",
                "judge_score": 60,
                "judge_reason": "partial",
                "user_query": "tenant rights",
                "timestamp": "2026-03-01T10:00:00Z"
            }]}"#,
        );
        assert_eq!(
            logs.latest_check(),
            GradeCheck::Graded {
                score: 60,
                reason: "partial".into()
            }
        );
    }

    #[test]
    fn chat_response_without_debug_info() {
        let reply: ChatResponse =
            serde_json::from_str(r#"{"response": "You have the right to remain silent."}"#)
                .expect("should deserialize");
        assert!(reply.debug_info.is_none());
    }

    #[test]
    fn chat_request_serializes_language() {
        let req = ChatRequest {
            message: "what are my rights?",
            language: "yoruba",
        };
        let json = serde_json::to_value(&req).expect("should serialize");
        assert_eq!(json["message"], "what are my rights?");
        assert_eq!(json["language"], "yoruba");
    }
}
