//! Typed view of the endpoint's reply and the field reconciliation rule.
//!
//! The endpoint's reply shape has drifted across versions, so every candidate
//! field is optional and resolution walks a fixed precedence list.

use serde::Deserialize;
use serde_json::Value;

/// Raw structured response from the chat endpoint.
///
/// Candidate fields are kept as JSON values: older pipelines return
/// `tool_result` as a list of rows rather than a string.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InboundReply {
    #[serde(default)]
    pub response: Option<Value>,
    #[serde(default)]
    pub final_response: Option<Value>,
    #[serde(default)]
    pub reply: Option<Value>,
    #[serde(default)]
    pub tool_result: Option<Value>,
    #[serde(default, rename = "toolResult")]
    pub tool_result_camel: Option<Value>,
    #[serde(default)]
    pub tool: Option<Value>,
}

impl InboundReply {
    /// Primary display text: first non-empty of `response`, `final_response`,
    /// `reply`; empty string when none qualifies.
    pub fn primary_text(&self) -> String {
        first_non_empty([&self.response, &self.final_response, &self.reply]).unwrap_or_default()
    }

    /// Auxiliary block: first non-empty of `tool_result`, `toolResult`, `tool`.
    pub fn auxiliary(&self) -> Option<String> {
        first_non_empty([&self.tool_result, &self.tool_result_camel, &self.tool])
    }
}

fn first_non_empty<const N: usize>(candidates: [&Option<Value>; N]) -> Option<String> {
    candidates
        .into_iter()
        .filter_map(|candidate| candidate.as_ref())
        .find_map(display_text)
}

// Strings are taken verbatim; other non-empty values render as compact JSON.
fn display_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) if items.is_empty() => None,
        Value::Object(map) if map.is_empty() => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> InboundReply {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_response_wins_over_final_response() {
        let reply = parse(json!({"response": "A", "final_response": "B"}));
        assert_eq!(reply.primary_text(), "A");
    }

    #[test]
    fn test_final_response_wins_over_reply() {
        let reply = parse(json!({"final_response": "B", "reply": "C"}));
        assert_eq!(reply.primary_text(), "B");
    }

    #[test]
    fn test_no_candidates_is_empty_text() {
        let reply = parse(json!({"question": "hi", "summary": "ignored"}));
        assert_eq!(reply.primary_text(), "");
        assert_eq!(reply.auxiliary(), None);
    }

    #[test]
    fn test_empty_candidate_falls_through() {
        let reply = parse(json!({"response": "", "final_response": null, "reply": "C"}));
        assert_eq!(reply.primary_text(), "C");
    }

    #[test]
    fn test_tool_result_wins_over_tool() {
        let reply = parse(json!({"tool_result": "X", "tool": "Y"}));
        assert_eq!(reply.auxiliary().as_deref(), Some("X"));
    }

    #[test]
    fn test_camel_case_tool_result() {
        let reply = parse(json!({"tool_result": "", "toolResult": "Z", "tool": "Y"}));
        assert_eq!(reply.auxiliary().as_deref(), Some("Z"));
    }

    #[test]
    fn test_non_string_tool_result_renders_as_json() {
        let reply = parse(json!({"tool_result": [{"date": "2015-12-11", "revenue": 42}]}));
        assert_eq!(
            reply.auxiliary().as_deref(),
            Some(r#"[{"date":"2015-12-11","revenue":42}]"#)
        );
    }

    #[test]
    fn test_empty_list_counts_as_missing() {
        let reply = parse(json!({"tool_result": [], "tool": "Y"}));
        assert_eq!(reply.auxiliary().as_deref(), Some("Y"));
    }
}
