//! Normalization of raw step records
//!
//! Turns loosely-typed JSON records into [`Step`]s:
//! - actions are lowercased, unknown values become `read`
//! - `path` is also accepted under the `filePath` alias
//! - descriptions are whitespace-collapsed; empty ones drop the record
//! - dependencies become `step_<n>` ids with self references removed

use crate::step::{Action, Step, StepId, DEFAULT_EXPECTED_OUTCOME};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

static STEP_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^step[\s_-]*(\d+)$").expect("valid step reference regex"));

/// Normalize every record, dropping those without a description
///
/// Ids are assigned by position among the kept records, starting at 1.
#[must_use]
pub fn normalize_records(records: &[Value]) -> Vec<Step> {
    let mut steps = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let Some(fields) = record.as_object() else {
            tracing::debug!(index, "dropping non-object plan record");
            continue;
        };
        match normalize_record(fields, steps.len() + 1) {
            Some(step) => steps.push(step),
            None => tracing::debug!(index, "dropping plan record with empty description"),
        }
    }

    steps
}

/// Normalize one record into the step at `position`
///
/// Returns `None` when the description is empty after normalization.
#[must_use]
pub fn normalize_record(fields: &Map<String, Value>, position: usize) -> Option<Step> {
    let description = collapse_whitespace(&text_field(fields, &["description"]).unwrap_or_default());
    if description.is_empty() {
        return None;
    }

    let id = StepId::from_index(position);
    let action = text_field(fields, &["action"])
        .map(|a| Action::normalize(&a))
        .unwrap_or(Action::Read);
    let depends_on = normalize_dependencies(fields.get("dependsOn"), &id);
    let sequence_number = sequence_number(fields.get("step")).unwrap_or_else(|| {
        u32::try_from(position).unwrap_or(u32::MAX)
    });

    Some(Step {
        id,
        sequence_number,
        action,
        path: text_field(fields, &["path", "filePath"]),
        command: text_field(fields, &["command"]),
        content: fields
            .get("content")
            .and_then(Value::as_str)
            .map(str::to_string),
        description,
        depends_on,
        expected_outcome: text_field(fields, &["expectedOutcome"])
            .unwrap_or_else(|| DEFAULT_EXPECTED_OUTCOME.to_string()),
    })
}

/// Normalize a `dependsOn` value owned by step `own`
///
/// Accepts an array, a comma-separated string, or numbers. The owner's own
/// id is removed.
#[must_use]
pub fn normalize_dependencies(raw: Option<&Value>, own: &StepId) -> BTreeSet<StepId> {
    let mut tokens = Vec::new();
    match raw {
        Some(Value::Array(items)) => items.iter().for_each(|item| collect_tokens(item, &mut tokens)),
        Some(other) => collect_tokens(other, &mut tokens),
        None => {}
    }

    tokens
        .iter()
        .filter_map(|t| dependency_id(t))
        .filter(|id| id != own)
        .collect()
}

/// Rewrite one dependency token into a step id
///
/// `3`, `"step 3"`, `"Step-3"` and `"step_3"` all become `step_3`; any other
/// non-empty token is kept verbatim.
#[must_use]
pub fn dependency_id(token: &str) -> Option<StepId> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    if let Ok(n) = token.parse::<usize>() {
        return Some(StepId::from_index(n));
    }
    if let Some(n) = STEP_REF
        .captures(token)
        .and_then(|caps| caps[1].parse::<usize>().ok())
    {
        return Some(StepId::from_index(n));
    }
    Some(StepId::new(token))
}

fn collect_tokens(value: &Value, tokens: &mut Vec<String>) {
    match value {
        Value::String(s) => tokens.extend(s.split(',').map(|t| t.trim().to_string())),
        Value::Number(n) => tokens.push(n.to_string()),
        _ => {}
    }
}

fn sequence_number(raw: Option<&Value>) -> Option<u32> {
    match raw? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_field(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        let text = match fields.get(*key)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ids(set: &BTreeSet<StepId>) -> Vec<&str> {
        set.iter().map(StepId::as_str).collect()
    }

    #[test]
    fn normalizes_action_path_and_description() {
        let records = vec![json!({
            "step": 7,
            "action": "WRITE",
            "filePath": "  src/app.ts ",
            "description": "  create \n the   app  ",
        })];
        let steps = normalize_records(&records);
        assert_eq!(steps.len(), 1);
        let step = &steps[0];
        assert_eq!(step.id.as_str(), "step_1");
        assert_eq!(step.sequence_number, 7);
        assert_eq!(step.action, Action::Write);
        assert_eq!(step.path.as_deref(), Some("src/app.ts"));
        assert_eq!(step.description, "create the app");
        assert_eq!(step.expected_outcome, DEFAULT_EXPECTED_OUTCOME);
    }

    #[test]
    fn primary_path_key_wins_over_alias() {
        let records = vec![json!({
            "action": "read",
            "path": "a.ts",
            "filePath": "b.ts",
            "description": "read",
        })];
        assert_eq!(normalize_records(&records)[0].path.as_deref(), Some("a.ts"));
    }

    #[test]
    fn unknown_action_becomes_read() {
        let records = vec![json!({"action": "inspect", "description": "look"})];
        assert_eq!(normalize_records(&records)[0].action, Action::Read);
    }

    #[test]
    fn drops_empty_descriptions_and_renumbers() {
        let records = vec![
            json!({"action": "read", "path": "a.ts", "description": "   "}),
            json!({"action": "read", "path": "b.ts"}),
            json!("not an object"),
            json!({"action": "read", "path": "c.ts", "description": "keep"}),
        ];
        let steps = normalize_records(&records);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].id.as_str(), "step_1");
        assert_eq!(steps[0].path.as_deref(), Some("c.ts"));
    }

    #[test]
    fn dependencies_accept_all_shapes() {
        let own = StepId::from_index(5);
        assert_eq!(ids(&normalize_dependencies(Some(&json!([1, "2", "step 3"])), &own)), vec!["step_1", "step_2", "step_3"]);
        assert_eq!(ids(&normalize_dependencies(Some(&json!("step_1, step_2 ,")), &own)), vec!["step_1", "step_2"]);
        assert_eq!(ids(&normalize_dependencies(Some(&json!(4)), &own)), vec!["step_4"]);
        assert!(normalize_dependencies(Some(&json!(null)), &own).is_empty());
        assert!(normalize_dependencies(None, &own).is_empty());
    }

    #[test]
    fn self_reference_is_removed() {
        let own = StepId::from_index(2);
        let deps = normalize_dependencies(Some(&json!([1, 2, "step_2"])), &own);
        assert_eq!(ids(&deps), vec!["step_1"]);
    }

    #[test]
    fn unknown_tokens_are_kept_verbatim() {
        assert_eq!(dependency_id("setup").unwrap().as_str(), "setup");
        assert_eq!(dependency_id("Step-12").unwrap().as_str(), "step_12");
        assert!(dependency_id("  ").is_none());
    }

    #[test]
    fn sequence_number_falls_back_to_position() {
        let records = vec![
            json!({"description": "a", "step": "3"}),
            json!({"description": "b", "step": "x"}),
        ];
        let steps = normalize_records(&records);
        assert_eq!(steps[0].sequence_number, 3);
        assert_eq!(steps[1].sequence_number, 2);
    }
}
