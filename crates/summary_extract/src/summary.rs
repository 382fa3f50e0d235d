//! Deciding whether a decoded object is a task summary.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::SkipReason;

pub const TASK_ID: &str = "task_id";

/// The only keys the validator inspects. Everything else passes through.
pub const SUMMARY_FIELDS: [&str; 5] = [TASK_ID, "status", "summary", "files", "blockers"];

#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum Rejection {
    #[error("candidate is not a JSON object")]
    NotAnObject,
    #[error("candidate has none of the summary fields")]
    NoSummaryFields,
    #[error("candidate carries no summary content")]
    Empty,
}

impl From<Rejection> for SkipReason {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::NotAnObject => SkipReason::NotAnObject,
            Rejection::NoSummaryFields => SkipReason::NoSummaryFields,
            Rejection::Empty => SkipReason::EmptySummary,
        }
    }
}

/// An accepted summary object, serialized exactly as it was decoded apart
/// from a null `task_id` becoming `""`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Summary {
    fields: Map<String, Value>,
}

impl Summary {
    /// Accepts an object without the emptiness check. A null `task_id` is
    /// still normalized.
    pub(crate) fn accept(mut fields: Map<String, Value>) -> Self {
        if let Some(task_id) = fields.get_mut(TASK_ID) {
            if task_id.is_null() {
                *task_id = Value::String(String::new());
            }
        }
        Self { fields }
    }

    /// The identifier, `""` when it is null or missing.
    pub fn task_id(&self) -> &str {
        self.str_field(TASK_ID).unwrap_or_default()
    }

    pub fn has_task_id_key(&self) -> bool {
        self.fields.contains_key(TASK_ID)
    }

    pub fn status(&self) -> Option<&str> {
        self.str_field("status")
    }

    pub fn summary_text(&self) -> Option<&str> {
        self.str_field("summary")
    }

    pub fn files(&self) -> Vec<&str> {
        self.str_list("files")
    }

    pub fn blockers(&self) -> Vec<&str> {
        self.str_list("blockers")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// Fields of the wrong type read as empty.
    pub fn to_task_summary(&self) -> TaskSummary {
        TaskSummary {
            task_id: self.task_id().to_string(),
            status: self.status().unwrap_or_default().to_string(),
            summary: self.summary_text().unwrap_or_default().to_string(),
            files: owned(self.files()),
            blockers: owned(self.blockers()),
        }
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    fn str_list(&self, key: &str) -> Vec<&str> {
        self.fields
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Checks a decoded candidate against the summary invariants.
///
/// The object must carry at least one of [`SUMMARY_FIELDS`], and at least
/// one of them must be truthy. Presence alone is not content.
pub fn validate(value: Value) -> Result<Summary, Rejection> {
    let Value::Object(fields) = value else {
        return Err(Rejection::NotAnObject);
    };

    if !SUMMARY_FIELDS.iter().any(|key| fields.contains_key(*key)) {
        return Err(Rejection::NoSummaryFields);
    }

    let has_content = SUMMARY_FIELDS
        .iter()
        .any(|key| fields.get(*key).is_some_and(is_truthy));
    if !has_content {
        return Err(Rejection::Empty);
    }

    Ok(Summary::accept(fields))
}

pub fn as_summary(value: Value) -> Option<Summary> {
    validate(value).ok()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// Fixed-shape view of a summary for consumers that want typed fields.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct TaskSummary {
    pub task_id: String,
    pub status: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blockers: Vec<String>,
}

fn owned(items: Vec<&str>) -> Vec<String> {
    items.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_and_missing_identifier_converge() {
        let missing = validate(json!({"status": "ok", "summary": "done"})).unwrap();
        let null = validate(json!({"task_id": null, "status": "ok", "summary": "done"})).unwrap();

        assert_eq!(missing.task_id(), "");
        assert_eq!(null.task_id(), "");
        assert_eq!(null.get(TASK_ID), Some(&json!("")));
        assert!(!missing.has_task_id_key());
        assert_eq!(
            missing.to_task_summary(),
            null.to_task_summary()
        );
    }

    #[test]
    fn empty_candidate_is_rejected_until_a_list_has_items() {
        assert_eq!(
            validate(json!({"task_id": "", "status": "", "summary": ""})),
            Err(Rejection::Empty)
        );
        let accepted =
            validate(json!({"task_id": "", "status": "", "summary": "", "files": ["a.py"]}))
                .unwrap();
        assert_eq!(accepted.files(), vec!["a.py"]);
    }

    #[test]
    fn falsy_values_do_not_count_as_content() {
        let candidate = json!({
            "task_id": null,
            "status": false,
            "summary": 0,
            "files": [],
            "blockers": {}
        });
        assert_eq!(validate(candidate), Err(Rejection::Empty));
    }

    #[test]
    fn unrelated_objects_and_non_objects_are_rejected() {
        assert_eq!(
            validate(json!({"type": "ping"})),
            Err(Rejection::NoSummaryFields)
        );
        assert_eq!(validate(json!(["status"])), Err(Rejection::NotAnObject));
        assert!(as_summary(json!("status")).is_none());
    }

    #[test]
    fn extra_fields_pass_through_in_order() {
        let summary = validate(json!({"notes": "keep", "status": "ok", "extra": 1})).unwrap();
        let keys: Vec<_> = summary.as_map().keys().map(String::as_str).collect();
        assert_eq!(keys, ["notes", "status", "extra"]);
        assert_eq!(
            serde_json::to_string(&summary).unwrap(),
            r#"{"notes":"keep","status":"ok","extra":1}"#
        );
    }

    #[test]
    fn typed_view_omits_empty_lists() {
        let summary = validate(json!({"task_id": "T-1", "status": "done", "extra": true})).unwrap();
        let typed = summary.to_task_summary();
        assert_eq!(typed.task_id, "T-1");
        assert_eq!(
            serde_json::to_value(&typed).unwrap(),
            json!({"task_id": "T-1", "status": "done", "summary": ""})
        );
    }

    #[test]
    fn typed_view_tolerates_mistyped_fields() {
        let summary = validate(json!({
            "task_id": "T",
            "status": 3,
            "files": "a.py",
            "blockers": ["flaky test", 7]
        }))
        .unwrap();
        assert_eq!(
            summary.to_task_summary(),
            TaskSummary {
                task_id: "T".to_string(),
                blockers: vec!["flaky test".to_string()],
                ..TaskSummary::default()
            }
        );
    }
}
