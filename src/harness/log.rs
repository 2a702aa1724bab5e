//! Ordered run output.
//!
//! The output of a run is compared against an expected transcript, so it must
//! not depend on values that change between runs. [`stabilize`] replaces
//! volatile protocol fields (ids, timestamps) with type placeholders, and
//! JSON is printed with sorted keys.

use std::collections::BTreeMap;

use serde_json::Value;

// ============================================================================
// Constants
// ============================================================================

/// Field names whose values differ between runs.
const VOLATILE_FIELDS: &[&str] = &[
    "backendNodeId",
    "executionContextId",
    "frameId",
    "id",
    "interceptionId",
    "loaderId",
    "networkId",
    "nodeId",
    "objectId",
    "requestId",
    "scriptId",
    "sessionId",
    "styleSheetId",
    "targetId",
    "timestamp",
    "wallTime",
];

// ============================================================================
// OutputLog
// ============================================================================

/// Ordered output record of one run.
#[derive(Debug, Default, Clone)]
pub(crate) struct OutputLog {
    lines: Vec<String>,
}

impl OutputLog {
    pub(crate) fn push(&mut self, line: String) {
        self.lines.push(line);
    }

    pub(crate) fn lines(&self) -> &[String] {
        &self.lines
    }

    pub(crate) fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// Replaces volatile fields with `<number>` / `<string>` placeholders.
///
/// Applied recursively; non-scalar values of volatile fields are kept.
#[must_use]
pub fn stabilize(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, field)| {
                    let replaced = if VOLATILE_FIELDS.contains(&key.as_str()) {
                        match field {
                            Value::Number(_) => Value::String("<number>".into()),
                            Value::String(_) => Value::String("<string>".into()),
                            other => stabilize(other),
                        }
                    } else {
                        stabilize(field)
                    };
                    (key.clone(), replaced)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(stabilize).collect()),
        other => other.clone(),
    }
}

/// Formats a titled JSON value with sorted keys and four-space indentation.
#[must_use]
pub fn format_json(title: &str, value: &Value, stabilize_names: bool) -> String {
    let value = if stabilize_names {
        stabilize(value)
    } else {
        value.clone()
    };

    let mut out = String::new();
    if !title.is_empty() {
        out.push_str(title);
        out.push('\n');
    }
    write_value(&mut out, &sorted(value), 0);
    out
}

fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let ordered: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, sorted(v))).collect();
            Value::Object(ordered.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    let indent = "    ".repeat(depth + 1);
    let closing = "    ".repeat(depth);

    match value {
        Value::Object(map) if !map.is_empty() => {
            out.push_str("{\n");
            let last = map.len() - 1;
            for (i, (key, field)) in map.iter().enumerate() {
                out.push_str(&indent);
                out.push_str(&format!("{key} : "));
                write_value(out, field, depth + 1);
                if i != last {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&closing);
            out.push('}');
        }
        Value::Array(items) if !items.is_empty() => {
            out.push_str("[\n");
            let last = items.len() - 1;
            for (i, item) in items.iter().enumerate() {
                out.push_str(&indent);
                write_value(out, item, depth + 1);
                if i != last {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&closing);
            out.push(']');
        }
        Value::Object(_) => out.push_str("{\n}"),
        Value::Array(_) => out.push_str("[\n]"),
        scalar => out.push_str(&scalar.to_string()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_stabilize_replaces_volatile_scalars() {
        let value = json!({
            "requestId": "1000.7",
            "timestamp": 12.5,
            "url": "http://test/a.js",
            "nested": [{ "frameId": "F1", "status": 200 }],
            "targetId": null
        });

        assert_eq!(
            stabilize(&value),
            json!({
                "requestId": "<string>",
                "timestamp": "<number>",
                "url": "http://test/a.js",
                "nested": [{ "frameId": "<string>", "status": 200 }],
                "targetId": null
            })
        );
    }

    #[test]
    fn test_format_json_sorts_keys() {
        let text = format_json("Response:", &json!({ "b": 1, "a": { "d": [true], "c": "x" } }), false);
        assert_eq!(
            text,
            "Response:\n{\n    a : {\n        c : \"x\",\n        d : [\n            true\n        ]\n    },\n    b : 1\n}"
        );
    }

    #[test]
    fn test_format_json_empty_containers_and_no_title() {
        assert_eq!(format_json("", &json!({}), true), "{\n}");
        assert_eq!(format_json("", &json!([]), true), "[\n]");
        assert_eq!(format_json("", &json!("s"), true), "\"s\"");
    }

    #[test]
    fn test_stabilized_format() {
        let text = format_json("Event:", &json!({ "requestId": "r-9", "ok": true }), true);
        assert_eq!(text, "Event:\n{\n    ok : true,\n    requestId : \"<string>\"\n}");
    }

    #[test]
    fn test_output_log_take() {
        let mut log = OutputLog::default();
        log.push("one".into());
        log.push("two".into());
        assert_eq!(log.lines(), ["one".to_string(), "two".to_string()]);
        assert_eq!(log.take().len(), 2);
        assert!(log.lines().is_empty());
    }
}
