//! Search-domain normalization.
//!
//! Tool callers are free-form, so the first argument of a filtering call
//! arrives in whatever shape the caller's upstream reasoning produced:
//! canonical nested lists, a bare `[field, operator, value]` triple, an
//! accidentally double-wrapped `[[domain]]`, a `{"conditions": [...]}`
//! object, a JSON-encoded string, or a Python-literal string such as
//! `"[('name', 'ilike', 'test')]"`.
//!
//! [`normalize_domain`] reduces all of them to one canonical ordered list of
//! prefix logic markers and `[field, operator, value]` triples. It is total:
//! malformed input degrades to the empty (match-all) domain and malformed
//! elements are pruned, never forwarded to the server. A partially applied
//! filter is considered better than a hard failure here.

pub mod pyliteral;

use serde_json::Value;
use tracing::warn;

/// Prefix logical operator in an Odoo search domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
    Not,
}

impl LogicOp {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicOp::And => "&",
            LogicOp::Or => "|",
            LogicOp::Not => "!",
        }
    }

    fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "&" => Some(LogicOp::And),
            "|" => Some(LogicOp::Or),
            "!" => Some(LogicOp::Not),
            _ => None,
        }
    }
}

/// One element of a canonical domain expression.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainTerm {
    Logic(LogicOp),
    Condition {
        field: String,
        operator: String,
        value: Value,
    },
}

impl DomainTerm {
    fn to_value(&self) -> Value {
        match self {
            DomainTerm::Logic(op) => Value::String(op.as_str().to_string()),
            DomainTerm::Condition {
                field,
                operator,
                value,
            } => Value::Array(vec![
                Value::String(field.clone()),
                Value::String(operator.clone()),
                value.clone(),
            ]),
        }
    }
}

/// Normalize an arbitrary domain specification into canonical terms.
///
/// Total function: the worst case is the empty, match-all domain.
pub fn normalize_domain(raw: &Value) -> Vec<DomainTerm> {
    validate(collect(raw, 0))
}

/// [`normalize_domain`] composed with re-serialization, ready to substitute
/// for the first positional argument of a filtering call.
pub fn normalize_domain_value(raw: &Value) -> Value {
    Value::Array(
        normalize_domain(raw)
            .iter()
            .map(DomainTerm::to_value)
            .collect(),
    )
}

/// Ordered shape-matching rules; first match wins. Produces the raw element
/// list for the final validation pass.
fn collect(raw: &Value, depth: u8) -> Vec<Value> {
    // Guard against a caller double-wrapping the domain as [[domain]].
    // Only at the top level: a list parsed out of a string is taken as-is.
    let raw = match raw.as_array() {
        Some(items) if depth == 0 && items.len() == 1 && items[0].is_array() => &items[0],
        _ => raw,
    };

    match raw {
        Value::Null => Vec::new(),

        Value::Object(fields) => match fields.get("conditions").and_then(Value::as_array) {
            Some(conditions) => conditions
                .iter()
                .filter_map(condition_object_to_triple)
                .collect(),
            None => Vec::new(),
        },

        Value::Array(items) => {
            if items.is_empty() {
                return Vec::new();
            }
            let already_canonical = items.iter().all(Value::is_array)
                || items
                    .iter()
                    .any(|item| item.as_str().is_some_and(|s| LogicOp::from_str(s).is_some()));
            if already_canonical {
                items.clone()
            } else if items.len() >= 3 && items[0].is_string() {
                // A bare [field, operator, value] instead of [[...]]; wrap it
                // and let the validation pass prune it if it is not a triple.
                vec![Value::Array(items.clone())]
            } else {
                Vec::new()
            }
        }

        Value::String(text) => {
            if depth > 0 {
                return Vec::new();
            }
            let parsed = serde_json::from_str::<Value>(text)
                .ok()
                .or_else(|| pyliteral::parse(text).ok());
            match parsed {
                Some(value) if !value.is_string() => collect(&value, depth + 1),
                _ => Vec::new(),
            }
        }

        _ => Vec::new(),
    }
}

/// Read a `{"field": .., "operator": .., "value": ..}` condition object.
/// Objects missing any of the three keys are dropped, not an error.
fn condition_object_to_triple(condition: &Value) -> Option<Value> {
    let object = condition.as_object()?;
    let field = object.get("field")?;
    let operator = object.get("operator")?;
    let value = object.get("value")?;
    Some(Value::Array(vec![
        field.clone(),
        operator.clone(),
        value.clone(),
    ]))
}

/// Final pass over whatever the shape rules produced: keep only recognized
/// logic markers and `[string, string, any]` triples. Runs even on input
/// that looked canonical, so malformed elements never reach the server.
fn validate(elements: Vec<Value>) -> Vec<DomainTerm> {
    elements
        .into_iter()
        .filter_map(|element| match element {
            Value::String(s) => LogicOp::from_str(&s).map(DomainTerm::Logic),
            Value::Array(items) => match items.as_slice() {
                [Value::String(field), Value::String(operator), value] => {
                    Some(DomainTerm::Condition {
                        field: field.clone(),
                        operator: operator.clone(),
                        value: value.clone(),
                    })
                }
                _ => {
                    let element = Value::Array(items.clone());
                    warn!(%element, "dropping malformed domain element");
                    None
                }
            },
            other => {
                warn!(element = %other, "dropping malformed domain element");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_input_is_unchanged() {
        let canonical = json!([["name", "ilike", "test"], ["active", "=", true]]);
        assert_eq!(normalize_domain_value(&canonical), canonical);
    }

    #[test]
    fn logic_markers_pass_through_in_order() {
        let canonical = json!(["&", "|", ["a", "=", 1], ["b", "=", 2], ["c", "=", 3]]);
        assert_eq!(normalize_domain_value(&canonical), canonical);
    }

    #[test]
    fn double_wrapped_domain_is_unwrapped_once() {
        let wrapped = json!([[["name", "=", "v"]]]);
        let plain = json!([["name", "=", "v"]]);
        assert_eq!(
            normalize_domain_value(&wrapped),
            normalize_domain_value(&plain)
        );
        assert_eq!(normalize_domain_value(&wrapped), plain);
    }

    #[test]
    fn bare_triple_is_wrapped() {
        assert_eq!(
            normalize_domain_value(&json!(["name", "=", "v"])),
            json!([["name", "=", "v"]])
        );
    }

    #[test]
    fn oversized_bare_sequence_is_pruned() {
        // Wrapped as a single pseudo-triple, then dropped by validation.
        assert_eq!(
            normalize_domain_value(&json!(["name", "=", "v", "extra"])),
            json!([])
        );
    }

    #[test]
    fn null_and_empty_mean_match_all() {
        assert_eq!(normalize_domain_value(&Value::Null), json!([]));
        assert_eq!(normalize_domain_value(&json!([])), json!([]));
    }

    #[test]
    fn object_form_maps_conditions() {
        let object = json!({"conditions": [
            {"field": "f", "operator": "=", "value": 1}
        ]});
        assert_eq!(normalize_domain_value(&object), json!([["f", "=", 1]]));
    }

    #[test]
    fn incomplete_conditions_are_dropped() {
        let object = json!({"conditions": [
            {"field": "ok", "operator": "=", "value": 1},
            {"field": "broken", "operator": "="},
            {"value": 2}
        ]});
        assert_eq!(normalize_domain_value(&object), json!([["ok", "=", 1]]));
    }

    #[test]
    fn object_without_conditions_means_match_all() {
        assert_eq!(normalize_domain_value(&json!({"other": 1})), json!([]));
    }

    #[test]
    fn json_string_matches_decoded_equivalent() {
        let decoded = json!([["name", "ilike", "test"]]);
        let encoded = json!(decoded.to_string());
        assert_eq!(
            normalize_domain_value(&encoded),
            normalize_domain_value(&decoded)
        );
    }

    #[test]
    fn json_string_object_form_is_recognized() {
        let encoded = json!(r#"{"conditions": [{"field": "f", "operator": "=", "value": 1}]}"#);
        assert_eq!(normalize_domain_value(&encoded), json!([["f", "=", 1]]));
    }

    #[test]
    fn python_literal_string_is_recognized() {
        let encoded = json!("[('name', 'ilike', 'test'), ('active', '=', True)]");
        assert_eq!(
            normalize_domain_value(&encoded),
            json!([["name", "ilike", "test"], ["active", "=", true]])
        );
    }

    #[test]
    fn parsed_string_list_is_not_unwrapped() {
        // The single-wrapper unwrap applies to the caller's value, not to a
        // list decoded out of a string; the extra layer gets pruned instead.
        let encoded = json!(r#"[[["f", "=", 1]]]"#);
        assert_eq!(normalize_domain_value(&encoded), json!([]));
    }

    #[test]
    fn unparseable_string_means_match_all() {
        assert_eq!(
            normalize_domain_value(&json!("not a domain at all")),
            json!([])
        );
    }

    #[test]
    fn malformed_elements_inside_canonical_input_are_pruned() {
        let mixed = json!([
            ["name", "=", "v"],
            [1, 2, 3],
            ["short"],
            "&",
            "bogus-marker",
            42
        ]);
        assert_eq!(
            normalize_domain_value(&mixed),
            json!([["name", "=", "v"], "&"])
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            json!([["name", "ilike", "test"]]),
            json!(["&", ["a", "=", 1], ["b", "!=", 2]]),
            json!([]),
        ];
        for input in inputs {
            let once = normalize_domain_value(&input);
            let twice = normalize_domain_value(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn non_collection_scalars_mean_match_all() {
        assert_eq!(normalize_domain_value(&json!(42)), json!([]));
        assert_eq!(normalize_domain_value(&json!(true)), json!([]));
    }
}
