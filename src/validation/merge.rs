//! Deep merge of sparse error trees

use crate::path::empty_tree;
use serde_json::Value;

/// Merge `source` over `target`.
///
/// Objects merge key by key. Every other value, arrays included, from
/// `source` replaces whatever `target` holds at that path, so repeated runs
/// never append duplicate messages.
pub fn merge_errors(target: &Value, source: &Value) -> Value {
    match (target, source) {
        (Value::Object(base), Value::Object(overlay)) => {
            let mut merged = base.clone();
            for (key, value) in overlay {
                let next = match base.get(key) {
                    Some(existing) => merge_errors(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        (_, source) => source.clone(),
    }
}

/// Merge trees left to right; later trees win per leaf
pub fn merge_all<'a>(trees: impl IntoIterator<Item = &'a Value>) -> Value {
    trees
        .into_iter()
        .fold(empty_tree(), |acc, tree| merge_errors(&acc, tree))
}

/// Number of error leaves: any non-null value other than the empty string
pub fn count_errors(tree: &Value) -> usize {
    match tree {
        Value::Object(map) => map.values().map(count_errors).sum(),
        Value::Array(items) => items.iter().map(count_errors).sum(),
        Value::Null => 0,
        Value::String(s) if s.is_empty() => 0,
        _ => 1,
    }
}

/// Returns true if the tree holds at least one error leaf
pub fn has_errors(tree: &Value) -> bool {
    match tree {
        Value::Object(map) => map.values().any(has_errors),
        Value::Array(items) => items.iter().any(has_errors),
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_later_source_wins_per_leaf() {
        let field = json!({"a": "x"});
        let schema = json!({"a": "y", "b": "z"});
        let function = json!({});
        assert_eq!(merge_all([&field, &schema, &function]), json!({"a": "y", "b": "z"}));
    }

    #[test]
    fn test_nested_objects_merge() {
        let field = json!({"user": {"name": "Required"}});
        let function = json!({"user": {"email": "Taken"}});
        assert_eq!(
            merge_all([&field, &function]),
            json!({"user": {"name": "Required", "email": "Taken"}})
        );
    }

    #[test]
    fn test_arrays_are_replaced_not_concatenated() {
        let first = json!({"friends": [{"name": "Required"}, null]});
        let second = json!({"friends": [null, {"name": "Too long"}]});
        assert_eq!(
            merge_errors(&first, &second),
            json!({"friends": [null, {"name": "Too long"}]})
        );
    }

    #[test]
    fn test_repeated_merge_does_not_duplicate() {
        let errors = json!({"tags": ["Unknown tag"]});
        let once = merge_errors(&errors, &errors);
        let twice = merge_errors(&once, &errors);
        assert_eq!(twice, errors);
    }

    #[test]
    fn test_scalar_replaces_object() {
        let first = json!({"address": {"city": "Required"}});
        let second = json!({"address": "Invalid address"});
        assert_eq!(merge_errors(&first, &second), second);
    }

    #[test]
    fn test_merge_all_empty_is_empty_tree() {
        assert_eq!(merge_all(std::iter::empty()), json!({}));
    }

    #[test]
    fn test_has_errors() {
        assert!(!has_errors(&json!({})));
        assert!(!has_errors(&json!({"a": {}, "b": [], "c": null, "d": ""})));
        assert!(has_errors(&json!({"a": {"b": [null, "bad"]}})));
    }

    #[test]
    fn test_count_errors() {
        assert_eq!(count_errors(&json!({"a": "x", "b": {"c": "y", "d": ""}, "e": [null, "z"]})), 3);
    }
}
