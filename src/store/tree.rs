use serde_json::{Map, Value};

use super::path::StorePath;

/// Key marking a server-value placeholder, e.g. `{".sv": "timestamp"}`.
const SERVER_VALUE_KEY: &str = ".sv";

/// Placeholders resolved by the store at write time.
pub struct ServerValue;

impl ServerValue {
    /// Replaced by the store's monotonic millisecond clock when written.
    pub fn timestamp() -> Value {
        let mut map = Map::new();
        map.insert(SERVER_VALUE_KEY.to_string(), Value::String("timestamp".to_string()));
        Value::Object(map)
    }
}

/// Borrow the value at `path`, if any.
pub fn get_at<'a>(root: &'a Value, path: &StorePath) -> Option<&'a Value> {
    let mut node = root;
    for segment in path.segments() {
        node = node.as_object()?.get(segment)?;
    }
    Some(node)
}

/// Write `value` at `path`. Null removes; empty parents are pruned.
pub fn set_at(root: &mut Value, path: &StorePath, value: Value) {
    set_segments(root, path.segments(), value);
    if is_empty(root) {
        *root = Value::Null;
    }
}

fn set_segments(node: &mut Value, segments: &[String], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        *node = normalize(value);
        return;
    };

    if value.is_null() && !node.is_object() {
        return;
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };

    if rest.is_empty() {
        let value = normalize(value);
        if value.is_null() {
            map.remove(first);
        } else {
            map.insert(first.clone(), value);
        }
        return;
    }

    let child = map.entry(first.clone()).or_insert(Value::Null);
    set_segments(child, rest, value);
    if is_empty(child) {
        map.remove(first);
    }
}

/// Drop nulls and empty objects nested inside a written value.
fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let cleaned: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, normalize(v)))
                .filter(|(_, v)| !is_empty(v))
                .collect();
            if cleaned.is_empty() {
                Value::Null
            } else {
                Value::Object(cleaned)
            }
        }
        other => other,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Replace every server-value placeholder inside `value`.
pub fn resolve_server_values(value: &mut Value, timestamp: i64) {
    if is_timestamp_placeholder(value) {
        *value = Value::from(timestamp);
        return;
    }
    match value {
        Value::Object(map) => {
            for child in map.values_mut() {
                resolve_server_values(child, timestamp);
            }
        }
        Value::Array(items) => {
            for child in items.iter_mut() {
                resolve_server_values(child, timestamp);
            }
        }
        _ => {}
    }
}

fn is_timestamp_placeholder(value: &Value) -> bool {
    match value.as_object() {
        Some(map) => map.len() == 1 && map.get(SERVER_VALUE_KEY).and_then(Value::as_str) == Some("timestamp"),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(raw: &str) -> StorePath {
        StorePath::parse(raw).unwrap()
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let mut root = Value::Null;
        set_at(&mut root, &path("sessions/1/users/a"), json!({"name": "Asha"}));
        assert_eq!(root, json!({"sessions": {"1": {"users": {"a": {"name": "Asha"}}}}}));
        assert_eq!(get_at(&root, &path("sessions/1/users/a/name")), Some(&json!("Asha")));
        assert_eq!(get_at(&root, &path("sessions/2")), None);
    }

    #[test]
    fn removing_last_child_prunes_parents() {
        let mut root = json!({"sessions": {"1": {"users": {"a": {"name": "Asha"}}, "created": 5}}});
        set_at(&mut root, &path("sessions/1/users/a"), Value::Null);
        assert_eq!(root, json!({"sessions": {"1": {"created": 5}}}));
        set_at(&mut root, &path("sessions/1/created"), Value::Null);
        assert_eq!(root, Value::Null);
    }

    #[test]
    fn nested_nulls_are_dropped_on_write() {
        let mut root = Value::Null;
        set_at(&mut root, &path("a"), json!({"b": null, "c": {}, "d": 1}));
        assert_eq!(root, json!({"a": {"d": 1}}));
    }

    #[test]
    fn resolves_timestamp_placeholders() {
        let mut value = json!({"joined": ServerValue::timestamp(), "list": [ServerValue::timestamp()], "name": "x"});
        resolve_server_values(&mut value, 42);
        assert_eq!(value, json!({"joined": 42, "list": [42], "name": "x"}));
    }
}
