//! Decoding of raw query strings into the untyped parameter map.
//!
//! Two encodings are understood and may be mixed:
//!
//! ```text
//! ?_orderBy[title]=desc&query[0][type]=eq&query[0][field]=priority&query[0][value]=3
//! ?_orderBy={"title":"desc"}&query=[{"type":"eq","field":"priority","value":3}]
//! ```
//!
//! Bracket segments build nested maps; maps whose keys are all indices become
//! lists. A leaf that looks like a JSON object or array is decoded as JSON.
//! Scalars stay strings and are coerced later against the column type.
//!
//! Keys nested deeper than [`MAX_BRACKET_DEPTH`] segments are dropped.

use serde_json::{Map, Value};
use url::form_urlencoded;

/// Deepest bracket path kept, e.g. `query[0][type]` has depth 2.
pub const MAX_BRACKET_DEPTH: usize = 16;

/// Decode a raw (still percent-encoded) query string.
#[must_use]
pub fn parse_query_string(raw: &str) -> Map<String, Value> {
    let mut root = Map::new();
    for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
        let Some((head, path)) = split_key(&key) else {
            continue;
        };
        insert(&mut root, head, &path, decode_leaf(&value));
    }
    root.into_iter()
        .map(|(key, value)| (key, collapse_lists(value)))
        .collect()
}

/// `query[0][type]` -> (`query`, [`0`, `type`]). Empty names and paths deeper
/// than [`MAX_BRACKET_DEPTH`] are dropped.
fn split_key(key: &str) -> Option<(String, Vec<String>)> {
    let (head, mut rest) = key.find('[').map_or((key, ""), |i| key.split_at(i));
    if head.is_empty() {
        return None;
    }
    let mut path = Vec::new();
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(end) = stripped.find(']') else {
            break;
        };
        if path.len() == MAX_BRACKET_DEPTH {
            tracing::debug!(key = head, "Dropping query key nested too deeply");
            return None;
        }
        path.push(stripped[..end].to_string());
        rest = &stripped[end + 1..];
    }
    Some((head.to_string(), path))
}

fn insert(map: &mut Map<String, Value>, key: String, path: &[String], leaf: Value) {
    let Some((segment, rest)) = path.split_first() else {
        map.insert(key, leaf);
        return;
    };
    let entry = map.entry(key).or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    if let Value::Object(child) = entry {
        // `key[]=a&key[]=b` appends
        let segment = if segment.is_empty() {
            child.len().to_string()
        } else {
            segment.clone()
        };
        insert(child, segment, rest, leaf);
    }
}

fn decode_leaf(raw: &str) -> Value {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(decoded) = serde_json::from_str::<Value>(raw) {
            return decoded;
        }
    }
    Value::String(raw.to_string())
}

fn collapse_lists(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let is_list = !map.is_empty() && map.keys().all(|key| key.parse::<usize>().is_ok());
            if is_list {
                let mut items: Vec<(usize, Value)> = map
                    .into_iter()
                    .filter_map(|(key, value)| {
                        key.parse::<usize>()
                            .ok()
                            .map(|index| (index, collapse_lists(value)))
                    })
                    .collect();
                items.sort_by_key(|(index, _)| *index);
                Value::Array(items.into_iter().map(|(_, value)| value).collect())
            } else {
                Value::Object(
                    map.into_iter()
                        .map(|(key, value)| (key, collapse_lists(value)))
                        .collect(),
                )
            }
        }
        other => other,
    }
}
