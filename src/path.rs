//! Path accessor for nested value trees
//!
//! Paths address a location inside a `serde_json::Value` using dotted and
//! bracketed segments, e.g. `items[2].name` or `a["b"].c`. Every write returns
//! a new tree; inputs are never mutated.

use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;

/// A single path segment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Seg {
    /// Object key access
    Key(String),
    /// Array index access (a non-negative integer segment)
    Index(usize),
}

/// Largest gap past the end of an array that a write may fill with nulls.
/// Indices further out are written as object keys instead.
pub const MAX_INDEX_GAP: usize = 10_000;

impl Seg {
    /// Canonical non-negative integers (`0`, `7`, not `07`) become indices
    fn parse(raw: &str) -> Self {
        let canonical = raw == "0" || !raw.starts_with('0');
        if canonical && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = raw.parse::<usize>() {
                return Seg::Index(index);
            }
        }
        Seg::Key(raw.to_string())
    }

    /// The segment as an object key
    pub fn key(&self) -> Cow<'_, str> {
        match self {
            Seg::Key(k) => Cow::Borrowed(k),
            Seg::Index(i) => Cow::Owned(i.to_string()),
        }
    }

    /// Returns true if this segment addresses an array slot
    pub fn is_index(&self) -> bool {
        matches!(self, Seg::Index(_))
    }
}

impl fmt::Display for Seg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seg::Key(k) => write!(f, "{k}"),
            Seg::Index(i) => write!(f, "{i}"),
        }
    }
}

/// A parsed field path
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<Seg>);

impl Path {
    /// Tokenize a dotted/bracketed path string.
    ///
    /// Quotes inside brackets are stripped and empty segments are dropped,
    /// so `a..b` and `a.b` address the same location.
    pub fn parse(raw: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut in_bracket = false;

        for ch in raw.chars() {
            match ch {
                '.' if !in_bracket => flush(&mut segments, &mut current, false),
                '[' if !in_bracket => {
                    flush(&mut segments, &mut current, false);
                    in_bracket = true;
                }
                ']' if in_bracket => {
                    flush(&mut segments, &mut current, true);
                    in_bracket = false;
                }
                _ => current.push(ch),
            }
        }
        flush(&mut segments, &mut current, in_bracket);

        Self(segments)
    }

    /// Get the segments of this path
    pub fn segments(&self) -> &[Seg] {
        &self.0
    }

    /// Check if this path is empty (root)
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolve this path against a tree
    pub fn get<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut node = root;
        for seg in &self.0 {
            node = child(node, seg)?;
        }
        Some(node)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            match seg {
                Seg::Index(idx) => write!(f, "[{idx}]")?,
                Seg::Key(k) if i == 0 => write!(f, "{k}")?,
                Seg::Key(k) => write!(f, ".{k}")?,
            }
        }
        Ok(())
    }
}

fn flush(segments: &mut Vec<Seg>, current: &mut String, bracketed: bool) {
    let token = if bracketed {
        current.trim().trim_matches(|c| c == '"' || c == '\'')
    } else {
        current.as_str()
    };
    if !token.is_empty() {
        segments.push(Seg::parse(token));
    }
    current.clear();
}

fn child<'a>(node: &'a Value, seg: &Seg) -> Option<&'a Value> {
    match (node, seg) {
        (Value::Object(map), seg) => map.get(seg.key().as_ref()),
        (Value::Array(items), Seg::Index(i)) => items.get(*i),
        _ => None,
    }
}

fn child_mut<'a>(node: &'a mut Value, seg: &Seg) -> Option<&'a mut Value> {
    match (node, seg) {
        (Value::Object(map), seg) => map.get_mut(seg.key().as_ref()),
        (Value::Array(items), Seg::Index(i)) => items.get_mut(*i),
        _ => None,
    }
}

/// Returns true for objects and arrays
pub fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// An empty object, the canonical empty error/touched tree
pub fn empty_tree() -> Value {
    Value::Object(Map::new())
}

/// Resolve `path` against `root`.
///
/// Returns `None` when any intermediate segment is missing or not a
/// container. A leaf that is present but `null` resolves to `Some(Null)`.
pub fn get_in<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    Path::parse(path).get(root)
}

/// Return a copy of `root` with the leaf at `path` replaced by `value`.
///
/// Missing intermediates are created: an array when the segment indexing
/// into it is a non-negative integer, an object otherwise.
pub fn set_in(root: &Value, path: &str, value: Value) -> Value {
    let path = Path::parse(path);
    set_owned(root.clone(), path.segments(), value)
}

/// Return a copy of `root` with the leaf at `path` removed.
///
/// Removed array slots become `null`. A path with missing intermediates
/// leaves the copy unchanged.
pub fn remove_in(root: &Value, path: &str) -> Value {
    let path = Path::parse(path);
    let mut out = root.clone();
    remove_at(&mut out, path.segments());
    out
}

/// Same container shape as `root` with every leaf replaced by `fill`
pub fn set_nested_values(root: &Value, fill: &Value) -> Value {
    match root {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), set_nested_values(v, fill)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| set_nested_values(v, fill))
                .collect(),
        ),
        _ => fill.clone(),
    }
}

fn empty_container_for(seg: &Seg) -> Value {
    if seg.is_index() {
        Value::Array(Vec::new())
    } else {
        empty_tree()
    }
}

fn set_owned(node: Value, segs: &[Seg], value: Value) -> Value {
    let Some((seg, rest)) = segs.split_first() else {
        return value;
    };

    let mut container = if is_container(&node) {
        node
    } else {
        empty_container_for(seg)
    };

    let existing = child_mut(&mut container, seg)
        .map(Value::take)
        .unwrap_or_default();
    let updated = set_owned(existing, rest, value);
    put_child(&mut container, seg, updated);
    container
}

fn put_child(container: &mut Value, seg: &Seg, value: Value) {
    match (&mut *container, seg) {
        (Value::Object(map), seg) => {
            map.insert(seg.key().into_owned(), value);
        }
        (Value::Array(items), Seg::Index(i)) if *i < items.len() => {
            items[*i] = value;
        }
        (Value::Array(items), Seg::Index(i)) if *i - items.len() <= MAX_INDEX_GAP => {
            items.resize(*i, Value::Null);
            items.push(value);
        }
        (Value::Array(items), seg) => {
            // A keyed write into an array keeps the elements under their indices
            let mut map: Map<String, Value> = std::mem::take(items)
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect();
            map.insert(seg.key().into_owned(), value);
            *container = Value::Object(map);
        }
        (_, seg) => {
            let mut map = Map::new();
            map.insert(seg.key().into_owned(), value);
            *container = Value::Object(map);
        }
    }
}

fn remove_at(node: &mut Value, segs: &[Seg]) {
    let Some((seg, rest)) = segs.split_first() else {
        return;
    };

    if rest.is_empty() {
        match (node, seg) {
            (Value::Object(map), seg) => {
                map.remove(seg.key().as_ref());
            }
            (Value::Array(items), Seg::Index(i)) => {
                if let Some(slot) = items.get_mut(*i) {
                    *slot = Value::Null;
                }
            }
            _ => {}
        }
        return;
    }

    if let Some(next) = child_mut(node, seg) {
        remove_at(next, rest);
    }
}
