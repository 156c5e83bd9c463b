//! Generic value tree.
//!
//! [`Value`] is the generic form records are converted to and from: string
//! keyed maps for records, lists for ordered containers, sets for set-like
//! containers, ISO-8601 text for temporal values and plain scalars for
//! everything else.

use crate::enumeration::EnumMember;
use bytes::Bytes;
use indexmap::{Equivalent, IndexMap, IndexSet};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Generic, format-independent value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Explicit null.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes (only produced when `use_bytes` is set).
    Bytes(Bytes),
    /// Enumeration member (only produced when `use_enum` is set).
    Enum(EnumMember),
    /// Ordered sequence.
    List(Vec<Value>),
    /// Unordered collection of distinct values.
    Set(Vec<Value>),
    /// Key to value mapping preserving insertion order.
    Map(Map),
}

impl Value {
    /// Returns a short name for the kind of value, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Enum(_) => "enum member",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
        }
    }

    /// Returns true if this is [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true if this value is a scalar (not a container).
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Null | Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Text(_)
        )
    }

    /// Returns the map if this value is one.
    #[must_use]
    pub const fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the text if this value is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the items of a list or set.
    #[must_use]
    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) | Self::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Drops items equal to an earlier item, keeping first occurrences in
    /// order.
    #[must_use]
    pub fn distinct(items: Vec<Value>) -> Vec<Value> {
        items
            .into_iter()
            .map(Key)
            .collect::<IndexSet<Key>>()
            .into_iter()
            .map(|key| key.0)
            .collect()
    }

    /// Looks up a string key when this value is a map.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get_str(key))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => unordered_eq(a, b),
            (Self::Map(a), Self::Map(b)) => a == b,
            _ => false,
        }
    }
}

/// Hashing agrees with equality: sets and maps, whose equality ignores
/// order, hash only their kind and size.
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Text(s) => s.hash(state),
            Self::Null => 0u8.hash(state),
            Self::Bool(b) => (1u8, b).hash(state),
            Self::Int(i) => (2u8, i).hash(state),
            Self::Float(x) => (3u8, float_bits(*x)).hash(state),
            Self::Bytes(b) => (4u8, b).hash(state),
            Self::Enum(m) => (5u8, m).hash(state),
            Self::List(items) => (6u8, items).hash(state),
            Self::Set(items) => (7u8, items.len()).hash(state),
            Self::Map(map) => (8u8, map.len()).hash(state),
        }
    }
}

/// Returns the bits of a float with both zeros folded together.
#[must_use]
pub fn float_bits(x: f64) -> u64 {
    if x == 0.0 { 0 } else { x.to_bits() }
}

/// Compares two collections ignoring order.
pub fn unordered_eq<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().all(|x| b.contains(x)) && b.iter().all(|x| a.contains(x))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::Enum(m) => write!(f, "{m:?}"),
            Self::List(items) => write_items(f, "[", items, "]"),
            Self::Set(items) => write_items(f, "{", items, "}"),
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, open: &str, items: &[Value], close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(close)
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<EnumMember> for Value {
    fn from(value: EnumMember) -> Self {
        Self::Enum(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Self::Map(value)
    }
}

/// Insertion-ordered mapping between generic values.
///
/// Keys are compared with [`Value`] equality; inserting an existing key
/// replaces its value in place.
#[derive(Clone, Default)]
pub struct Map {
    entries: IndexMap<Key, Value>,
}

#[derive(Clone)]
struct Key(Value);

struct KeyRef<'a>(&'a Value);

struct TextRef<'a>(&'a str);

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl Hash for KeyRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl Equivalent<Key> for KeyRef<'_> {
    fn equivalent(&self, key: &Key) -> bool {
        *self.0 == key.0
    }
}

// Must hash exactly like `Value::Text`.
impl Hash for TextRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl Equivalent<Key> for TextRef<'_> {
    fn equivalent(&self, key: &Key) -> bool {
        key.0.as_str() == Some(self.0)
    }
}

impl Map {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty map with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Inserts a key/value pair, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(Key(key.into()), value.into())
    }

    /// Looks up a key.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(&KeyRef(key))
    }

    /// Looks up a text key.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.entries.get(&TextRef(key))
    }

    /// Returns true if the map contains the text key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&TextRef(key))
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (&k.0, v))
    }

    /// Iterates over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.keys().map(|k| &k.0)
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut map = Self::with_capacity(iter.size_hint().0);
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for Map {
    type Item = (Value, Value);
    type IntoIter = std::vec::IntoIter<(Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries
            .into_iter()
            .map(|(k, v)| (k.0, v))
            .collect::<Vec<_>>()
            .into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_insert_replaces() {
        let mut map = Map::new();
        assert!(map.insert("a", 1).is_none());
        assert_eq!(map.insert("a", 2), Some(Value::Int(1)));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get_str("a"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_map_preserves_insertion_order() {
        let map: Map = [("z", 1), ("a", 2), ("m", 3)].into_iter().collect();
        let keys: Vec<_> = map.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn test_map_equality_ignores_order() {
        let a: Map = [("x", 1), ("y", 2)].into_iter().collect();
        let b: Map = [("y", 2), ("x", 1)].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_set_equality_ignores_order() {
        let a = Value::Set(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::Set(vec![Value::Int(2), Value::Int(1)]);
        assert_eq!(a, b);
        assert_ne!(
            Value::List(vec![Value::Int(1), Value::Int(2)]),
            Value::List(vec![Value::Int(2), Value::Int(1)])
        );
    }

    #[test]
    fn test_map_lookup_by_any_key() {
        let mut map = Map::new();
        map.insert(Value::Int(1), "one");
        map.insert(Value::Float(-0.0), "zero");
        map.insert("1", "text");
        assert_eq!(map.get(&Value::Int(1)), Some(&Value::from("one")));
        assert_eq!(map.get(&Value::Float(0.0)), Some(&Value::from("zero")));
        assert_eq!(map.get_str("1"), Some(&Value::from("text")));
        assert!(map.contains_key("1"));
        assert!(!map.contains_key("2"));
    }

    #[test]
    fn test_map_large() {
        let n = 50_000;
        let map: Map = (0..n).map(|i| (format!("k{i}"), Value::Int(i))).collect();
        assert_eq!(map.len(), 50_000);
        for i in (0..n).step_by(997) {
            assert_eq!(map.get_str(&format!("k{i}")), Some(&Value::Int(i)));
        }
        let copy: Map = map.clone().into_iter().collect();
        assert_eq!(copy, map);
    }

    #[test]
    fn test_distinct_values() {
        let items = vec![
            Value::Int(2),
            Value::from("a"),
            Value::Int(2),
            Value::Int(1),
            Value::from("a"),
        ];
        assert_eq!(
            Value::distinct(items),
            vec![Value::Int(2), Value::from("a"), Value::Int(1)]
        );
    }

    #[test]
    fn test_int_and_float_are_distinct() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
    }

    #[test]
    fn test_display() {
        let mut map = Map::new();
        map.insert("k", vec![Value::Int(1), Value::Null]);
        assert_eq!(Value::Map(map).to_string(), "{\"k\": [1, null]}");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
    }

    #[test]
    fn test_get_on_non_map() {
        assert!(Value::Int(3).get("a").is_none());
        assert_eq!(Value::Int(3).kind(), "int");
    }
}
