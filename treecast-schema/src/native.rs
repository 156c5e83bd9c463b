//! Native field values.
//!
//! [`Native`] is the in-memory value held by a record field. Unlike the
//! generic [`Value`] it keeps container kinds apart (tuple vs list, set vs
//! frozen set), carries temporal values as `chrono` types and holds nested
//! records directly.

use crate::record::Record;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use std::collections::{HashSet, VecDeque};
use std::hash::{Hash, Hasher};
use treecast_core::value::{float_bits, unordered_eq};
use treecast_core::{EnumMember, Map, Value};

/// Key/value pairs of a native mapping, in insertion order.
pub type NativePairs = Vec<(Native, Native)>;

/// Native record field value.
#[derive(Debug, Clone, Default)]
pub enum Native {
    /// Absent value.
    #[default]
    None,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Str(String),
    /// Immutable byte sequence.
    Bytes(Bytes),
    /// Mutable byte sequence.
    ByteArray(Vec<u8>),
    /// List.
    List(Vec<Native>),
    /// Tuple.
    Tuple(Vec<Native>),
    /// Double-ended queue.
    Deque(VecDeque<Native>),
    /// Set of distinct values.
    Set(Vec<Native>),
    /// Immutable set of distinct values.
    FrozenSet(Vec<Native>),
    /// Dictionary.
    Dict(NativePairs),
    /// Chain of dictionaries, searched front to back.
    ChainMap(Vec<NativePairs>),
    /// Date and time of day without an offset.
    DateTime(NaiveDateTime),
    /// Date and time of day at a fixed UTC offset.
    ZonedDateTime(DateTime<FixedOffset>),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Elapsed duration.
    Duration(TimeDelta),
    /// Enumeration member.
    Enum(EnumMember),
    /// Nested record.
    Record(Record),
}

impl Native {
    /// Returns a short name for the kind of value, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::ByteArray(_) => "bytearray",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Deque(_) => "deque",
            Self::Set(_) => "set",
            Self::FrozenSet(_) => "frozenset",
            Self::Dict(_) => "dict",
            Self::ChainMap(_) => "ChainMap",
            Self::DateTime(_) | Self::ZonedDateTime(_) => "datetime",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::Duration(_) => "timedelta",
            Self::Enum(_) => "enum member",
            Self::Record(_) => "record",
        }
    }

    /// Returns true if this is [`Native::None`].
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Collects the items of any ordered or set-like container.
    #[must_use]
    pub fn items(&self) -> Option<Vec<&Native>> {
        match self {
            Self::List(items) | Self::Tuple(items) | Self::Set(items) | Self::FrozenSet(items) => {
                Some(items.iter().collect())
            }
            Self::Deque(items) => Some(items.iter().collect()),
            _ => None,
        }
    }

    /// Drops items equal to an earlier item, keeping first occurrences in
    /// order.
    #[must_use]
    pub fn distinct(items: Vec<Native>) -> Vec<Native> {
        let keep: Vec<bool> = {
            let mut seen = HashSet::with_capacity(items.len());
            items.iter().map(|item| seen.insert(ByEquality(item))).collect()
        };
        items
            .into_iter()
            .zip(keep)
            .filter_map(|(item, keep)| keep.then_some(item))
            .collect()
    }

    /// Returns the raw bytes of a byte sequence.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            Self::ByteArray(b) => Some(b),
            _ => None,
        }
    }

    /// Lifts plain generic data into native form.
    ///
    /// Lists become lists, sets become sets and maps become dictionaries.
    #[must_use]
    pub fn from_plain(value: &Value) -> Self {
        match value {
            Value::Null => Self::None,
            Value::Bool(b) => Self::Bool(*b),
            Value::Int(i) => Self::Int(*i),
            Value::Float(x) => Self::Float(*x),
            Value::Text(s) => Self::Str(s.clone()),
            Value::Bytes(b) => Self::Bytes(b.clone()),
            Value::Enum(m) => Self::Enum(m.clone()),
            Value::List(items) => Self::List(items.iter().map(Self::from_plain).collect()),
            Value::Set(items) => Self::Set(items.iter().map(Self::from_plain).collect()),
            Value::Map(map) => Self::Dict(
                map.iter()
                    .map(|(k, v)| (Self::from_plain(k), Self::from_plain(v)))
                    .collect(),
            ),
        }
    }

    /// Lowers plain native data into generic form.
    ///
    /// Returns `None` if the value, or anything nested in it, is a temporal
    /// value or a record; those need a declared type to be converted.
    #[must_use]
    pub fn to_plain(&self) -> Option<Value> {
        let value = match self {
            Self::None => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Int(*i),
            Self::Float(x) => Value::Float(*x),
            Self::Str(s) => Value::Text(s.clone()),
            Self::Bytes(b) => Value::Bytes(b.clone()),
            Self::ByteArray(b) => Value::Bytes(Bytes::copy_from_slice(b)),
            Self::Enum(m) => Value::Enum(m.clone()),
            Self::List(items) | Self::Tuple(items) => Value::List(lower_all(items.iter())?),
            Self::Deque(items) => Value::List(lower_all(items.iter())?),
            Self::Set(items) | Self::FrozenSet(items) => Value::Set(lower_all(items.iter())?),
            Self::Dict(pairs) => Value::Map(lower_pairs(pairs)?),
            Self::ChainMap(maps) => Value::List(
                maps.iter()
                    .map(|pairs| lower_pairs(pairs).map(Value::Map))
                    .collect::<Option<Vec<_>>>()?,
            ),
            Self::DateTime(_)
            | Self::ZonedDateTime(_)
            | Self::Date(_)
            | Self::Time(_)
            | Self::Duration(_)
            | Self::Record(_) => return None,
        };
        Some(value)
    }
}

fn lower_all<'a>(items: impl Iterator<Item = &'a Native>) -> Option<Vec<Value>> {
    items.map(Native::to_plain).collect()
}

fn lower_pairs(pairs: &[(Native, Native)]) -> Option<Map> {
    let mut map = Map::with_capacity(pairs.len());
    for (k, v) in pairs {
        map.insert(k.to_plain()?, v.to_plain()?);
    }
    Some(map)
}

fn pairs_eq(a: &[(Native, Native)], b: &[(Native, Native)]) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(k, v)| b.iter().any(|(k2, v2)| k == k2 && v == v2))
}

impl PartialEq for Native {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::ByteArray(a), Self::ByteArray(b)) => a == b,
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Deque(a), Self::Deque(b)) => a == b,
            (Self::Set(a), Self::Set(b)) | (Self::FrozenSet(a), Self::FrozenSet(b)) => {
                unordered_eq(a, b)
            }
            (Self::Dict(a), Self::Dict(b)) => pairs_eq(a, b),
            (Self::ChainMap(a), Self::ChainMap(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| pairs_eq(x, y))
            }
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::ZonedDateTime(a), Self::ZonedDateTime(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Time(a), Self::Time(b)) => a == b,
            (Self::Duration(a), Self::Duration(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::Record(a), Self::Record(b)) => a == b,
            _ => false,
        }
    }
}

/// Hashing agrees with equality: unordered containers hash only their size.
impl Hash for Native {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::None => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(x) => float_bits(*x).hash(state),
            Self::Str(s) => s.hash(state),
            Self::Bytes(b) => b.hash(state),
            Self::ByteArray(b) => b.hash(state),
            Self::List(items) | Self::Tuple(items) => items.hash(state),
            Self::Deque(items) => items.hash(state),
            Self::Set(items) | Self::FrozenSet(items) => items.len().hash(state),
            Self::Dict(pairs) => pairs.len().hash(state),
            Self::ChainMap(maps) => {
                maps.len().hash(state);
                for pairs in maps {
                    pairs.len().hash(state);
                }
            }
            Self::DateTime(dt) => dt.hash(state),
            Self::ZonedDateTime(dt) => dt.hash(state),
            Self::Date(d) => d.hash(state),
            Self::Time(t) => t.hash(state),
            Self::Duration(d) => d.hash(state),
            Self::Enum(m) => m.hash(state),
            Self::Record(r) => r.hash(state),
        }
    }
}

struct ByEquality<'a>(&'a Native);

impl PartialEq for ByEquality<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for ByEquality<'_> {}

impl Hash for ByEquality<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Native {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i64 => Int,
    f64 => Float,
    String => Str,
    Bytes => Bytes,
    NaiveDateTime => DateTime,
    DateTime<FixedOffset> => ZonedDateTime,
    NaiveDate => Date,
    NaiveTime => Time,
    TimeDelta => Duration,
    EnumMember => Enum,
    Record => Record,
    Vec<Native> => List,
}

impl From<i32> for Native {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for Native {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl<T: Into<Native>> From<Option<T>> for Native {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::None, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_round_trip() {
        let native = Native::Dict(vec![
            (Native::from("a"), Native::List(vec![Native::from(1), Native::None])),
            (Native::from("b"), Native::Set(vec![Native::from(true)])),
        ]);
        let value = native.to_plain().unwrap();
        assert_eq!(Native::from_plain(&value), native);
    }

    #[test]
    fn test_to_plain_rejects_temporal() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert!(Native::Date(date).to_plain().is_none());
        assert!(Native::List(vec![Native::Date(date)]).to_plain().is_none());
    }

    #[test]
    fn test_tuple_lowers_to_list() {
        let value = Native::Tuple(vec![Native::from(1)]).to_plain().unwrap();
        assert_eq!(value, Value::List(vec![Value::Int(1)]));
    }

    #[test]
    fn test_set_equality_ignores_order() {
        let a = Native::Set(vec![Native::from(1), Native::from(2)]);
        let b = Native::Set(vec![Native::from(2), Native::from(1)]);
        assert_eq!(a, b);
        assert_ne!(a, Native::FrozenSet(vec![Native::from(1), Native::from(2)]));
    }

    #[test]
    fn test_dict_equality_ignores_order() {
        let a = Native::Dict(vec![(1.into(), "x".into()), (2.into(), "y".into())]);
        let b = Native::Dict(vec![(2.into(), "y".into()), (1.into(), "x".into())]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_keeps_first_occurrence() {
        let items = vec![
            Native::from(1),
            Native::from(2),
            Native::from(1),
            Native::Float(0.0),
            Native::Float(-0.0),
            Native::Set(vec![Native::from(1), Native::from(2)]),
            Native::Set(vec![Native::from(2), Native::from(1)]),
        ];
        assert_eq!(
            Native::distinct(items),
            vec![
                Native::from(1),
                Native::from(2),
                Native::Float(0.0),
                Native::Set(vec![Native::from(1), Native::from(2)]),
            ]
        );
    }

    #[test]
    fn test_zoned_datetime_compares_instants() {
        let a = DateTime::parse_from_rfc3339("2024-01-01T10:00:00+00:00").unwrap();
        let b = DateTime::parse_from_rfc3339("2024-01-01T12:00:00+02:00").unwrap();
        assert_eq!(Native::from(a), Native::from(b));
        assert_ne!(Native::from(a), Native::DateTime(a.naive_utc()));
        assert_eq!(Native::from(a).kind(), "datetime");
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Native::from(None::<i64>), Native::None);
        assert_eq!(Native::from(Some(3i64)), Native::Int(3));
    }

    #[test]
    fn test_items() {
        let deque = Native::Deque(VecDeque::from(vec![Native::from(1), Native::from(2)]));
        assert_eq!(deque.items().map(|i| i.len()), Some(2));
        assert!(Native::from(1).items().is_none());
    }
}
