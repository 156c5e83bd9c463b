//! Declared type definitions.
//!
//! [`DeclaredType`] is the raw, unclassified type of a record field, the
//! equivalent of a type annotation. It keeps the distinctions the classifier
//! needs (parameterized vs bare generics, optional vs general unions, type
//! variables) and renders back to the canonical spelling used in messages.

use crate::record::RecordType;
use std::fmt;
use std::sync::Arc;
use treecast_core::EnumType;

/// Scalar primitive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// Boolean.
    Bool,
    /// Integer.
    Int,
    /// Floating point number.
    Float,
    /// The none type.
    None,
}

impl PrimitiveKind {
    /// Returns the spelling of the primitive.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::None => "NoneType",
        }
    }
}

/// Temporal kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalKind {
    /// Date and time of day.
    DateTime,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Elapsed duration.
    Duration,
}

impl TemporalKind {
    /// Returns the qualified spelling of the temporal type.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DateTime => "datetime.datetime",
            Self::Date => "datetime.date",
            Self::Time => "datetime.time",
            Self::Duration => "datetime.timedelta",
        }
    }
}

/// Generic container origins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericKind {
    /// `List[T]`.
    List,
    /// `Tuple[T, ...]` or `Tuple[A, B, ...]`.
    Tuple,
    /// `Deque[T]`.
    Deque,
    /// `Set[T]`.
    Set,
    /// `FrozenSet[T]`.
    FrozenSet,
    /// `Dict[K, V]`.
    Dict,
    /// `Mapping[K, V]`.
    Mapping,
    /// `ChainMap[K, V]`.
    ChainMap,
    /// `Sequence[T]`.
    Sequence,
}

impl GenericKind {
    /// Returns the parameterized spelling's origin name.
    #[must_use]
    pub const fn typing_name(&self) -> &'static str {
        match self {
            Self::List => "List",
            Self::Tuple => "Tuple",
            Self::Deque => "Deque",
            Self::Set => "Set",
            Self::FrozenSet => "FrozenSet",
            Self::Dict => "Dict",
            Self::Mapping => "Mapping",
            Self::ChainMap => "ChainMap",
            Self::Sequence => "Sequence",
        }
    }

    /// Returns the spelling of the unparameterized type.
    #[must_use]
    pub const fn bare_name(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Tuple => "tuple",
            Self::Deque => "collections.deque",
            Self::Set => "set",
            Self::FrozenSet => "frozenset",
            Self::Dict => "dict",
            Self::Mapping => "typing.Mapping",
            Self::ChainMap => "collections.ChainMap",
            Self::Sequence => "typing.Sequence",
        }
    }

    /// Returns the number of type arguments the parameterized form takes.
    #[must_use]
    pub const fn arity(&self) -> usize {
        match self {
            Self::Dict | Self::Mapping | Self::ChainMap => 2,
            _ => 1,
        }
    }

    /// Returns the hint shown when the type is used without parameters.
    #[must_use]
    pub const fn hint(&self) -> &'static str {
        match self {
            Self::List => "Use List[T] instead",
            Self::Tuple => "Use Tuple[T] instead",
            Self::Deque => "Use Deque[T] instead",
            Self::Set => "Use Set[T] instead",
            Self::FrozenSet => "Use FrozenSet[T] instead",
            Self::Dict | Self::Mapping => "Use Dict[KT,VT] or Mapping[KT,VT] instead",
            Self::ChainMap => "Use ChainMap[KT,VT] instead",
            Self::Sequence => "Use Sequence[T] instead",
        }
    }

    /// Returns the namespace the origin is declared in.
    #[must_use]
    pub const fn namespace(&self) -> &'static str {
        match self {
            Self::Deque | Self::ChainMap => "collections",
            _ => "typing",
        }
    }
}

/// A field's declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclaredType {
    /// Wildcard type, values pass through.
    Any,
    /// Text-or-bytes type variable, values pass through.
    AnyStr,
    /// Scalar primitive.
    Primitive(PrimitiveKind),
    /// Text.
    Str,
    /// Immutable byte sequence.
    Bytes,
    /// Mutable byte sequence.
    ByteArray,
    /// Temporal value.
    Temporal(TemporalKind),
    /// Parameterized generic container.
    Generic {
        /// Container origin.
        origin: GenericKind,
        /// Type arguments.
        args: Vec<DeclaredType>,
    },
    /// Generic container used without parameters.
    Bare(GenericKind),
    /// Union of alternatives, order-significant.
    Union(Vec<DeclaredType>),
    /// Type variable, optionally constrained to fixed alternatives.
    TypeVar {
        /// Variable name.
        name: String,
        /// Allowed alternatives.
        constraints: Vec<DeclaredType>,
    },
    /// Enumeration.
    Enum(Arc<EnumType>),
    /// Nested record.
    Record(Arc<RecordType>),
    /// Any other named type.
    Opaque(String),
}

impl DeclaredType {
    /// `bool`.
    pub const BOOL: Self = Self::Primitive(PrimitiveKind::Bool);
    /// `int`.
    pub const INT: Self = Self::Primitive(PrimitiveKind::Int);
    /// `float`.
    pub const FLOAT: Self = Self::Primitive(PrimitiveKind::Float);
    /// `NoneType`.
    pub const NONE: Self = Self::Primitive(PrimitiveKind::None);
    /// `datetime.datetime`.
    pub const DATETIME: Self = Self::Temporal(TemporalKind::DateTime);
    /// `datetime.date`.
    pub const DATE: Self = Self::Temporal(TemporalKind::Date);
    /// `datetime.time`.
    pub const TIME: Self = Self::Temporal(TemporalKind::Time);
    /// `datetime.timedelta`.
    pub const TIMEDELTA: Self = Self::Temporal(TemporalKind::Duration);

    fn generic(origin: GenericKind, args: Vec<Self>) -> Self {
        Self::Generic { origin, args }
    }

    /// `List[T]`.
    #[must_use]
    pub fn list(item: Self) -> Self {
        Self::generic(GenericKind::List, vec![item])
    }

    /// `Tuple[T, ...]`.
    #[must_use]
    pub fn tuple(item: Self) -> Self {
        Self::generic(GenericKind::Tuple, vec![item])
    }

    /// `Tuple[A, B, ...]` with positional element types.
    #[must_use]
    pub fn fixed_tuple(items: Vec<Self>) -> Self {
        Self::generic(GenericKind::Tuple, items)
    }

    /// `Deque[T]`.
    #[must_use]
    pub fn deque(item: Self) -> Self {
        Self::generic(GenericKind::Deque, vec![item])
    }

    /// `Set[T]`.
    #[must_use]
    pub fn set(item: Self) -> Self {
        Self::generic(GenericKind::Set, vec![item])
    }

    /// `FrozenSet[T]`.
    #[must_use]
    pub fn frozenset(item: Self) -> Self {
        Self::generic(GenericKind::FrozenSet, vec![item])
    }

    /// `Sequence[T]`.
    #[must_use]
    pub fn sequence(item: Self) -> Self {
        Self::generic(GenericKind::Sequence, vec![item])
    }

    /// `Dict[K, V]`.
    #[must_use]
    pub fn dict(key: Self, value: Self) -> Self {
        Self::generic(GenericKind::Dict, vec![key, value])
    }

    /// `Mapping[K, V]`.
    #[must_use]
    pub fn mapping(key: Self, value: Self) -> Self {
        Self::generic(GenericKind::Mapping, vec![key, value])
    }

    /// `ChainMap[K, V]`.
    #[must_use]
    pub fn chain_map(key: Self, value: Self) -> Self {
        Self::generic(GenericKind::ChainMap, vec![key, value])
    }

    /// `Optional[T]`, a union of `T` and the none type.
    #[must_use]
    pub fn optional(inner: Self) -> Self {
        Self::Union(vec![inner, Self::NONE])
    }

    /// Returns true if this is `NoneType`.
    #[must_use]
    pub const fn is_none_type(&self) -> bool {
        matches!(self, Self::Primitive(PrimitiveKind::None))
    }

    /// Returns the nested types: generic arguments, union members or
    /// type variable constraints.
    #[must_use]
    pub fn children(&self) -> &[DeclaredType] {
        match self {
            Self::Generic { args, .. } => args,
            Self::Union(members) => members,
            Self::TypeVar { constraints, .. } => constraints,
            _ => &[],
        }
    }

    /// Returns the namespace that declares this type.
    #[must_use]
    pub fn namespace(&self) -> &str {
        match self {
            Self::Any | Self::AnyStr | Self::Union(_) | Self::TypeVar { .. } => "typing",
            Self::Primitive(_) | Self::Str | Self::Bytes | Self::ByteArray => "builtins",
            Self::Temporal(_) => "datetime",
            Self::Generic { origin, .. } => origin.namespace(),
            Self::Bare(origin) => match origin {
                GenericKind::Mapping | GenericKind::Sequence => "typing",
                GenericKind::Deque | GenericKind::ChainMap => "collections",
                _ => "builtins",
            },
            Self::Enum(e) => e.module.as_str(),
            Self::Record(r) => r.module.as_str(),
            Self::Opaque(name) => name.rsplit_once('.').map_or("builtins", |(module, _)| module),
        }
    }
}

impl From<Arc<RecordType>> for DeclaredType {
    fn from(value: Arc<RecordType>) -> Self {
        Self::Record(value)
    }
}

impl From<Arc<EnumType>> for DeclaredType {
    fn from(value: Arc<EnumType>) -> Self {
        Self::Enum(value)
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[DeclaredType]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{arg}")?;
    }
    Ok(())
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("typing.Any"),
            Self::AnyStr => f.write_str("typing.AnyStr"),
            Self::Primitive(p) => f.write_str(p.name()),
            Self::Str => f.write_str("str"),
            Self::Bytes => f.write_str("bytes"),
            Self::ByteArray => f.write_str("bytearray"),
            Self::Temporal(t) => f.write_str(t.name()),
            Self::Generic {
                origin: GenericKind::Tuple,
                args,
            } if args.len() == 1 => write!(f, "typing.Tuple[{}, ...]", args[0]),
            Self::Generic { origin, args } => {
                write!(f, "typing.{}[", origin.typing_name())?;
                write_args(f, args)?;
                f.write_str("]")
            }
            Self::Bare(origin) => f.write_str(origin.bare_name()),
            Self::Union(members) if members.len() == 2 && members[1].is_none_type() => {
                write!(f, "typing.Optional[{}]", members[0])
            }
            Self::Union(members) => {
                f.write_str("typing.Union[")?;
                write_args(f, members)?;
                f.write_str("]")
            }
            Self::TypeVar { name, .. } => write!(f, "~{name}"),
            Self::Enum(e) => write!(f, "{}.{}", e.module, e.name),
            Self::Record(r) => write!(f, "{}.{}", r.module, r.name),
            Self::Opaque(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_generics() {
        let ty = DeclaredType::dict(DeclaredType::Str, DeclaredType::list(DeclaredType::INT));
        assert_eq!(ty.to_string(), "typing.Dict[str, typing.List[int]]");
        assert_eq!(
            DeclaredType::tuple(DeclaredType::FLOAT).to_string(),
            "typing.Tuple[float, ...]"
        );
        assert_eq!(
            DeclaredType::fixed_tuple(vec![DeclaredType::INT, DeclaredType::Str]).to_string(),
            "typing.Tuple[int, str]"
        );
    }

    #[test]
    fn test_display_unions() {
        assert_eq!(
            DeclaredType::optional(DeclaredType::DATE).to_string(),
            "typing.Optional[datetime.date]"
        );
        let union = DeclaredType::Union(vec![DeclaredType::INT, DeclaredType::Str]);
        assert_eq!(union.to_string(), "typing.Union[int, str]");
    }

    #[test]
    fn test_display_bare() {
        assert_eq!(DeclaredType::Bare(GenericKind::List).to_string(), "list");
        assert_eq!(
            DeclaredType::Bare(GenericKind::Deque).to_string(),
            "collections.deque"
        );
    }

    #[test]
    fn test_generic_kind_arity() {
        assert_eq!(GenericKind::List.arity(), 1);
        assert_eq!(GenericKind::Dict.arity(), 2);
        assert_eq!(GenericKind::ChainMap.arity(), 2);
    }

    #[test]
    fn test_namespaces() {
        assert_eq!(DeclaredType::DATETIME.namespace(), "datetime");
        assert_eq!(DeclaredType::deque(DeclaredType::INT).namespace(), "collections");
        assert_eq!(DeclaredType::list(DeclaredType::INT).namespace(), "typing");
        assert_eq!(DeclaredType::Opaque("numbers.Complex".into()).namespace(), "numbers");
        assert_eq!(DeclaredType::Opaque("object".into()).namespace(), "builtins");
        let color = EnumType::new("paint", "Color", Vec::<(String, _)>::new());
        assert_eq!(DeclaredType::Enum(color).namespace(), "paint");
    }

    #[test]
    fn test_children() {
        let ty = DeclaredType::optional(DeclaredType::INT);
        assert_eq!(ty.children().len(), 2);
        assert!(DeclaredType::Str.children().is_empty());
    }
}
