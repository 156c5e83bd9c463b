//! Structural classification of declared types.
//!
//! [`classify`] maps a [`DeclaredType`] onto the [`TypeShape`] that selects a
//! conversion strategy. It is a pure function; element types are borrowed
//! from the declared type.

use crate::record::RecordType;
use crate::types::{DeclaredType, GenericKind, PrimitiveKind, TemporalKind};
use std::sync::Arc;
use treecast_core::EnumType;

/// Container category of a classified type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// `List[T]`.
    Sequence,
    /// `Tuple[T, ...]`.
    Tuple,
    /// `Tuple[A, B, ...]` with one element type per position.
    FixedTuple,
    /// `Deque[T]`.
    Deque,
    /// `Set[T]`.
    Set,
    /// `FrozenSet[T]`.
    FrozenSet,
    /// `Dict[K, V]` and `Mapping[K, V]`.
    Mapping,
    /// `ChainMap[K, V]`.
    ChainMap,
    /// `bytes`.
    ByteSequence,
    /// `bytearray`.
    ByteArray,
    /// `str`.
    Text,
    /// `Sequence[T]`.
    GenericSequence,
}

impl ContainerKind {
    /// Returns the number of element types the kind carries, `None` if any
    /// positive count is accepted.
    #[must_use]
    pub const fn arity(&self) -> Option<usize> {
        match self {
            Self::ByteSequence | Self::ByteArray | Self::Text => Some(0),
            Self::Mapping | Self::ChainMap => Some(2),
            Self::FixedTuple => None,
            _ => Some(1),
        }
    }

    /// Returns true for kinds whose elements are key/value pairs.
    #[must_use]
    pub const fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping | Self::ChainMap)
    }
}

/// Structural description of a declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeShape<'a> {
    /// Nested record.
    Record(&'a Arc<RecordType>),
    /// Parameterized container or text/byte sequence.
    Container {
        /// Container category.
        kind: ContainerKind,
        /// Element types; key and value for mappings.
        elements: &'a [DeclaredType],
    },
    /// `Optional[T]`: exactly two alternatives, the second being the none type.
    Optional(&'a DeclaredType),
    /// Union or constrained type variable; alternatives in declared order.
    Union(&'a [DeclaredType]),
    /// Enumeration.
    Enumeration(&'a Arc<EnumType>),
    /// Scalar primitive.
    Primitive(PrimitiveKind),
    /// Temporal value.
    Temporal(TemporalKind),
    /// Wildcard; values are used unchanged.
    PassThrough,
    /// Generic container used without parameters.
    Unparameterized {
        /// Container origin.
        origin: GenericKind,
        /// Parameterized spelling to use instead.
        hint: &'static str,
    },
    /// Not convertible.
    Unsupported {
        /// Description of the problem.
        reason: String,
    },
}

fn container_kind(origin: GenericKind, args: &[DeclaredType]) -> ContainerKind {
    match origin {
        GenericKind::List => ContainerKind::Sequence,
        GenericKind::Tuple if args.len() > 1 => ContainerKind::FixedTuple,
        GenericKind::Tuple => ContainerKind::Tuple,
        GenericKind::Deque => ContainerKind::Deque,
        GenericKind::Set => ContainerKind::Set,
        GenericKind::FrozenSet => ContainerKind::FrozenSet,
        GenericKind::Dict | GenericKind::Mapping => ContainerKind::Mapping,
        GenericKind::ChainMap => ContainerKind::ChainMap,
        GenericKind::Sequence => ContainerKind::GenericSequence,
    }
}

/// Classifies a declared type.
#[must_use]
pub fn classify(ty: &DeclaredType) -> TypeShape<'_> {
    match ty {
        DeclaredType::Any | DeclaredType::AnyStr => TypeShape::PassThrough,
        DeclaredType::Primitive(kind) => TypeShape::Primitive(*kind),
        DeclaredType::Str => TypeShape::Container {
            kind: ContainerKind::Text,
            elements: &[],
        },
        DeclaredType::Bytes => TypeShape::Container {
            kind: ContainerKind::ByteSequence,
            elements: &[],
        },
        DeclaredType::ByteArray => TypeShape::Container {
            kind: ContainerKind::ByteArray,
            elements: &[],
        },
        DeclaredType::Temporal(kind) => TypeShape::Temporal(*kind),
        DeclaredType::Generic { origin, args } => {
            let kind = container_kind(*origin, args);
            let arity_ok = match kind.arity() {
                Some(n) => args.len() == n,
                None => !args.is_empty(),
            };
            if arity_ok {
                TypeShape::Container {
                    kind,
                    elements: args,
                }
            } else {
                TypeShape::Unsupported {
                    reason: format!(
                        "{} takes {} type argument(s), got {}",
                        origin.typing_name(),
                        origin.arity(),
                        args.len()
                    ),
                }
            }
        }
        DeclaredType::Bare(origin) => TypeShape::Unparameterized {
            origin: *origin,
            hint: origin.hint(),
        },
        DeclaredType::Union(members) => match members.as_slice() {
            [inner, none] if none.is_none_type() => TypeShape::Optional(inner),
            [only] => classify(only),
            [] => TypeShape::Unsupported {
                reason: "empty union".to_string(),
            },
            _ => TypeShape::Union(members),
        },
        DeclaredType::TypeVar { constraints, .. } if constraints.is_empty() => {
            TypeShape::PassThrough
        }
        DeclaredType::TypeVar { constraints, .. } => TypeShape::Union(constraints),
        DeclaredType::Enum(e) => TypeShape::Enumeration(e),
        DeclaredType::Record(r) => TypeShape::Record(r),
        DeclaredType::Opaque(name) => TypeShape::Unsupported {
            reason: format!("{name} has no conversion"),
        },
    }
}
