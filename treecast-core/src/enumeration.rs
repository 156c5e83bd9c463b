//! Enumeration types and members.
//!
//! An enumeration is a named, ordered set of members, each carrying a scalar
//! underlying [`Value`]. Depending on [`ConvertOptions::use_enum`] the generic
//! form holds either the member itself or that underlying value.
//!
//! [`ConvertOptions::use_enum`]: crate::options::ConvertOptions

use crate::value::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Enumeration type definition.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    /// Module (namespace) the enumeration is declared in.
    pub module: String,
    /// Short type name.
    pub name: String,
    /// Members in declaration order.
    pub members: Vec<EnumVariant>,
}

/// A single declared enumeration member.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumVariant {
    /// Member name.
    pub name: String,
    /// Underlying value.
    pub value: Value,
}

impl EnumType {
    /// Creates a new enumeration type.
    #[must_use]
    pub fn new<N, I>(module: impl Into<String>, name: impl Into<String>, members: I) -> Arc<Self>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Value)>,
    {
        Arc::new(Self {
            module: module.into(),
            name: name.into(),
            members: members
                .into_iter()
                .map(|(name, value)| EnumVariant {
                    name: name.into(),
                    value,
                })
                .collect(),
        })
    }

    /// Returns the fully qualified name (`module.Name`).
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }

    /// Looks up a member by name.
    #[must_use]
    pub fn member(self: &Arc<Self>, name: &str) -> Option<EnumMember> {
        self.members
            .iter()
            .position(|m| m.name == name)
            .map(|index| EnumMember {
                ty: Arc::clone(self),
                index,
            })
    }

    /// Looks up the first member whose underlying value equals `value`.
    #[must_use]
    pub fn from_value(self: &Arc<Self>, value: &Value) -> Option<EnumMember> {
        self.members
            .iter()
            .position(|m| &m.value == value)
            .map(|index| EnumMember {
                ty: Arc::clone(self),
                index,
            })
    }
}

/// A reference to one member of an [`EnumType`].
#[derive(Clone)]
pub struct EnumMember {
    ty: Arc<EnumType>,
    index: usize,
}

impl EnumMember {
    /// Returns the enumeration this member belongs to.
    #[must_use]
    pub fn enum_type(&self) -> &Arc<EnumType> {
        &self.ty
    }

    /// Returns the member name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.ty.members[self.index].name
    }

    /// Returns the underlying value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.ty.members[self.index].value
    }

    /// Returns true if this member belongs to `ty`.
    #[must_use]
    pub fn is_member_of(&self, ty: &Arc<EnumType>) -> bool {
        Arc::ptr_eq(&self.ty, ty) || *self.ty == **ty
    }
}

impl PartialEq for EnumMember {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.is_member_of(&other.ty)
    }
}

impl Hash for EnumMember {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ty.name.hash(state);
        self.index.hash(state);
    }
}

impl fmt::Debug for EnumMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.ty.name, self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color() -> Arc<EnumType> {
        EnumType::new(
            "paint",
            "Color",
            [("RED", Value::Int(1)), ("GREEN", Value::Int(2))],
        )
    }

    #[test]
    fn test_member_lookup() {
        let color = color();
        let red = color.member("RED").unwrap();
        assert_eq!(red.name(), "RED");
        assert_eq!(red.value(), &Value::Int(1));
        assert!(color.member("BLUE").is_none());
    }

    #[test]
    fn test_from_value() {
        let color = color();
        let green = color.from_value(&Value::Int(2)).unwrap();
        assert_eq!(green.name(), "GREEN");
        assert!(color.from_value(&Value::Int(3)).is_none());
        assert!(color.from_value(&Value::Text("2".to_string())).is_none());
    }

    #[test]
    fn test_member_equality_and_debug() {
        let color = color();
        assert_eq!(color.member("RED"), color.from_value(&Value::Int(1)));
        assert_ne!(color.member("RED"), color.member("GREEN"));
        assert_eq!(format!("{:?}", color.member("RED").unwrap()), "Color.RED");
        assert_eq!(color.qualified_name(), "paint.Color");
    }
}
