//! Namespace tracking for generation passes.
//!
//! Records which namespaces the declared types of a record refer to. The
//! routines themselves hold resolved type handles, so the set is kept for
//! reporting: a [`BuildReport`](crate::BuildReport) lists the namespaces a
//! pass had to bind beyond the standard ones.

use treecast_schema::DeclaredType;

/// Namespaces every pass starts with.
pub const STANDARD_NAMESPACES: &[&str] = &[
    "builtins",
    "collections",
    "collections.abc",
    "datetime",
    "enum",
    "typing",
];

/// Set of namespaces bound during one generation pass.
#[derive(Debug, Clone)]
pub struct NamespaceSet {
    bound: Vec<String>,
    added: Vec<String>,
}

impl Default for NamespaceSet {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceSet {
    /// Creates a set seeded with [`STANDARD_NAMESPACES`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            bound: STANDARD_NAMESPACES.iter().map(|s| (*s).to_string()).collect(),
            added: Vec::new(),
        }
    }

    /// Returns true if the namespace is bound.
    #[must_use]
    pub fn contains(&self, namespace: &str) -> bool {
        self.bound.iter().any(|n| n == namespace)
    }

    /// Binds a namespace; returns true if it was not bound before.
    pub fn bind(&mut self, namespace: &str) -> bool {
        if self.contains(namespace) {
            return false;
        }
        tracing::trace!("binding namespace {}", namespace);
        self.bound.push(namespace.to_string());
        self.added.push(namespace.to_string());
        true
    }

    /// Binds the namespace of a declared type and, transitively, those of its
    /// type arguments, union alternatives and type variable constraints.
    pub fn bind_type(&mut self, ty: &DeclaredType) {
        self.bind(ty.namespace());
        for child in ty.children() {
            self.bind_type(child);
        }
    }

    /// Returns the namespaces bound beyond the standard ones, in binding order.
    #[must_use]
    pub fn added(&self) -> &[String] {
        &self.added
    }

    /// Consumes the set, returning the added namespaces.
    #[must_use]
    pub fn into_added(self) -> Vec<String> {
        self.added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treecast_core::{EnumType, Value};

    #[test]
    fn test_standard_namespaces_bound() {
        let mut set = NamespaceSet::new();
        assert!(set.contains("datetime"));
        assert!(!set.bind("typing"));
        assert!(set.added().is_empty());
    }

    #[test]
    fn test_bind_once() {
        let mut set = NamespaceSet::new();
        assert!(set.bind("shop"));
        assert!(!set.bind("shop"));
        assert_eq!(set.added(), ["shop"]);
    }

    #[test]
    fn test_bind_type_recurses() {
        let color = EnumType::new("paint", "Color", [("RED", Value::Int(1))]);
        let ty = DeclaredType::dict(
            DeclaredType::Str,
            DeclaredType::Union(vec![
                DeclaredType::Enum(color),
                DeclaredType::Opaque("decimal.Decimal".to_string()),
            ]),
        );
        let mut set = NamespaceSet::new();
        set.bind_type(&ty);
        assert_eq!(set.into_added(), ["paint", "decimal"]);
    }
}
