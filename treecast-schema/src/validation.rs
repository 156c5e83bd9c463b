//! Declaration validation utilities.
//!
//! Checks record field lists and enumeration member lists before they are
//! used to build conversion routines.

use crate::error::SchemaError;
use crate::record::FieldDef;
use std::collections::HashSet;
use treecast_core::EnumType;

/// Validates the fields of a record declaration.
///
/// # Arguments
/// * `record` - Qualified record name, used in error messages
/// * `fields` - Fields in declaration order
///
/// # Errors
/// Returns `SchemaError` if a field name is empty or duplicated, or a field
/// without a default follows one with a default.
pub fn validate_fields(record: &str, fields: &[FieldDef]) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    let mut defaulted = false;

    for field in fields {
        if field.name.is_empty() {
            return Err(SchemaError::EmptyName {
                kind: "field",
                owner: record.to_string(),
            });
        }
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField {
                record: record.to_string(),
                field: field.name.clone(),
            });
        }
        if field.is_required() && defaulted {
            return Err(SchemaError::RequiredAfterDefault {
                record: record.to_string(),
                field: field.name.clone(),
            });
        }
        defaulted |= !field.is_required();
    }

    Ok(())
}

/// Validates an enumeration declaration.
///
/// # Errors
/// Returns `SchemaError` if a member name is empty or duplicated, or a
/// member value is not a scalar or repeats another member's value.
pub fn validate_enum(enum_type: &EnumType) -> Result<(), SchemaError> {
    let enum_name = enum_type.qualified_name();
    if enum_type.name.is_empty() {
        return Err(SchemaError::EmptyName {
            kind: "enum",
            owner: enum_type.module.clone(),
        });
    }

    let mut seen_names = HashSet::new();
    for (i, member) in enum_type.members.iter().enumerate() {
        if member.name.is_empty() {
            return Err(SchemaError::EmptyName {
                kind: "member",
                owner: enum_name,
            });
        }
        if !seen_names.insert(member.name.as_str()) {
            return Err(SchemaError::DuplicateMember {
                enum_name,
                member: member.name.clone(),
            });
        }
        if !member.value.is_scalar() {
            return Err(SchemaError::InvalidEnumValue {
                enum_name,
                member: member.name.clone(),
                reason: format!("{} is not a scalar", member.value.kind()),
            });
        }
        if let Some(first) = enum_type.members[..i]
            .iter()
            .find(|other| other.value == member.value)
        {
            return Err(SchemaError::InvalidEnumValue {
                enum_name,
                member: member.name.clone(),
                reason: format!("value {} already used by {}", member.value, first.name),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeclaredType;
    use treecast_core::Value;

    #[test]
    fn test_validate_valid_fields() {
        let fields = [
            FieldDef::new("a", DeclaredType::INT),
            FieldDef::new("b", DeclaredType::Str).with_default("x"),
        ];
        assert!(validate_fields("m.R", &fields).is_ok());
        assert!(validate_fields("m.Empty", &[]).is_ok());
    }

    #[test]
    fn test_validate_duplicate_field() {
        let fields = [
            FieldDef::new("a", DeclaredType::INT),
            FieldDef::new("a", DeclaredType::Str),
        ];
        assert_eq!(
            validate_fields("m.R", &fields),
            Err(SchemaError::DuplicateField {
                record: "m.R".to_string(),
                field: "a".to_string(),
            })
        );
    }

    #[test]
    fn test_validate_required_after_default() {
        let fields = [
            FieldDef::new("a", DeclaredType::INT).with_default(1),
            FieldDef::new("b", DeclaredType::INT),
        ];
        assert!(matches!(
            validate_fields("m.R", &fields),
            Err(SchemaError::RequiredAfterDefault { .. })
        ));
    }

    #[test]
    fn test_validate_empty_field_name() {
        let fields = [FieldDef::new("", DeclaredType::INT)];
        assert!(matches!(
            validate_fields("m.R", &fields),
            Err(SchemaError::EmptyName { kind: "field", .. })
        ));
    }

    #[test]
    fn test_validate_enum() {
        let good = EnumType::new("m", "Color", [("RED", Value::Int(1)), ("GREEN", Value::Int(2))]);
        assert!(validate_enum(&good).is_ok());

        let dup = EnumType::new("m", "Color", [("RED", Value::Int(1)), ("RED", Value::Int(2))]);
        assert!(matches!(
            validate_enum(&dup),
            Err(SchemaError::DuplicateMember { .. })
        ));

        let same_value = EnumType::new("m", "Color", [("RED", Value::Int(1)), ("ROUGE", Value::Int(1))]);
        assert!(matches!(
            validate_enum(&same_value),
            Err(SchemaError::InvalidEnumValue { .. })
        ));

        let nested = EnumType::new("m", "Color", [("RED", Value::List(vec![]))]);
        assert!(matches!(
            validate_enum(&nested),
            Err(SchemaError::InvalidEnumValue { .. })
        ));
    }
}
