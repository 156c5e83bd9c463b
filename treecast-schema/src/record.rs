//! Record declarations and instances.
//!
//! A [`RecordType`] is an ordered list of typed fields plus the slots its
//! generated conversion routines are installed into. A [`Record`] is one
//! instance: the record type and one [`Native`] value per field.

use crate::error::SchemaError;
use crate::native::Native;
use crate::types::DeclaredType;
use crate::validation::validate_fields;
use parking_lot::RwLock;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use treecast_core::{ConvertOptions, Error, Result, Value};

/// Installed encode routine: record to generic map.
pub type EncodeRoutine = Arc<dyn Fn(&Record, &ConvertOptions) -> Result<Value> + Send + Sync>;

/// Installed decode routine: generic map to record.
pub type DecodeRoutine = Arc<dyn Fn(&Value, &ConvertOptions) -> Result<Record> + Send + Sync>;

#[derive(Default, Clone)]
struct Routines {
    encode: Option<EncodeRoutine>,
    decode: Option<DecodeRoutine>,
}

/// Field definition within a record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Declared type.
    pub ty: DeclaredType,
    /// Default value, `None` if the field is required.
    pub default: Option<Native>,
}

impl FieldDef {
    /// Creates a required field.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: DeclaredType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Native>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Returns true if the field has no default.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Record type definition.
pub struct RecordType {
    /// Module (namespace) the record is declared in.
    pub module: String,
    /// Short type name.
    pub name: String,
    fields: Vec<FieldDef>,
    routines: RwLock<Routines>,
}

impl RecordType {
    /// Starts declaring a record type.
    #[must_use]
    pub fn builder(module: impl Into<String>, name: impl Into<String>) -> RecordTypeBuilder {
        RecordTypeBuilder {
            module: module.into(),
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Returns the fully qualified name (`module.Name`).
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }

    /// Returns the fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Installs an encode routine, replacing any previous one.
    pub fn install_encode(&self, routine: EncodeRoutine) {
        self.routines.write().encode = Some(routine);
    }

    /// Installs a decode routine, replacing any previous one.
    pub fn install_decode(&self, routine: DecodeRoutine) {
        self.routines.write().decode = Some(routine);
    }

    /// Installs both routines under a single lock acquisition.
    pub fn install(&self, encode: EncodeRoutine, decode: DecodeRoutine) {
        let mut routines = self.routines.write();
        routines.encode = Some(encode);
        routines.decode = Some(decode);
    }

    /// Returns true if an encode routine is installed.
    #[must_use]
    pub fn has_encoder(&self) -> bool {
        self.routines.read().encode.is_some()
    }

    /// Returns true if a decode routine is installed.
    #[must_use]
    pub fn has_decoder(&self) -> bool {
        self.routines.read().decode.is_some()
    }

    /// Returns the installed encode routine.
    ///
    /// # Errors
    /// Returns [`Error::NotInstalled`] if none is installed.
    pub fn encoder(&self) -> Result<EncodeRoutine> {
        self.routines
            .read()
            .encode
            .clone()
            .ok_or_else(|| Error::NotInstalled {
                record: self.qualified_name(),
                direction: "encode",
            })
    }

    /// Returns the installed decode routine.
    ///
    /// # Errors
    /// Returns [`Error::NotInstalled`] if none is installed.
    pub fn decoder(&self) -> Result<DecodeRoutine> {
        self.routines
            .read()
            .decode
            .clone()
            .ok_or_else(|| Error::NotInstalled {
                record: self.qualified_name(),
                direction: "decode",
            })
    }

    /// Builds a record from its generic form with the installed routine.
    ///
    /// # Errors
    /// Returns [`Error::NotInstalled`] if no decode routine is installed, or
    /// whatever the routine reports for malformed input.
    pub fn from_value(&self, value: &Value, options: &ConvertOptions) -> Result<Record> {
        let routine = self.decoder()?;
        routine(value, options)
    }

    /// Builds an instance from positional field arguments.
    ///
    /// `args` pairs field indices with values; fields left out receive their
    /// declared default.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if a field without a default is not
    /// supplied or an index is out of range.
    pub fn instantiate(self: &Arc<Self>, args: Vec<(usize, Native)>) -> Result<Record> {
        let mut slots: Vec<Option<Native>> = vec![None; self.fields.len()];
        for (index, value) in args {
            let slot = slots.get_mut(index).ok_or_else(|| {
                Error::invalid_argument(format!(
                    "{} has no field at position {index}",
                    self.qualified_name()
                ))
            })?;
            *slot = Some(value);
        }

        let values = slots
            .into_iter()
            .zip(&self.fields)
            .map(|(slot, field)| {
                slot.or_else(|| field.default.clone()).ok_or_else(|| {
                    Error::invalid_argument(format!(
                        "{}() missing required argument: '{}'",
                        self.name, field.name
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Record {
            ty: Arc::clone(self),
            values,
        })
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
            || (self.module == other.module && self.name == other.name && self.fields == other.fields)
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("module", &self.module)
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Builder for declaring a [`RecordType`].
#[derive(Debug)]
pub struct RecordTypeBuilder {
    module: String,
    name: String,
    fields: Vec<FieldDef>,
}

impl RecordTypeBuilder {
    /// Adds a required field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, ty: impl Into<DeclaredType>) -> Self {
        self.fields.push(FieldDef::new(name, ty.into()));
        self
    }

    /// Adds a field with a default value.
    #[must_use]
    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        ty: impl Into<DeclaredType>,
        default: impl Into<Native>,
    ) -> Self {
        self.fields
            .push(FieldDef::new(name, ty.into()).with_default(default));
        self
    }

    /// Adds a prepared field definition.
    #[must_use]
    pub fn field_def(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Validates the declaration and builds the record type.
    ///
    /// # Errors
    /// Returns `SchemaError` if a field name is empty or duplicated, or a
    /// required field follows a defaulted one.
    pub fn build(self) -> std::result::Result<Arc<RecordType>, SchemaError> {
        let qualified = format!("{}.{}", self.module, self.name);
        if self.name.is_empty() {
            return Err(SchemaError::EmptyName {
                kind: "record",
                owner: self.module,
            });
        }
        validate_fields(&qualified, &self.fields)?;
        Ok(Arc::new(RecordType {
            module: self.module,
            name: self.name,
            fields: self.fields,
            routines: RwLock::new(Routines::default()),
        }))
    }
}

/// Record instance.
#[derive(Clone)]
pub struct Record {
    ty: Arc<RecordType>,
    values: Vec<Native>,
}

impl Record {
    /// Constructs a record from named arguments, applying declared defaults.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] for an unknown field name or a
    /// missing required field.
    pub fn new<I, K>(ty: &Arc<RecordType>, args: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Native)>,
        K: AsRef<str>,
    {
        let args = args
            .into_iter()
            .map(|(name, value)| {
                ty.field_index(name.as_ref())
                    .map(|index| (index, value))
                    .ok_or_else(|| {
                        Error::invalid_argument(format!(
                            "{}() got an unexpected keyword argument '{}'",
                            ty.name,
                            name.as_ref()
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        ty.instantiate(args)
    }

    /// Returns the record type.
    #[must_use]
    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.ty
    }

    /// Returns the field values in declaration order.
    #[must_use]
    pub fn values(&self) -> &[Native] {
        &self.values
    }

    /// Returns the value of a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Native> {
        self.ty.field_index(name).map(|index| &self.values[index])
    }

    /// Replaces the value of a field.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if the record has no such field.
    pub fn set(&mut self, name: &str, value: impl Into<Native>) -> Result<()> {
        let index = self.ty.field_index(name).ok_or_else(|| {
            Error::invalid_argument(format!(
                "{} has no field '{name}'",
                self.ty.qualified_name()
            ))
        })?;
        self.values[index] = value.into();
        Ok(())
    }

    /// Iterates over `(field name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Native)> {
        self.ty
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .zip(&self.values)
    }

    /// Converts the record to its generic form with the installed routine.
    ///
    /// # Errors
    /// Returns [`Error::NotInstalled`] if no encode routine is installed, or
    /// whatever the routine reports for values that do not fit their type.
    pub fn to_value(&self, options: &ConvertOptions) -> Result<Value> {
        let routine = self.ty.encoder()?;
        routine(self, options)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.ty, &other.ty) || self.ty == other.ty) && self.values == other.values
    }
}

impl Hash for Record {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ty.name.hash(state);
        self.values.hash(state);
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(&self.ty.name);
        for (name, value) in self.iter() {
            out.field(name, value);
        }
        out.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> Arc<RecordType> {
        RecordType::builder("geometry", "Point")
            .field("x", DeclaredType::INT)
            .field_with_default("y", DeclaredType::INT, 0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(point().qualified_name(), "geometry.Point");
    }

    #[test]
    fn test_new_applies_defaults() {
        let ty = point();
        let record = Record::new(&ty, [("x", Native::from(3))]).unwrap();
        assert_eq!(record.get("x"), Some(&Native::Int(3)));
        assert_eq!(record.get("y"), Some(&Native::Int(0)));
    }

    #[test]
    fn test_new_rejects_unknown_field() {
        let ty = point();
        let err = Record::new(&ty, [("x", Native::from(1)), ("z", Native::from(2))]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_new_requires_required_fields() {
        let ty = point();
        let err = Record::new(&ty, Vec::<(&str, Native)>::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid argument: Point() missing required argument: 'x'"
        );
    }

    #[test]
    fn test_set_and_iter() {
        let ty = point();
        let mut record = Record::new(&ty, [("x", Native::from(1))]).unwrap();
        record.set("y", 7).unwrap();
        assert!(record.set("nope", 1).is_err());
        let names: Vec<_> = record.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["x", "y"]);
        assert_eq!(record.values(), &[Native::Int(1), Native::Int(7)]);
    }

    #[test]
    fn test_routines_not_installed() {
        let ty = point();
        let record = Record::new(&ty, [("x", Native::from(1))]).unwrap();
        assert!(!ty.has_encoder());
        assert!(matches!(
            record.to_value(&ConvertOptions::new()),
            Err(Error::NotInstalled { direction: "encode", .. })
        ));
        assert!(matches!(
            ty.from_value(&Value::Null, &ConvertOptions::new()),
            Err(Error::NotInstalled { direction: "decode", .. })
        ));
    }

    #[test]
    fn test_install_replaces_routine() {
        let ty = point();
        ty.install_encode(Arc::new(|_, _| Ok(Value::Int(1))));
        ty.install_encode(Arc::new(|_, _| Ok(Value::Int(2))));
        let record = Record::new(&ty, [("x", Native::from(1))]).unwrap();
        assert_eq!(record.to_value(&ConvertOptions::new()).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_debug_output() {
        let ty = point();
        let record = Record::new(&ty, [("x", Native::from(1))]).unwrap();
        assert_eq!(format!("{record:?}"), "Point { x: Int(1), y: Int(0) }");
    }
}
