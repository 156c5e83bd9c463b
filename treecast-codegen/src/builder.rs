//! Per-record routine assembly.
//!
//! [`RoutineBuilder`] walks a record type's fields in declaration order,
//! synthesizes one conversion per field and composes them into the record's
//! encode and decode routines.

use crate::error::CodegenError;
use crate::imports::NamespaceSet;
use crate::synth::{FieldContext, ValueDecoder, ValueEncoder, decoder, encoder};
use std::sync::{Arc, Weak};
use treecast_core::{ConvertOptions, Error, Map, Result, Value};
use treecast_schema::{DecodeRoutine, EncodeRoutine, Native, Record, RecordType};

/// Presence of a field in decode input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot<'a> {
    /// The key is absent.
    Missing,
    /// The key is present with an explicit null.
    Null,
    /// The key is present with a value.
    Present(&'a Value),
}

impl<'a> Slot<'a> {
    /// Looks up a field name in a mapping.
    #[must_use]
    pub fn lookup(map: &'a Map, field: &str) -> Self {
        match map.get_str(field) {
            None => Self::Missing,
            Some(Value::Null) => Self::Null,
            Some(value) => Self::Present(value),
        }
    }
}

struct EncodePlan {
    name: Arc<str>,
    encode: ValueEncoder,
}

struct DecodePlan {
    name: Arc<str>,
    index: usize,
    required: bool,
    type_name: String,
    decode: ValueDecoder,
}

/// Outcome of compiling one record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Qualified record name.
    pub record: String,
    /// Number of fields converted.
    pub fields: usize,
    /// Whether routines were installed; records without fields get none.
    pub installed: bool,
    /// Namespaces the record's field types refer to beyond the standard ones.
    pub namespaces: Vec<String>,
}

/// Builds and installs the conversion routines of one record type.
pub struct RoutineBuilder {
    record: Arc<RecordType>,
    namespaces: NamespaceSet,
}

impl RoutineBuilder {
    /// Creates a builder for a record type.
    #[must_use]
    pub fn new(record: &Arc<RecordType>) -> Self {
        Self {
            record: Arc::clone(record),
            namespaces: NamespaceSet::new(),
        }
    }

    /// Returns the record type being built.
    #[must_use]
    pub fn record(&self) -> &Arc<RecordType> {
        &self.record
    }

    /// Returns the namespaces bound by the last pass.
    #[must_use]
    pub fn namespaces(&self) -> &NamespaceSet {
        &self.namespaces
    }

    /// Builds the encode routine.
    ///
    /// Returns `Ok(None)` for a record type without fields.
    ///
    /// # Errors
    /// Returns `CodegenError` if a field's declared type has no conversion.
    pub fn build_encode(&mut self) -> std::result::Result<Option<EncodeRoutine>, CodegenError> {
        self.namespaces = NamespaceSet::new();
        if self.record.fields().is_empty() {
            return Ok(None);
        }

        let qualified = self.record.qualified_name();
        let mut plans = Vec::with_capacity(self.record.fields().len());
        for field in self.record.fields() {
            self.namespaces.bind_type(&field.ty);
            let ctx = FieldContext::new(&field.name, qualified.clone());
            tracing::trace!("encode plan for {}.{}: {}", qualified, field.name, field.ty);
            plans.push(EncodePlan {
                name: Arc::clone(&ctx.field),
                encode: encoder(&ctx, &field.ty)?,
            });
        }

        let routine: EncodeRoutine = Arc::new(move |record: &Record, options: &ConvertOptions| {
            encode_record(&plans, record, options)
        });
        Ok(Some(routine))
    }

    /// Builds the decode routine.
    ///
    /// Returns `Ok(None)` for a record type without fields.
    ///
    /// # Errors
    /// Returns `CodegenError` if a field's declared type has no conversion.
    pub fn build_decode(&mut self) -> std::result::Result<Option<DecodeRoutine>, CodegenError> {
        self.namespaces = NamespaceSet::new();
        if self.record.fields().is_empty() {
            return Ok(None);
        }

        let qualified = self.record.qualified_name();
        let mut plans = Vec::with_capacity(self.record.fields().len());
        for (index, field) in self.record.fields().iter().enumerate() {
            self.namespaces.bind_type(&field.ty);
            let ctx = FieldContext::new(&field.name, qualified.clone());
            tracing::trace!("decode plan for {}.{}: {}", qualified, field.name, field.ty);
            plans.push(DecodePlan {
                name: Arc::clone(&ctx.field),
                index,
                required: field.is_required(),
                type_name: field.ty.to_string(),
                decode: decoder(&ctx, &field.ty)?,
            });
        }

        // The routine is stored on the record type itself.
        let owner = Arc::downgrade(&self.record);
        let routine: DecodeRoutine = Arc::new(move |value: &Value, options: &ConvertOptions| {
            decode_record(&owner, &qualified, &plans, value, options)
        });
        Ok(Some(routine))
    }

    /// Builds both routines and installs them.
    ///
    /// Nothing is installed unless both directions build.
    ///
    /// # Errors
    /// Returns `CodegenError` if a field's declared type has no conversion.
    pub fn compile(mut self) -> std::result::Result<BuildReport, CodegenError> {
        let qualified = self.record.qualified_name();
        tracing::debug!("compiling {}", qualified);

        let encode = self.build_encode()?;
        let decode = self.build_decode()?;
        let installed = match (encode, decode) {
            (Some(encode), Some(decode)) => {
                self.record.install(encode, decode);
                tracing::debug!("installed routines for {}", qualified);
                true
            }
            _ => {
                tracing::warn!("{} declares no fields, no routines installed", qualified);
                false
            }
        };

        Ok(BuildReport {
            record: qualified,
            fields: self.record.fields().len(),
            installed,
            namespaces: self.namespaces.into_added(),
        })
    }
}

fn encode_record(plans: &[EncodePlan], record: &Record, options: &ConvertOptions) -> Result<Value> {
    let values = record.values();
    if values.len() != plans.len() {
        return Err(Error::invalid_argument(format!(
            "{} is not an instance of the record type this routine was built for",
            record.record_type().qualified_name()
        )));
    }

    let mut out = Map::with_capacity(plans.len());
    for (plan, value) in plans.iter().zip(values) {
        let encoded = if value.is_none() {
            Value::Null
        } else {
            (plan.encode)(value, options)?
        };
        out.insert(plan.name.as_ref(), encoded);
    }
    Ok(Value::Map(out))
}

fn decode_record(
    owner: &Weak<RecordType>,
    qualified: &str,
    plans: &[DecodePlan],
    value: &Value,
    options: &ConvertOptions,
) -> Result<Record> {
    let record_type = owner.upgrade().ok_or_else(|| Error::NotInstalled {
        record: qualified.to_string(),
        direction: "decode",
    })?;
    let map = value.as_map().ok_or_else(|| {
        Error::invalid_argument(format!(
            "Argument for {qualified}.from_value should be a mapping, found {}",
            value.kind()
        ))
    })?;

    let mut args: Vec<(usize, Native)> = Vec::with_capacity(plans.len());
    for plan in plans {
        match Slot::lookup(map, &plan.name) {
            Slot::Null => args.push((plan.index, Native::None)),
            Slot::Missing if plan.required => {
                return Err(Error::MissingField {
                    field: plan.name.to_string(),
                    type_name: plan.type_name.clone(),
                    record: qualified.to_string(),
                });
            }
            Slot::Missing => {}
            Slot::Present(v) => args.push((plan.index, (plan.decode)(v, options)?)),
        }
    }

    record_type.instantiate(args)
}
