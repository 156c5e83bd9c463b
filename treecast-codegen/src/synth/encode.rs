//! Encode-side synthesis: native field values to generic form.

use super::{FieldContext, first_match};
use crate::error::CodegenError;
use bytes::Bytes;
use chrono::{TimeDelta, Timelike};
use std::sync::Arc;
use treecast_core::{ConvertOptions, EnumType, Map, Result, Value, encode_bytes};
use treecast_schema::{
    ContainerKind, DeclaredType, Native, PrimitiveKind, RecordType, TemporalKind, TypeShape,
    classify,
};

/// Composed conversion of one native value to generic form.
pub type ValueEncoder = Arc<dyn Fn(&Native, &ConvertOptions) -> Result<Value> + Send + Sync>;

/// ISO-8601 layout for date-times, without fractional seconds.
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// ISO-8601 layout for times of day, without fractional seconds.
const TIME_FORMAT: &str = "%H:%M:%S";

/// Builds encoders for the declared types of one field.
pub struct EncodeSynthesizer<'a> {
    ctx: &'a FieldContext,
}

impl<'a> EncodeSynthesizer<'a> {
    /// Creates a synthesizer for a field.
    #[must_use]
    pub const fn new(ctx: &'a FieldContext) -> Self {
        Self { ctx }
    }

    /// Builds the encoder for a declared type, recursing into its element
    /// types.
    ///
    /// # Errors
    /// Returns `CodegenError` if the type, or any type nested in it, has no
    /// conversion.
    pub fn synthesize(&self, ty: &DeclaredType) -> std::result::Result<ValueEncoder, CodegenError> {
        let shape = classify(ty);
        let expected = ty.to_string();

        let encoder = match shape {
            TypeShape::Record(record) => self.record(record),
            TypeShape::Primitive(kind) => self.primitive(kind),
            TypeShape::Enumeration(enum_type) => self.enumeration(enum_type),
            TypeShape::Temporal(kind) => self.temporal(kind),
            TypeShape::Container { kind, elements } => self.container(kind, elements, expected)?,
            TypeShape::Optional(inner) => {
                let inner = self.synthesize(inner)?;
                Arc::new(move |value: &Native, options: &ConvertOptions| {
                    if value.is_none() {
                        Ok(Value::Null)
                    } else {
                        inner(value, options)
                    }
                })
            }
            TypeShape::Union(alternatives) => {
                let encoders = alternatives
                    .iter()
                    .map(|alt| self.synthesize(alt))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                let ctx = self.ctx.clone();
                Arc::new(move |value: &Native, options: &ConvertOptions| {
                    first_match(&ctx, &expected, &encoders, |encode| encode(value, options))
                })
            }
            TypeShape::PassThrough => self.pass_through(),
            TypeShape::Unparameterized { .. } | TypeShape::Unsupported { .. } => {
                return Err(self.ctx.reject(ty, &shape));
            }
        };

        Ok(encoder)
    }

    fn record(&self, record: &Arc<RecordType>) -> ValueEncoder {
        let ctx = self.ctx.clone();
        let target = Arc::clone(record);
        Arc::new(move |value: &Native, options: &ConvertOptions| match value {
            Native::Record(r) if **r.record_type() == *target => r.to_value(options),
            other => Err(ctx.mismatch(&target.qualified_name(), other.kind())),
        })
    }

    fn primitive(&self, kind: PrimitiveKind) -> ValueEncoder {
        let convert: fn(&Native) -> Option<Value> = match kind {
            PrimitiveKind::Bool => |v| match v {
                Native::Bool(b) => Some(Value::Bool(*b)),
                _ => None,
            },
            PrimitiveKind::Int => |v| match v {
                Native::Int(i) => Some(Value::Int(*i)),
                _ => None,
            },
            PrimitiveKind::Float => |v| match v {
                Native::Float(x) => Some(Value::Float(*x)),
                Native::Int(i) => Some(Value::Float(*i as f64)),
                _ => None,
            },
            PrimitiveKind::None => |v| v.is_none().then_some(Value::Null),
        };
        self.scalar(kind.name(), convert)
    }

    fn scalar(&self, expected: &'static str, convert: fn(&Native) -> Option<Value>) -> ValueEncoder {
        let ctx = self.ctx.clone();
        Arc::new(move |value: &Native, _: &ConvertOptions| {
            convert(value).ok_or_else(|| ctx.mismatch(expected, value.kind()))
        })
    }

    fn enumeration(&self, enum_type: &Arc<EnumType>) -> ValueEncoder {
        let ctx = self.ctx.clone();
        let target = Arc::clone(enum_type);
        Arc::new(move |value: &Native, options: &ConvertOptions| match value {
            Native::Enum(member) if member.is_member_of(&target) => Ok(if options.use_enum {
                Value::Enum(member.clone())
            } else {
                member.value().clone()
            }),
            other => Err(ctx.mismatch(&target.qualified_name(), other.kind())),
        })
    }

    fn temporal(&self, kind: TemporalKind) -> ValueEncoder {
        let ctx = self.ctx.clone();
        Arc::new(move |value: &Native, _: &ConvertOptions| {
            let text = match (kind, value) {
                (TemporalKind::DateTime, Native::DateTime(dt)) => {
                    dt.format(&layout(&ctx, DATETIME_FORMAT, dt.nanosecond(), "")?)
                        .to_string()
                }
                (TemporalKind::DateTime, Native::ZonedDateTime(dt)) => {
                    dt.format(&layout(&ctx, DATETIME_FORMAT, dt.nanosecond(), "%:z")?)
                        .to_string()
                }
                (TemporalKind::Date, Native::Date(d)) => d.format("%Y-%m-%d").to_string(),
                (TemporalKind::Time, Native::Time(t)) => {
                    t.format(&layout(&ctx, TIME_FORMAT, t.nanosecond(), "")?)
                        .to_string()
                }
                (TemporalKind::Duration, Native::Duration(d)) => {
                    let seconds = total_seconds(d).ok_or_else(|| {
                        ctx.invalid(format!("timedelta {d} is not a whole number of microseconds"))
                    })?;
                    return Ok(Value::Float(seconds));
                }
                (_, other) => return Err(ctx.mismatch(kind.name(), other.kind())),
            };
            Ok(Value::Text(text))
        })
    }

    fn container(
        &self,
        kind: ContainerKind,
        elements: &[DeclaredType],
        expected: String,
    ) -> std::result::Result<ValueEncoder, CodegenError> {
        let ctx = self.ctx.clone();

        let encoder: ValueEncoder = match (kind, elements) {
            (ContainerKind::Text, _) => self.scalar("str", |v| match v {
                Native::Str(s) => Some(Value::Text(s.clone())),
                _ => None,
            }),
            (ContainerKind::ByteSequence | ContainerKind::ByteArray, _) => {
                Arc::new(move |value: &Native, options: &ConvertOptions| {
                    let raw = value
                        .as_bytes()
                        .ok_or_else(|| ctx.mismatch(&expected, value.kind()))?;
                    Ok(match (options.use_bytes, value) {
                        (true, Native::Bytes(b)) => Value::Bytes(b.clone()),
                        (true, _) => Value::Bytes(Bytes::copy_from_slice(raw)),
                        (false, _) => Value::Text(encode_bytes(raw)),
                    })
                })
            }
            (ContainerKind::FixedTuple, _) => {
                let encoders = elements
                    .iter()
                    .map(|ty| self.synthesize(ty))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Arc::new(move |value: &Native, options: &ConvertOptions| {
                    let items = value
                        .items()
                        .ok_or_else(|| ctx.mismatch(&expected, value.kind()))?;
                    if items.len() != encoders.len() {
                        return Err(ctx.invalid(format!(
                            "{expected} needs {} items, found {}",
                            encoders.len(),
                            items.len()
                        )));
                    }
                    items
                        .into_iter()
                        .zip(&encoders)
                        .map(|(item, encode)| encode(item, options))
                        .collect::<Result<Vec<_>>>()
                        .map(Value::List)
                })
            }
            (ContainerKind::Mapping, [key, val]) => {
                ctx.check_key(kind, key)?;
                let (key, val) = (self.synthesize(key)?, self.synthesize(val)?);
                Arc::new(move |value: &Native, options: &ConvertOptions| match value {
                    Native::Dict(pairs) => encode_pairs(pairs, &key, &val, options).map(Value::Map),
                    other => Err(ctx.mismatch(&expected, other.kind())),
                })
            }
            (ContainerKind::ChainMap, [key, val]) => {
                ctx.check_key(kind, key)?;
                let (key, val) = (self.synthesize(key)?, self.synthesize(val)?);
                Arc::new(move |value: &Native, options: &ConvertOptions| match value {
                    Native::ChainMap(maps) => maps
                        .iter()
                        .map(|pairs| encode_pairs(pairs, &key, &val, options).map(Value::Map))
                        .collect::<Result<Vec<_>>>()
                        .map(Value::List),
                    other => Err(ctx.mismatch(&expected, other.kind())),
                })
            }
            (_, [item]) => {
                let item = self.synthesize(item)?;
                let as_set = matches!(kind, ContainerKind::Set | ContainerKind::FrozenSet);
                Arc::new(move |value: &Native, options: &ConvertOptions| {
                    let items = value
                        .items()
                        .ok_or_else(|| ctx.mismatch(&expected, value.kind()))?
                        .into_iter()
                        .map(|v| item(v, options))
                        .collect::<Result<Vec<_>>>()?;
                    Ok(if as_set {
                        Value::Set(Value::distinct(items))
                    } else {
                        Value::List(items)
                    })
                })
            }
            _ => {
                return Err(CodegenError::unsupported_data(format!(
                    "{kind:?} with {} element types",
                    elements.len()
                )));
            }
        };

        Ok(encoder)
    }

    fn pass_through(&self) -> ValueEncoder {
        let ctx = self.ctx.clone();
        Arc::new(move |value: &Native, options: &ConvertOptions| match value {
            Native::Record(r) => r.to_value(options),
            other => other.to_plain().ok_or_else(|| {
                ctx.invalid(format!(
                    "{} has no generic form without a declared type",
                    other.kind()
                ))
            }),
        })
    }
}

fn encode_pairs(
    pairs: &[(Native, Native)],
    key: &ValueEncoder,
    val: &ValueEncoder,
    options: &ConvertOptions,
) -> Result<Map> {
    let mut map = Map::with_capacity(pairs.len());
    for (k, v) in pairs {
        map.insert(key(k, options)?, val(v, options)?);
    }
    Ok(map)
}

/// Returns the layout for a time of day, with six fractional digits unless
/// the fraction is zero.
///
/// Fails if `nanos` is not a whole number of microseconds.
fn layout(ctx: &FieldContext, base: &str, nanos: u32, offset: &str) -> Result<String> {
    if nanos % 1_000 != 0 {
        return Err(ctx.invalid(format!(
            "{nanos} nanoseconds is not a whole number of microseconds"
        )));
    }
    let fraction = if nanos == 0 { "" } else { "%.6f" };
    Ok(format!("{base}{fraction}{offset}"))
}

/// Returns the duration in seconds, or `None` if it is out of range or not
/// a whole number of microseconds.
fn total_seconds(duration: &TimeDelta) -> Option<f64> {
    let micros = duration.num_microseconds()?;
    (TimeDelta::microseconds(micros) == *duration).then(|| micros as f64 / 1e6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate, NaiveTime};

    fn encode(ty: &DeclaredType, value: &Native, options: ConvertOptions) -> Result<Value> {
        let ctx = FieldContext::new("f", "test.R");
        let encoder = EncodeSynthesizer::new(&ctx).synthesize(ty).unwrap();
        encoder(value, &options)
    }

    #[test]
    fn test_encode_primitives() {
        let opts = ConvertOptions::new();
        assert_eq!(encode(&DeclaredType::INT, &Native::Int(3), opts).unwrap(), Value::Int(3));
        assert_eq!(
            encode(&DeclaredType::FLOAT, &Native::Int(2), opts).unwrap(),
            Value::Float(2.0)
        );
        let err = encode(&DeclaredType::INT, &Native::from("x"), opts).unwrap_err();
        assert!(matches!(err, treecast_core::Error::Mismatch { .. }));
    }

    #[test]
    fn test_encode_temporal() {
        let opts = ConvertOptions::new();
        let dt = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_micro_opt(13, 5, 7, 250_000)
            .unwrap();
        assert_eq!(
            encode(&DeclaredType::DATETIME, &Native::DateTime(dt), opts).unwrap(),
            Value::from("2024-02-29T13:05:07.250000")
        );
        let t = NaiveTime::from_hms_opt(8, 30, 0).unwrap();
        assert_eq!(
            encode(&DeclaredType::TIME, &Native::Time(t), opts).unwrap(),
            Value::from("08:30:00")
        );
        let t = NaiveTime::from_hms_micro_opt(8, 30, 0, 7).unwrap();
        assert_eq!(
            encode(&DeclaredType::TIME, &Native::Time(t), opts).unwrap(),
            Value::from("08:30:00.000007")
        );
        assert_eq!(
            encode(
                &DeclaredType::TIMEDELTA,
                &Native::Duration(TimeDelta::milliseconds(1500)),
                opts
            )
            .unwrap(),
            Value::Float(1.5)
        );
    }

    #[test]
    fn test_encode_zoned_datetime() {
        let opts = ConvertOptions::new();
        let dt = DateTime::parse_from_rfc3339("2024-01-01T10:00:00.5-05:30").unwrap();
        assert_eq!(
            encode(&DeclaredType::DATETIME, &Native::from(dt), opts).unwrap(),
            Value::from("2024-01-01T10:00:00.500000-05:30")
        );
        let utc = DateTime::parse_from_rfc3339("2024-01-01T10:00:00Z").unwrap();
        assert_eq!(
            encode(&DeclaredType::DATETIME, &Native::from(utc), opts).unwrap(),
            Value::from("2024-01-01T10:00:00+00:00")
        );
    }

    #[test]
    fn test_encode_rejects_sub_microsecond() {
        let opts = ConvertOptions::new();
        let err = encode(
            &DeclaredType::TIMEDELTA,
            &Native::Duration(TimeDelta::nanoseconds(1500)),
            opts,
        )
        .unwrap_err();
        assert!(matches!(err, treecast_core::Error::InvalidValue { .. }));

        let dt = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_nano_opt(0, 0, 0, 1)
            .unwrap();
        let err = encode(&DeclaredType::DATETIME, &Native::DateTime(dt), opts).unwrap_err();
        assert!(matches!(err, treecast_core::Error::InvalidValue { .. }));

        assert_eq!(
            encode(
                &DeclaredType::TIMEDELTA,
                &Native::Duration(TimeDelta::nanoseconds(-2_000)),
                opts
            )
            .unwrap(),
            Value::Float(-0.000_002)
        );
    }

    #[test]
    fn test_encode_set_collapses_equal_values() {
        let ty = DeclaredType::set(DeclaredType::FLOAT);
        let value = Native::Set(vec![Native::Int(1), Native::Float(1.0), Native::Float(2.0)]);
        assert_eq!(
            encode(&ty, &value, ConvertOptions::new()).unwrap(),
            Value::Set(vec![Value::Float(1.0), Value::Float(2.0)])
        );
    }

    #[test]
    fn test_encode_bytes_policy() {
        let value = Native::Bytes(Bytes::from_static(b"hello"));
        assert_eq!(
            encode(&DeclaredType::Bytes, &value, ConvertOptions::new()).unwrap(),
            Value::from("aGVsbG8=\n")
        );
        assert_eq!(
            encode(&DeclaredType::Bytes, &value, ConvertOptions::new().with_bytes(true)).unwrap(),
            Value::Bytes(Bytes::from_static(b"hello"))
        );
    }

    #[test]
    fn test_encode_containers() {
        let opts = ConvertOptions::new();
        let ty = DeclaredType::frozenset(DeclaredType::INT);
        let value = Native::FrozenSet(vec![Native::Int(1), Native::Int(2)]);
        assert_eq!(
            encode(&ty, &value, opts).unwrap(),
            Value::Set(vec![Value::Int(2), Value::Int(1)])
        );

        let ty = DeclaredType::chain_map(DeclaredType::Str, DeclaredType::INT);
        let value = Native::ChainMap(vec![
            vec![(Native::from("a"), Native::Int(1))],
            vec![(Native::from("b"), Native::Int(2))],
        ]);
        let encoded = encode(&ty, &value, opts).unwrap();
        assert_eq!(encoded.as_items().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn test_encode_fixed_tuple_length() {
        let ty = DeclaredType::fixed_tuple(vec![DeclaredType::INT, DeclaredType::Str]);
        let value = Native::Tuple(vec![Native::Int(1)]);
        let err = encode(&ty, &value, ConvertOptions::new()).unwrap_err();
        assert!(matches!(err, treecast_core::Error::InvalidValue { .. }));
    }

    #[test]
    fn test_encode_union_tries_in_order() {
        let ty = DeclaredType::Union(vec![DeclaredType::INT, DeclaredType::Str]);
        let opts = ConvertOptions::new();
        assert_eq!(encode(&ty, &Native::from("x"), opts).unwrap(), Value::from("x"));
        let err = encode(&ty, &Native::Bool(true), opts).unwrap_err();
        assert!(matches!(err, treecast_core::Error::NoMatchingVariant { .. }));
    }

    #[test]
    fn test_record_key_rejected() {
        let point = RecordType::builder("geo", "Point")
            .field("x", DeclaredType::INT)
            .build()
            .unwrap();
        let ctx = FieldContext::new("f", "test.R");
        let ty = DeclaredType::dict(DeclaredType::Record(point), DeclaredType::INT);
        let err = EncodeSynthesizer::new(&ctx).synthesize(&ty).err().unwrap();
        assert!(matches!(err, CodegenError::UnsupportedData { .. }));
    }

    #[test]
    fn test_unparameterized_rejected_with_hint() {
        let ctx = FieldContext::new("f", "test.R");
        let ty = DeclaredType::Bare(treecast_schema::GenericKind::Dict);
        let err = EncodeSynthesizer::new(&ctx).synthesize(&ty).err().unwrap();
        assert_eq!(err.hint(), Some("Use Dict[KT,VT] or Mapping[KT,VT] instead"));
    }
}
