//! Decode-side synthesis: generic form to native field values.

use super::{FieldContext, first_match};
use crate::error::CodegenError;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::Arc;
use treecast_core::{ConvertOptions, EnumType, Error, Map, Result, Value, decode_bytes};
use treecast_schema::{
    ContainerKind, DeclaredType, Native, NativePairs, PrimitiveKind, RecordType, TemporalKind,
    TypeShape, classify,
};

/// Composed conversion of one generic value to native form.
pub type ValueDecoder = Arc<dyn Fn(&Value, &ConvertOptions) -> Result<Native> + Send + Sync>;

/// Builds decoders for the declared types of one field.
pub struct DecodeSynthesizer<'a> {
    ctx: &'a FieldContext,
}

impl<'a> DecodeSynthesizer<'a> {
    /// Creates a synthesizer for a field.
    #[must_use]
    pub const fn new(ctx: &'a FieldContext) -> Self {
        Self { ctx }
    }

    /// Builds the decoder for a declared type, recursing into its element
    /// types.
    ///
    /// # Errors
    /// Returns `CodegenError` if the type, or any type nested in it, has no
    /// conversion.
    pub fn synthesize(&self, ty: &DeclaredType) -> std::result::Result<ValueDecoder, CodegenError> {
        let shape = classify(ty);
        let expected = ty.to_string();

        let decoder = match shape {
            TypeShape::Record(record) => self.record(record),
            TypeShape::Primitive(kind) => self.primitive(kind),
            TypeShape::Enumeration(enum_type) => self.enumeration(enum_type),
            TypeShape::Temporal(kind) => self.temporal(kind),
            TypeShape::Container { kind, elements } => self.container(kind, elements, expected)?,
            TypeShape::Optional(inner) => {
                let inner = self.synthesize(inner)?;
                Arc::new(move |value: &Value, options: &ConvertOptions| {
                    if value.is_null() {
                        Ok(Native::None)
                    } else {
                        inner(value, options)
                    }
                })
            }
            TypeShape::Union(alternatives) => {
                let decoders = alternatives
                    .iter()
                    .map(|alt| self.synthesize(alt))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                let ctx = self.ctx.clone();
                Arc::new(move |value: &Value, options: &ConvertOptions| {
                    first_match(&ctx, &expected, &decoders, |decode| decode(value, options))
                })
            }
            TypeShape::PassThrough => {
                Arc::new(|value: &Value, _: &ConvertOptions| Ok(Native::from_plain(value)))
            }
            TypeShape::Unparameterized { .. } | TypeShape::Unsupported { .. } => {
                return Err(self.ctx.reject(ty, &shape));
            }
        };

        Ok(decoder)
    }

    fn record(&self, record: &Arc<RecordType>) -> ValueDecoder {
        let ctx = self.ctx.clone();
        let target = Arc::clone(record);
        Arc::new(move |value: &Value, options: &ConvertOptions| {
            if value.as_map().is_none() {
                return Err(ctx.mismatch(&target.qualified_name(), value.kind()));
            }
            target.from_value(value, options).map(Native::Record)
        })
    }

    fn scalar(&self, expected: &'static str, convert: fn(&Value) -> Option<Native>) -> ValueDecoder {
        let ctx = self.ctx.clone();
        Arc::new(move |value: &Value, _: &ConvertOptions| {
            convert(value).ok_or_else(|| ctx.mismatch(expected, value.kind()))
        })
    }

    fn primitive(&self, kind: PrimitiveKind) -> ValueDecoder {
        let convert: fn(&Value) -> Option<Native> = match kind {
            PrimitiveKind::Bool => |v| match v {
                Value::Bool(b) => Some(Native::Bool(*b)),
                _ => None,
            },
            PrimitiveKind::Int => |v| match v {
                Value::Int(i) => Some(Native::Int(*i)),
                _ => None,
            },
            PrimitiveKind::Float => |v| match v {
                Value::Float(x) => Some(Native::Float(*x)),
                Value::Int(i) => Some(Native::Float(*i as f64)),
                _ => None,
            },
            PrimitiveKind::None => |v| v.is_null().then_some(Native::None),
        };
        self.scalar(kind.name(), convert)
    }

    fn enumeration(&self, enum_type: &Arc<EnumType>) -> ValueDecoder {
        let ctx = self.ctx.clone();
        let target = Arc::clone(enum_type);
        Arc::new(move |value: &Value, _: &ConvertOptions| match value {
            Value::Enum(member) if member.is_member_of(&target) => Ok(Native::Enum(member.clone())),
            other if other.is_scalar() => target
                .from_value(other)
                .map(Native::Enum)
                .ok_or_else(|| Error::UnknownEnumValue {
                    enum_name: target.qualified_name(),
                    value: other.to_string(),
                }),
            other => Err(ctx.mismatch(&target.qualified_name(), other.kind())),
        })
    }

    fn temporal(&self, kind: TemporalKind) -> ValueDecoder {
        if kind == TemporalKind::Duration {
            let ctx = self.ctx.clone();
            return Arc::new(move |value: &Value, _: &ConvertOptions| {
                let seconds = match value {
                    Value::Float(x) => *x,
                    Value::Int(i) => *i as f64,
                    other => return Err(ctx.mismatch("float", other.kind())),
                };
                from_seconds(seconds)
                    .map(Native::Duration)
                    .ok_or_else(|| ctx.invalid(format!("{seconds} seconds is out of range")))
            });
        }

        let parse: fn(&str) -> Option<Native> = match kind {
            TemporalKind::DateTime => |s| {
                DateTime::<FixedOffset>::from_str(s)
                    .map(Native::ZonedDateTime)
                    .or_else(|_| NaiveDateTime::from_str(s).map(Native::DateTime))
                    .ok()
            },
            TemporalKind::Date => |s| NaiveDate::from_str(s).ok().map(Native::Date),
            _ => |s| NaiveTime::from_str(s).ok().map(Native::Time),
        };
        let ctx = self.ctx.clone();
        Arc::new(move |value: &Value, _: &ConvertOptions| {
            let text = value
                .as_str()
                .ok_or_else(|| ctx.mismatch("str", value.kind()))?;
            parse(text).ok_or_else(|| {
                ctx.invalid(format!("invalid isoformat string for {}: '{text}'", kind.name()))
            })
        })
    }

    fn container(
        &self,
        kind: ContainerKind,
        elements: &[DeclaredType],
        expected: String,
    ) -> std::result::Result<ValueDecoder, CodegenError> {
        let ctx = self.ctx.clone();

        let decoder: ValueDecoder = match (kind, elements) {
            (ContainerKind::Text, _) => self.scalar("str", |v| match v {
                Value::Text(s) => Some(Native::Str(s.clone())),
                _ => None,
            }),
            (ContainerKind::ByteSequence | ContainerKind::ByteArray, _) => {
                let mutable = kind == ContainerKind::ByteArray;
                Arc::new(move |value: &Value, options: &ConvertOptions| {
                    let raw: Bytes = match (options.use_bytes, value) {
                        (true, Value::Bytes(b)) => b.clone(),
                        (false, Value::Text(s)) => decode_bytes(s).map_err(|e| match e {
                            Error::InvalidValue { reason, .. } => ctx.invalid(reason),
                            other => other,
                        })?,
                        (true, other) => return Err(ctx.mismatch("bytes", other.kind())),
                        (false, other) => return Err(ctx.mismatch("str", other.kind())),
                    };
                    Ok(if mutable {
                        Native::ByteArray(raw.to_vec())
                    } else {
                        Native::Bytes(raw)
                    })
                })
            }
            (ContainerKind::FixedTuple, _) => {
                let decoders = elements
                    .iter()
                    .map(|ty| self.synthesize(ty))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Arc::new(move |value: &Value, options: &ConvertOptions| {
                    let items = value
                        .as_items()
                        .ok_or_else(|| ctx.mismatch(&expected, value.kind()))?;
                    if items.len() != decoders.len() {
                        return Err(ctx.invalid(format!(
                            "{expected} needs {} items, found {}",
                            decoders.len(),
                            items.len()
                        )));
                    }
                    items
                        .iter()
                        .zip(&decoders)
                        .map(|(item, decode)| decode(item, options))
                        .collect::<Result<Vec<_>>>()
                        .map(Native::Tuple)
                })
            }
            (ContainerKind::Mapping, [key, val]) => {
                ctx.check_key(kind, key)?;
                let (key, val) = (self.synthesize(key)?, self.synthesize(val)?);
                Arc::new(move |value: &Value, options: &ConvertOptions| match value {
                    Value::Map(map) => decode_pairs(map, &key, &val, options).map(Native::Dict),
                    other => Err(ctx.mismatch(&expected, other.kind())),
                })
            }
            (ContainerKind::ChainMap, [key, val]) => {
                ctx.check_key(kind, key)?;
                let (key, val) = (self.synthesize(key)?, self.synthesize(val)?);
                Arc::new(move |value: &Value, options: &ConvertOptions| {
                    let maps = value
                        .as_items()
                        .ok_or_else(|| ctx.mismatch(&expected, value.kind()))?;
                    maps.iter()
                        .map(|m| match m {
                            Value::Map(map) => decode_pairs(map, &key, &val, options),
                            other => Err(ctx.mismatch("map", other.kind())),
                        })
                        .collect::<Result<Vec<_>>>()
                        .map(Native::ChainMap)
                })
            }
            (_, [item]) => {
                let item = self.synthesize(item)?;
                let wrap: fn(Vec<Native>) -> Native = match kind {
                    ContainerKind::Tuple => Native::Tuple,
                    ContainerKind::Deque => |items| Native::Deque(VecDeque::from(items)),
                    ContainerKind::Set => |items| Native::Set(Native::distinct(items)),
                    ContainerKind::FrozenSet => |items| Native::FrozenSet(Native::distinct(items)),
                    _ => Native::List,
                };
                Arc::new(move |value: &Value, options: &ConvertOptions| {
                    value
                        .as_items()
                        .ok_or_else(|| ctx.mismatch(&expected, value.kind()))?
                        .iter()
                        .map(|v| item(v, options))
                        .collect::<Result<Vec<_>>>()
                        .map(wrap)
                })
            }
            _ => {
                return Err(CodegenError::unsupported_data(format!(
                    "{kind:?} with {} element types",
                    elements.len()
                )));
            }
        };

        Ok(decoder)
    }
}

fn decode_pairs(
    map: &Map,
    key: &ValueDecoder,
    val: &ValueDecoder,
    options: &ConvertOptions,
) -> Result<NativePairs> {
    map.iter()
        .map(|(k, v)| -> Result<(Native, Native)> { Ok((key(k, options)?, val(v, options)?)) })
        .collect()
}

/// Converts a seconds count to a duration, rounding to microseconds.
fn from_seconds(seconds: f64) -> Option<TimeDelta> {
    let micros = (seconds * 1e6).round();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(TimeDelta::microseconds(micros as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(ty: &DeclaredType, value: &Value, options: ConvertOptions) -> Result<Native> {
        let ctx = FieldContext::new("f", "test.R");
        let decoder = DecodeSynthesizer::new(&ctx).synthesize(ty).unwrap();
        decoder(value, &options)
    }

    #[test]
    fn test_decode_primitives() {
        let opts = ConvertOptions::new();
        assert_eq!(decode(&DeclaredType::BOOL, &Value::Bool(true), opts).unwrap(), Native::Bool(true));
        assert_eq!(
            decode(&DeclaredType::FLOAT, &Value::Int(4), opts).unwrap(),
            Native::Float(4.0)
        );
        let err = decode(&DeclaredType::INT, &Value::from("4"), opts).unwrap_err();
        assert_eq!(
            err,
            Error::Mismatch {
                field: "f".to_string(),
                expected: "int".to_string(),
                found: "text".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_temporal() {
        let opts = ConvertOptions::new();
        let expected = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_micro_opt(13, 5, 7, 250_000)
            .unwrap();
        assert_eq!(
            decode(&DeclaredType::DATETIME, &Value::from("2024-02-29T13:05:07.250"), opts).unwrap(),
            Native::DateTime(expected)
        );
        assert_eq!(
            decode(&DeclaredType::DATE, &Value::from("2024-02-29"), opts).unwrap(),
            Native::Date(expected.date())
        );
        assert_eq!(
            decode(&DeclaredType::TIMEDELTA, &Value::Float(1.5), opts).unwrap(),
            Native::Duration(TimeDelta::milliseconds(1500))
        );
        let err = decode(&DeclaredType::DATE, &Value::from("yesterday"), opts).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
    }

    #[test]
    fn test_decode_datetime_with_offset() {
        let opts = ConvertOptions::new();
        let decoded =
            decode(&DeclaredType::DATETIME, &Value::from("2024-01-01T10:00:00+00:00"), opts).unwrap();
        let dt = match decoded {
            Native::ZonedDateTime(dt) => dt,
            other => panic!("expected a zoned datetime, got {other:?}"),
        };
        assert_eq!(dt.offset().local_minus_utc(), 0);
        assert_eq!(dt.to_rfc3339(), "2024-01-01T10:00:00+00:00");

        let decoded = decode(
            &DeclaredType::DATETIME,
            &Value::from("2024-01-01T10:00:00.000250-05:30"),
            opts,
        )
        .unwrap();
        let dt = match decoded {
            Native::ZonedDateTime(dt) => dt,
            other => panic!("expected a zoned datetime, got {other:?}"),
        };
        assert_eq!(dt.offset().local_minus_utc(), -(5 * 3600 + 30 * 60));
    }

    #[test]
    fn test_decode_set_collapses_duplicates() {
        let opts = ConvertOptions::new();
        let items = Value::List(vec![Value::Int(1), Value::Int(1), Value::Int(2)]);
        assert_eq!(
            decode(&DeclaredType::set(DeclaredType::INT), &items, opts).unwrap(),
            Native::Set(vec![Native::Int(1), Native::Int(2)])
        );
        let decoded = decode(&DeclaredType::frozenset(DeclaredType::FLOAT), &items, opts).unwrap();
        let members = match decoded {
            Native::FrozenSet(members) => members,
            other => panic!("expected a frozen set, got {other:?}"),
        };
        assert_eq!(members, [Native::Float(1.0), Native::Float(2.0)]);
    }

    #[test]
    fn test_decode_bytes_policy() {
        let decoded = decode(&DeclaredType::ByteArray, &Value::from("aGVsbG8=\n"), ConvertOptions::new());
        assert_eq!(decoded.unwrap(), Native::ByteArray(b"hello".to_vec()));

        let raw = Value::Bytes(Bytes::from_static(b"hello"));
        let decoded = decode(&DeclaredType::Bytes, &raw, ConvertOptions::new().with_bytes(true));
        assert_eq!(decoded.unwrap(), Native::Bytes(Bytes::from_static(b"hello")));

        let err = decode(&DeclaredType::Bytes, &raw, ConvertOptions::new()).unwrap_err();
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_decode_enum_accepts_member_or_value() {
        let color = EnumType::new("paint", "Color", [("RED", Value::Int(1)), ("BLUE", Value::Int(2))]);
        let ty = DeclaredType::Enum(Arc::clone(&color));
        let blue = color.member("BLUE").unwrap();
        let opts = ConvertOptions::new();
        assert_eq!(decode(&ty, &Value::Int(2), opts).unwrap(), Native::Enum(blue.clone()));
        assert_eq!(
            decode(&ty, &Value::Enum(blue.clone()), opts.with_enum(true)).unwrap(),
            Native::Enum(blue)
        );
        assert!(matches!(
            decode(&ty, &Value::Int(9), opts),
            Err(Error::UnknownEnumValue { .. })
        ));
    }

    #[test]
    fn test_decode_containers_rebuild_kind() {
        let opts = ConvertOptions::new();
        let items = Value::List(vec![Value::Int(1), Value::Int(2)]);
        assert!(matches!(
            decode(&DeclaredType::deque(DeclaredType::INT), &items, opts).unwrap(),
            Native::Deque(_)
        ));
        assert!(matches!(
            decode(&DeclaredType::tuple(DeclaredType::INT), &items, opts).unwrap(),
            Native::Tuple(_)
        ));
        assert_eq!(
            decode(&DeclaredType::set(DeclaredType::INT), &items, opts).unwrap(),
            Native::Set(vec![Native::Int(2), Native::Int(1)])
        );
    }

    #[test]
    fn test_decode_optional_record_delegates() {
        let point = RecordType::builder("geo", "Point")
            .field("x", DeclaredType::INT)
            .build()
            .unwrap();
        let ctx = FieldContext::new("f", "test.R");
        let ty = DeclaredType::optional(DeclaredType::Record(Arc::clone(&point)));
        let decoder = DecodeSynthesizer::new(&ctx).synthesize(&ty).unwrap();
        assert_eq!(decoder(&Value::Null, &ConvertOptions::new()).unwrap(), Native::None);
        assert!(matches!(
            decoder(&Value::Map(Map::new()), &ConvertOptions::new()),
            Err(Error::NotInstalled { .. })
        ));
    }

    #[test]
    fn test_decode_union_first_success() {
        let ty = DeclaredType::Union(vec![DeclaredType::INT, DeclaredType::list(DeclaredType::Str)]);
        let opts = ConvertOptions::new();
        assert_eq!(decode(&ty, &Value::Int(7), opts).unwrap(), Native::Int(7));
        assert_eq!(
            decode(&ty, &Value::List(vec![Value::from("a")]), opts).unwrap(),
            Native::List(vec![Native::from("a")])
        );
        assert!(matches!(
            decode(&ty, &Value::Float(1.0), opts),
            Err(Error::NoMatchingVariant { .. })
        ));
    }
}
