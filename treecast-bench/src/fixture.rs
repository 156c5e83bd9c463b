//! Representative nested record used by the benchmarks.

use bytes::Bytes;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use std::sync::Arc;
use treecast_codegen::{CodegenError, compile_all};
use treecast_core::{EnumType, Error, Value};
use treecast_schema::{DeclaredType, Native, Record, RecordType, SchemaError};

/// Compiled record types and one populated instance.
pub struct Fixture {
    /// Line item record type.
    pub line: Arc<RecordType>,
    /// Order record type holding lines.
    pub order: Arc<RecordType>,
    /// Populated order.
    pub record: Record,
}

/// Error raised while building a fixture.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    /// Declaration error.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// Generation error.
    #[error(transparent)]
    Codegen(#[from] CodegenError),
    /// Instance construction error.
    #[error(transparent)]
    Data(#[from] Error),
}

/// Declares the line item and order record types without compiling them.
///
/// # Errors
/// Returns `SchemaError` if a declaration is invalid.
pub fn declare() -> Result<(Arc<EnumType>, Arc<RecordType>, Arc<RecordType>), SchemaError> {
    let side = EnumType::new("bench", "Side", [("BUY", Value::Int(1)), ("SELL", Value::Int(2))]);
    let line = RecordType::builder("bench", "Line")
        .field("sku", DeclaredType::Str)
        .field("quantity", DeclaredType::INT)
        .field("price", DeclaredType::FLOAT)
        .field("side", DeclaredType::Enum(Arc::clone(&side)))
        .field_with_default("memo", DeclaredType::optional(DeclaredType::Str), Native::None)
        .build()?;
    let order = RecordType::builder("bench", "Order")
        .field("id", DeclaredType::INT)
        .field("placed", DeclaredType::DATETIME)
        .field("expires", DeclaredType::TIMEDELTA)
        .field("lines", DeclaredType::list(DeclaredType::Record(Arc::clone(&line))))
        .field(
            "attributes",
            DeclaredType::dict(DeclaredType::Str, DeclaredType::Str),
        )
        .field("signature", DeclaredType::Bytes)
        .build()?;
    Ok((side, line, order))
}

fn placed() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .and_then(|d| d.and_hms_milli_opt(14, 30, 0, 125))
        .unwrap_or_default()
}

/// Builds and compiles an order fixture with `lines` line items.
///
/// # Errors
/// Returns `FixtureError` if declaring, compiling or populating fails.
pub fn order_fixture(lines: usize) -> Result<Fixture, FixtureError> {
    let (side, line, order) = declare()?;
    compile_all([&line, &order])?;

    let items = (0..lines)
        .map(|i| {
            let member = side
                .member(if i % 2 == 0 { "BUY" } else { "SELL" })
                .map_or(Native::None, Native::Enum);
            Record::new(
                &line,
                [
                    ("sku", Native::from(format!("SKU-{i:05}"))),
                    ("quantity", Native::from(i as i64 + 1)),
                    ("price", Native::from(9.99 * (i as f64 + 1.0))),
                    ("side", member),
                ],
            )
            .map(Native::Record)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let record = Record::new(
        &order,
        [
            ("id", Native::from(1001)),
            ("placed", Native::from(placed())),
            ("expires", Native::from(TimeDelta::minutes(90))),
            ("lines", Native::List(items)),
            (
                "attributes",
                Native::Dict(vec![
                    (Native::from("channel"), Native::from("web")),
                    (Native::from("region"), Native::from("eu-west")),
                ]),
            ),
            ("signature", Native::from(Bytes::from(vec![0xA5; 64]))),
        ],
    )?;

    Ok(Fixture {
        line,
        order,
        record,
    })
}
