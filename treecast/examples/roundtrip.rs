//! Example round trip of a nested record through generic form.
//!
//! Run with: `RUST_LOG=debug cargo run --example roundtrip`

use bytes::Bytes;
use chrono::{NaiveDate, TimeDelta};
use treecast::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let status = EnumType::new(
        "shop",
        "Status",
        [("OPEN", Value::from("open")), ("SHIPPED", Value::from("shipped"))],
    );

    let mut scope = TypeScope::new();
    scope.register_enum(&status)?;

    let line = RecordType::builder("shop", "Line")
        .field("sku", parse_type("str", &scope)?)
        .field("quantity", parse_type("int", &scope)?)
        .field_with_default("note", parse_type("Optional[str]", &scope)?, Native::None)
        .build()?;
    scope.register_record(&line)?;

    let order = RecordType::builder("shop", "Order")
        .field("id", parse_type("int", &scope)?)
        .field("status", parse_type("Status", &scope)?)
        .field("lines", parse_type("List[Line]", &scope)?)
        .field("placed", parse_type("datetime.datetime", &scope)?)
        .field("window", parse_type("timedelta", &scope)?)
        .field("signature", parse_type("bytes", &scope)?)
        .build()?;

    for report in compile_all([&line, &order])? {
        println!(
            "[Compile] {}: {} fields, namespaces {:?}",
            report.record, report.fields, report.namespaces
        );
    }

    let first = Record::new(
        &line,
        [("sku", Native::from("A-1")), ("quantity", Native::from(2))],
    )?;
    let placed = NaiveDate::from_ymd_opt(2024, 5, 17)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .ok_or("invalid date")?;
    let shipped = status.member("SHIPPED").ok_or("unknown member")?;

    let record = Record::new(
        &order,
        [
            ("id", Native::from(42)),
            ("status", Native::from(shipped)),
            ("lines", Native::List(vec![Native::from(first)])),
            ("placed", Native::from(placed)),
            ("window", Native::from(TimeDelta::hours(36))),
            ("signature", Native::from(Bytes::from_static(b"signed"))),
        ],
    )?;

    for options in ConvertOptions::all() {
        let value = record.to_value(&options)?;
        println!("[Encode] {options:?}\n  {value}");
        let back = order.from_value(&value, &options)?;
        assert_eq!(back, record);
    }

    let missing = order.from_value(&Value::Map(Map::new()), &ConvertOptions::new());
    if let Err(e) = missing {
        println!("[Decode] {e}");
    }

    Ok(())
}
