//! The unified coordinate stream: `coordinates.csv`, its delivery-points
//! projection, a parquet mirror, and the CSV re-reader used by round-trip
//! checks.

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, StringArray, UInt64Array, UInt8Array};
use arrow::datatypes::Schema;

use crate::telemetry::{ActorKind, CoordinateRecord};

use super::utils::{
    actor_code, bool_field, f64_field, nullable_u8_field, nullable_utf8_field, u64_field,
    u8_field, utf8_field, write_record_batch,
};

const HEADER: [&str; 8] = [
    "ts_s",
    "actor_id",
    "actor_kind",
    "lat",
    "lon",
    "hole",
    "is_delivery_event",
    "order_id",
];

fn write_rows<'a, P, I>(path: P, records: I) -> Result<(), Box<dyn Error>>
where
    P: AsRef<Path>,
    I: Iterator<Item = &'a CoordinateRecord>,
{
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADER)?;
    for record in records {
        writer.write_record([
            record.ts_s.to_string().as_str(),
            record.actor_id.as_str(),
            record.actor_kind.as_str(),
            record.lat.to_string().as_str(),
            record.lon.to_string().as_str(),
            record
                .hole
                .map(|h| h.to_string())
                .unwrap_or_default()
                .as_str(),
            if record.is_delivery_event { "true" } else { "false" },
            record.order_id.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the full stream. Records are expected in the run's output order
/// ([`crate::telemetry::SimTelemetry::sorted_coordinates`]).
pub fn write_coordinates_csv<P: AsRef<Path>>(
    records: &[CoordinateRecord],
    path: P,
) -> Result<(), Box<dyn Error>> {
    write_rows(path, records.iter())
}

/// Write the subset flagged `is_delivery_event`: exactly two rows per
/// delivered order, one golfer and one runner, sharing timestamp and
/// coordinates.
pub fn write_delivery_points_csv<P: AsRef<Path>>(
    records: &[CoordinateRecord],
    path: P,
) -> Result<(), Box<dyn Error>> {
    write_rows(path, records.iter().filter(|r| r.is_delivery_event))
}

/// Re-read a coordinates CSV written by [`write_coordinates_csv`].
pub fn read_coordinates_csv<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<CoordinateRecord>, Box<dyn Error>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let actor_kind = match row.get(2).unwrap_or_default() {
            "golfer" => ActorKind::Golfer,
            "runner" => ActorKind::Runner,
            other => return Err(format!("unknown actor kind: {other}").into()),
        };
        let hole = match row.get(5).unwrap_or_default() {
            "" => None,
            value => Some(value.parse()?),
        };
        let order_id = match row.get(7).unwrap_or_default() {
            "" => None,
            value => Some(value.to_owned()),
        };
        records.push(CoordinateRecord {
            ts_s: row.get(0).unwrap_or_default().parse()?,
            actor_id: row.get(1).unwrap_or_default().to_owned(),
            actor_kind,
            lat: row.get(3).unwrap_or_default().parse()?,
            lon: row.get(4).unwrap_or_default().parse()?,
            hole,
            is_delivery_event: row.get(6).unwrap_or_default() == "true",
            order_id,
        });
    }
    Ok(records)
}

/// Columnar mirror of `coordinates.csv` for analysis tooling.
pub fn write_coordinates_parquet<P: AsRef<Path>>(
    records: &[CoordinateRecord],
    path: P,
) -> Result<(), Box<dyn Error>> {
    let mut ts_s = Vec::with_capacity(records.len());
    let mut actor_id = Vec::with_capacity(records.len());
    let mut actor_kind = Vec::with_capacity(records.len());
    let mut lat = Vec::with_capacity(records.len());
    let mut lon = Vec::with_capacity(records.len());
    let mut hole = Vec::with_capacity(records.len());
    let mut is_delivery = Vec::with_capacity(records.len());
    let mut order_id = Vec::with_capacity(records.len());

    for record in records {
        ts_s.push(record.ts_s);
        actor_id.push(record.actor_id.clone());
        actor_kind.push(actor_code(record.actor_kind));
        lat.push(record.lat);
        lon.push(record.lon);
        hole.push(record.hole);
        is_delivery.push(record.is_delivery_event);
        order_id.push(record.order_id.clone());
    }

    let schema = Schema::new(vec![
        u64_field("ts_s"),
        utf8_field("actor_id"),
        u8_field("actor_kind"),
        f64_field("lat"),
        f64_field("lon"),
        nullable_u8_field("hole"),
        bool_field("is_delivery_event"),
        nullable_utf8_field("order_id"),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from(ts_s)),
        Arc::new(StringArray::from(actor_id)),
        Arc::new(UInt8Array::from(actor_kind)),
        Arc::new(Float64Array::from(lat)),
        Arc::new(Float64Array::from(lon)),
        Arc::new(UInt8Array::from(hole)),
        Arc::new(BooleanArray::from(is_delivery)),
        Arc::new(StringArray::from(
            order_id
                .iter()
                .map(|o| o.as_deref())
                .collect::<Vec<Option<&str>>>(),
        )),
    ];

    write_record_batch(path, schema, arrays)
}
