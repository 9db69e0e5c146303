//! `events.csv`: the append-only delivery-event log.

use std::error::Error;
use std::path::Path;

use crate::telemetry::DeliveryEvent;

const HEADER: [&str; 6] = ["ts_s", "kind", "order_id", "runner_id", "hole", "extra_json"];

pub fn write_events_csv<P: AsRef<Path>>(
    events: &[DeliveryEvent],
    path: P,
) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADER)?;
    for event in events {
        writer.write_record([
            event.ts_s.to_string().as_str(),
            event.kind.as_str(),
            event.order_id.as_deref().unwrap_or(""),
            event
                .runner_id
                .map(|id| id.to_string())
                .unwrap_or_default()
                .as_str(),
            event
                .hole
                .map(|h| h.to_string())
                .unwrap_or_default()
                .as_str(),
            event.extra.to_string().as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::DeliveryEventKind;
    use serde_json::json;

    #[test]
    fn writes_one_row_per_event_with_stable_columns() {
        let events = vec![
            DeliveryEvent {
                ts_s: 100,
                kind: DeliveryEventKind::OrderPlaced,
                order_id: Some("order-0001".into()),
                runner_id: None,
                hole: Some(3),
                extra: json!({ "group_id": 2 }),
            },
            DeliveryEvent {
                ts_s: 800,
                kind: DeliveryEventKind::Delivered,
                order_id: Some("order-0001".into()),
                runner_id: Some(0),
                hole: Some(4),
                extra: json!({ "delivery_cycle_s": 700 }),
            },
        ];

        let file = tempfile::NamedTempFile::new().expect("tempfile");
        write_events_csv(&events, file.path()).expect("write");

        let contents = std::fs::read_to_string(file.path()).expect("read");
        let mut lines = contents.lines();
        assert_eq!(
            lines.next(),
            Some("ts_s,kind,order_id,runner_id,hole,extra_json")
        );
        let first = lines.next().expect("first row");
        assert!(first.starts_with("100,order_placed,order-0001,,3,"));
        let second = lines.next().expect("second row");
        assert!(second.starts_with("800,delivered,order-0001,0,4,"));
    }
}
