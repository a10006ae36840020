use crate::database::db_structs::{RaceResultRow, RawResultRow};
use chrono::{DateTime, FixedOffset};
use itertools::Itertools;
use tracing::warn;

/// One event's worth of unrated participations. Groups are consumed in
/// non-decreasing `event_time` order; no ordering is imposed on `results`
/// (ranking within an event belongs to the engine).
#[derive(Debug, Clone, PartialEq)]
pub struct EventGroup {
    pub event_id: String,
    pub event_time: DateTime<FixedOffset>,
    pub results: Vec<RaceResultRow>
}

/// Drops rows whose participation/event join did not resolve. Such rows are
/// a data-integrity diagnostic, not a crash: they are logged and excluded
/// from the batch as if absent.
pub fn validate_rows(rows: Vec<RawResultRow>) -> Vec<RaceResultRow> {
    let mut resolved = Vec::with_capacity(rows.len());

    for row in rows {
        match (row.event_id, row.driver_id, row.event_time) {
            (Some(event_id), Some(driver_id), Some(event_time)) => resolved.push(RaceResultRow {
                participation_id: row.participation_id,
                event_id,
                driver_id,
                event_time,
                laps_completed: row.laps_completed,
                finish_time: row.finish_time,
                last_checkpoint: row.last_checkpoint
            }),
            _ => {
                warn!(
                    "Excluding result row for participation '{}': unresolvable event or driver",
                    row.participation_id
                );
            }
        }
    }

    resolved
}

/// Partitions rows into per-event groups ordered by event timestamp. The
/// timestamp order is load-bearing: rating state is path-dependent, so later
/// events must see the ratings produced by earlier ones. Event id breaks
/// exact-timestamp ties deterministically.
pub fn build_timeline(rows: Vec<RaceResultRow>) -> Vec<EventGroup> {
    let grouped = rows.into_iter().into_group_map_by(|row| row.event_id.clone());

    let mut timeline = grouped
        .into_iter()
        .map(|(event_id, results)| {
            // All rows of one event carry the same event timestamp; min() is
            // a guard against inconsistent join output.
            let event_time = results
                .iter()
                .map(|r| r.event_time)
                .min()
                .expect("group_map never yields an empty group");

            EventGroup {
                event_id,
                event_time,
                results
            }
        })
        .collect_vec();

    timeline.sort_by(|a, b| {
        a.event_time
            .cmp(&b.event_time)
            .then_with(|| a.event_id.cmp(&b.event_id))
    });

    timeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{event_time, generate_raw_row, generate_result_row};

    #[test]
    fn test_validate_drops_unresolvable_rows() {
        let rows = vec![
            generate_raw_row("p1", Some("e1"), Some("d1"), Some(event_time(1))),
            generate_raw_row("p2", None, Some("d2"), Some(event_time(1))),
            generate_raw_row("p3", Some("e1"), None, Some(event_time(1))),
            generate_raw_row("p4", Some("e1"), Some("d4"), None),
        ];

        let resolved = validate_rows(rows);

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].participation_id, "p1");
        assert_eq!(resolved[0].event_id, "e1");
        assert_eq!(resolved[0].driver_id, "d1");
    }

    #[test]
    fn test_timeline_groups_by_event() {
        let rows = vec![
            generate_result_row("p1", "e1", "d1", event_time(1), 10, 600.0, 4),
            generate_result_row("p2", "e1", "d2", event_time(1), 10, 610.0, 4),
            generate_result_row("p3", "e2", "d1", event_time(2), 8, 500.0, 3),
        ];

        let timeline = build_timeline(rows);

        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0].event_id, "e1");
        assert_eq!(timeline[0].results.len(), 2);
        assert_eq!(timeline[1].event_id, "e2");
        assert_eq!(timeline[1].results.len(), 1);
    }

    #[test]
    fn test_timeline_orders_by_timestamp_not_event_id() {
        // "e9" happens before "e1": chronology must win over id order.
        let rows = vec![
            generate_result_row("p1", "e1", "d1", event_time(5), 10, 600.0, 4),
            generate_result_row("p2", "e9", "d1", event_time(2), 10, 600.0, 4),
        ];

        let timeline = build_timeline(rows);

        assert_eq!(timeline[0].event_id, "e9");
        assert_eq!(timeline[1].event_id, "e1");
    }

    #[test]
    fn test_timeline_breaks_timestamp_ties_by_event_id() {
        let rows = vec![
            generate_result_row("p1", "e2", "d1", event_time(1), 10, 600.0, 4),
            generate_result_row("p2", "e1", "d2", event_time(1), 10, 600.0, 4),
        ];

        let timeline = build_timeline(rows);

        assert_eq!(timeline[0].event_id, "e1");
        assert_eq!(timeline[1].event_id, "e2");
    }
}
