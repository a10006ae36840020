use crate::{
    database::db_structs::RaceResultRow,
    model::{
        constants::{ABSOLUTE_RATING_FLOOR, K_FACTOR, RATING_SCALE},
        snapshot::RatingSnapshot,
        structures::rating_update::RatingUpdate,
        timeline::EventGroup
    },
    utils::progress_utils::progress_bar
};
use itertools::Itertools;

/// Multiplayer Elo engine. Owns the rolling snapshot for one scope run and
/// threads it through the timeline one event at a time.
pub struct EloModel {
    snapshot: RatingSnapshot
}

impl EloModel {
    pub fn new(snapshot: RatingSnapshot) -> EloModel {
        EloModel { snapshot }
    }

    pub fn snapshot(&self) -> &RatingSnapshot {
        &self.snapshot
    }

    /// Rates every event group in order, applying each event's updates to the
    /// snapshot before the next event is rated. Returns all updates in
    /// processing order.
    ///
    /// Events must arrive in ascending timestamp order; rating state is
    /// path-dependent and an out-of-order event corrupts everything after it.
    pub fn process(&mut self, timeline: &[EventGroup]) -> Vec<RatingUpdate> {
        let bar = progress_bar(timeline.len() as u64, "Processing events".to_string());
        let mut all_updates = Vec::new();

        for group in timeline {
            let updates = Self::rate_event(&self.snapshot, group);

            for update in &updates {
                self.snapshot.insert_or_update(&update.driver_id, update.rating);
            }
            all_updates.extend(updates);

            if let Some(bar) = &bar {
                bar.inc(1);
            }
        }

        if let Some(bar) = &bar {
            bar.finish();
        }

        all_updates
    }

    /// Rates a single event against the given snapshot. Pure: every
    /// expectation reads the pre-event snapshot, and the snapshot is not
    /// touched. Participations without any opponent produce no update.
    pub fn rate_event(snapshot: &RatingSnapshot, group: &EventGroup) -> Vec<RatingUpdate> {
        let ranked = Self::ranked(&group.results);
        let mut updates = Vec::with_capacity(ranked.len());

        for (i, row) in ranked.iter().enumerate() {
            let position = i + 1;
            let old_rating = snapshot.rating_of(&row.driver_id);

            // An opponent is any row fielded by a different driver. A lone
            // participation (or a driver only racing themselves) is skipped
            // and recorded nowhere.
            let opponents = ranked.iter().filter(|r| r.driver_id != row.driver_id).collect_vec();
            let opponent_count = opponents.len();
            if opponent_count == 0 {
                continue;
            }

            let expected_sum: f64 = opponents
                .iter()
                .map(|opp| Self::expected_score(old_rating, snapshot.rating_of(&opp.driver_id)))
                .sum();

            let players = opponent_count + 1;
            let pairs = (players * opponent_count) as f64 / 2.0;
            let expected = expected_sum / pairs;
            let actual = (players as f64 - position as f64) / pairs;

            let change = K_FACTOR * opponent_count as f64 * (actual - expected);
            let new_rating = (old_rating + change).max(ABSOLUTE_RATING_FLOOR);

            updates.push(RatingUpdate {
                participation_id: row.participation_id.clone(),
                driver_id: row.driver_id.clone(),
                rating_before: old_rating,
                rating: new_rating,
                // Re-derived after the floor so a floored driver's delta
                // reflects the actual change.
                delta: new_rating - old_rating
            });
        }

        updates
    }

    /// Pairwise expected score for a driver facing a single opponent.
    pub fn expected_score(driver_rating: f64, opponent_rating: f64) -> f64 {
        1.0 / (1.0 + 10.0_f64.powf((opponent_rating - driver_rating) / RATING_SCALE))
    }

    /// Finish order within one event: laps completed desc, finish time asc,
    /// last checkpoint desc. Participation id breaks full ties so ranking is
    /// deterministic across reruns.
    fn ranked(results: &[RaceResultRow]) -> Vec<&RaceResultRow> {
        results
            .iter()
            .sorted_by(|a, b| {
                b.laps_completed
                    .cmp(&a.laps_completed)
                    .then_with(|| a.finish_time.total_cmp(&b.finish_time))
                    .then_with(|| b.last_checkpoint.cmp(&a.last_checkpoint))
                    .then_with(|| a.participation_id.cmp(&b.participation_id))
            })
            .collect_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::timeline::build_timeline,
        utils::test_utils::{event_time, generate_result_row, snapshot_with}
    };
    use approx::assert_abs_diff_eq;

    fn three_driver_event() -> EventGroup {
        // A completes the most laps fastest, then B, then C.
        let rows = vec![
            generate_result_row("p-a", "e1", "a", event_time(1), 12, 600.0, 8),
            generate_result_row("p-b", "e1", "b", event_time(1), 12, 615.0, 8),
            generate_result_row("p-c", "e1", "c", event_time(1), 10, 640.0, 5),
        ];
        build_timeline(rows).remove(0)
    }

    #[test]
    fn test_expected_score_equal_ratings() {
        assert_abs_diff_eq!(EloModel::expected_score(1000.0, 1000.0), 0.5);
    }

    #[test]
    fn test_expected_score_favors_higher_rating() {
        let favorite = EloModel::expected_score(1200.0, 1000.0);
        let underdog = EloModel::expected_score(1000.0, 1200.0);

        assert!(favorite > 0.5);
        assert!(underdog < 0.5);
        assert_abs_diff_eq!(favorite + underdog, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_three_equal_drivers_concrete_deltas() {
        let snapshot = RatingSnapshot::new();
        let updates = EloModel::rate_event(&snapshot, &three_driver_event());

        assert_eq!(updates.len(), 3);

        // pairs = 3; normalized expected = (2 * 0.5) / 3 = 1/3 each;
        // actual = 2/3, 1/3, 0. Equal priors make the field zero-sum.
        assert_eq!(updates[0].driver_id, "a");
        assert_abs_diff_eq!(updates[0].delta, 40.0 / 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(updates[0].rating, 1000.0 + 40.0 / 3.0, epsilon = 1e-9);

        assert_eq!(updates[1].driver_id, "b");
        assert_abs_diff_eq!(updates[1].delta, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(updates[1].rating, 1000.0, epsilon = 1e-9);

        assert_eq!(updates[2].driver_id, "c");
        assert_abs_diff_eq!(updates[2].delta, -40.0 / 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(updates[2].rating, 1000.0 - 40.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_two_player_deltas_mirror_classic_elo() {
        let snapshot = snapshot_with(&[("d1", 1100.0), ("d2", 900.0)]);
        let rows = vec![
            generate_result_row("p2", "e1", "d2", event_time(1), 10, 590.0, 4),
            generate_result_row("p1", "e1", "d1", event_time(1), 10, 600.0, 4),
        ];
        let group = build_timeline(rows).remove(0);

        let updates = EloModel::rate_event(&snapshot, &group);
        assert_eq!(updates.len(), 2);

        let winner = updates.iter().find(|u| u.driver_id == "d2").unwrap();
        let loser = updates.iter().find(|u| u.driver_id == "d1").unwrap();

        assert!(winner.delta > 0.0);
        assert_abs_diff_eq!(winner.delta, -loser.delta, epsilon = 1e-9);
    }

    #[test]
    fn test_floor_clamps_rating_and_reported_delta() {
        let snapshot = snapshot_with(&[("d1", 105.0), ("d2", 105.0)]);
        let rows = vec![
            generate_result_row("p1", "e1", "d1", event_time(1), 9, 650.0, 4),
            generate_result_row("p2", "e1", "d2", event_time(1), 10, 600.0, 4),
        ];
        let group = build_timeline(rows).remove(0);

        let updates = EloModel::rate_event(&snapshot, &group);
        let loser = updates.iter().find(|u| u.driver_id == "d1").unwrap();

        // Unclamped change would be -10.0; the floor holds at 100.0.
        assert_abs_diff_eq!(loser.rating, 100.0);
        assert_abs_diff_eq!(loser.delta, -5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_single_participation_is_skipped() {
        let snapshot = snapshot_with(&[("d1", 1234.0)]);
        let rows = vec![generate_result_row("p1", "e1", "d1", event_time(1), 10, 600.0, 4)];
        let group = build_timeline(rows).remove(0);

        let updates = EloModel::rate_event(&snapshot, &group);
        assert!(updates.is_empty());
    }

    #[test]
    fn test_driver_racing_only_themselves_is_skipped() {
        // Two rows, one driver: neither row has an opponent.
        let snapshot = RatingSnapshot::new();
        let rows = vec![
            generate_result_row("p1", "e1", "d1", event_time(1), 10, 600.0, 4),
            generate_result_row("p2", "e1", "d1", event_time(1), 10, 620.0, 4),
        ];
        let group = build_timeline(rows).remove(0);

        assert!(EloModel::rate_event(&snapshot, &group).is_empty());
    }

    #[test]
    fn test_ranking_tie_break_is_participation_id() {
        let snapshot = RatingSnapshot::new();
        let rows = vec![
            generate_result_row("p-z", "e1", "dz", event_time(1), 10, 600.0, 4),
            generate_result_row("p-a", "e1", "da", event_time(1), 10, 600.0, 4),
        ];
        let group = build_timeline(rows).remove(0);

        let updates = EloModel::rate_event(&snapshot, &group);

        // Identical laps/time/checkpoint: "p-a" ranks first.
        assert_eq!(updates[0].participation_id, "p-a");
        assert!(updates[0].delta > 0.0);
        assert!(updates[1].delta < 0.0);
    }

    #[test]
    fn test_process_threads_snapshot_between_events() {
        let rows = vec![
            generate_result_row("p1", "e1", "d1", event_time(1), 10, 600.0, 4),
            generate_result_row("p2", "e1", "d2", event_time(1), 10, 620.0, 4),
            generate_result_row("p3", "e2", "d1", event_time(2), 10, 600.0, 4),
            generate_result_row("p4", "e2", "d2", event_time(2), 10, 620.0, 4),
        ];
        let timeline = build_timeline(rows);

        let mut model = EloModel::new(RatingSnapshot::new());
        let updates = model.process(&timeline);

        assert_eq!(updates.len(), 4);

        // First win from 1000 vs 1000 is worth exactly +10; the rematch is
        // worth less because d1 is now the favorite.
        assert_abs_diff_eq!(model.snapshot().rating_of("d1"), 1019.425, epsilon = 1e-3);
        assert_abs_diff_eq!(model.snapshot().rating_of("d2"), 980.575, epsilon = 1e-3);

        let rematch_win = updates.iter().find(|u| u.participation_id == "p3").unwrap();
        assert_abs_diff_eq!(rematch_win.rating_before, 1010.0, epsilon = 1e-9);
        assert!(rematch_win.delta < 10.0);
    }

    #[test]
    fn test_rate_event_uses_pre_event_snapshot_only() {
        let snapshot = RatingSnapshot::new();
        let group = three_driver_event();

        let updates = EloModel::rate_event(&snapshot, &group);

        // Equal priors are zero-sum; mid-event mutation leaking into later
        // expectations would skew the deltas away from summing to zero.
        assert_abs_diff_eq!(updates[0].delta + updates[1].delta + updates[2].delta, 0.0, epsilon = 1e-9);
        assert_eq!(snapshot, RatingSnapshot::new());
    }
}
