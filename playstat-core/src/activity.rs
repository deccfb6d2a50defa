use std::f64::consts::FRAC_PI_2;
use std::fmt;

use playstat_db::FinishedSession;
use serde::Serialize;

const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// How regularly a player has been active over the three weeks before a date.
///
/// Each week's active playtime (session length minus AFK time, for sessions
/// that ended in that week) is mapped onto `1 / (π/2 * playtime/threshold + 1)`,
/// which is 1 for no play and tends to 0 as playtime grows past the
/// threshold. The index is `5 - 5 * mean`, so it ranges from 0 (inactive) to
/// just under 5.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActivityIndex {
    value: f64,
    date: i64,
    threshold_ms: i64,
}

impl ActivityIndex {
    pub fn new(sessions: &[FinishedSession], date: i64, threshold_ms: i64) -> Self {
        let threshold = threshold_ms.max(1) as f64;
        let weekly: [i64; 3] = std::array::from_fn(|week| {
            let week_end = date - week as i64 * WEEK_MS;
            let week_start = week_end - WEEK_MS;
            sessions
                .iter()
                .filter(|s| s.end > week_start && s.end <= week_end)
                .map(FinishedSession::active_time)
                .sum()
        });

        let mean = weekly
            .iter()
            .map(|&playtime| 1.0 / (FRAC_PI_2 * (playtime as f64 / threshold) + 1.0))
            .sum::<f64>()
            / weekly.len() as f64;

        Self {
            value: 5.0 - 5.0 * mean,
            date,
            threshold_ms,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn date(&self) -> i64 {
        self.date
    }

    pub fn threshold_ms(&self) -> i64 {
        self.threshold_ms
    }

    pub fn group(&self) -> ActivityGroup {
        match self.value {
            v if v >= 3.75 => ActivityGroup::VeryActive,
            v if v >= 2.75 => ActivityGroup::Active,
            v if v >= 1.75 => ActivityGroup::Regular,
            v if v >= 1.0 => ActivityGroup::Irregular,
            _ => ActivityGroup::Inactive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityGroup {
    VeryActive,
    Active,
    Regular,
    Irregular,
    Inactive,
}

impl fmt::Display for ActivityGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActivityGroup::VeryActive => "Very Active",
            ActivityGroup::Active => "Active",
            ActivityGroup::Regular => "Regular",
            ActivityGroup::Irregular => "Irregular",
            ActivityGroup::Inactive => "Inactive",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use playstat_db::WorldTimes;
    use uuid::Uuid;

    use super::*;

    const HOUR_MS: i64 = 60 * 60 * 1000;
    const NOW: i64 = 100 * WEEK_MS;

    fn session(end: i64, length: i64) -> FinishedSession {
        FinishedSession {
            id: None,
            player_uuid: Uuid::nil(),
            server_uuid: Uuid::nil(),
            start: end - length,
            end,
            afk_time: 0,
            mob_kills: 0,
            deaths: 0,
            world_times: WorldTimes::new(),
            player_kills: Vec::new(),
        }
    }

    #[test]
    fn test_no_sessions_is_inactive() {
        let index = ActivityIndex::new(&[], NOW, HOUR_MS / 2);

        assert_eq!(index.value(), 0.0);
        assert_eq!(index.group(), ActivityGroup::Inactive);
    }

    #[test]
    fn test_heavy_play_every_week_is_very_active() {
        let sessions: Vec<_> = (0..3)
            .map(|week| session(NOW - week * WEEK_MS - HOUR_MS, 40 * HOUR_MS))
            .collect();

        let index = ActivityIndex::new(&sessions, NOW, HOUR_MS / 2);

        assert!(index.value() > 4.9 && index.value() < 5.0);
        assert_eq!(index.group(), ActivityGroup::VeryActive);
    }

    #[test]
    fn test_sessions_outside_window_are_ignored() {
        let sessions = vec![
            session(NOW + HOUR_MS, 10 * HOUR_MS),
            session(NOW - 4 * WEEK_MS, 10 * HOUR_MS),
        ];

        let index = ActivityIndex::new(&sessions, NOW, HOUR_MS / 2);

        assert_eq!(index.value(), 0.0);
    }

    #[test]
    fn test_afk_time_does_not_count() {
        let mut idle = session(NOW - HOUR_MS, 10 * HOUR_MS);
        idle.afk_time = 10 * HOUR_MS;

        let index = ActivityIndex::new(&[idle], NOW, HOUR_MS / 2);

        assert_eq!(index.value(), 0.0);
    }

    #[test]
    fn test_one_threshold_in_one_week() {
        // One week at the threshold, two empty weeks:
        // mean = (1/(π/2 + 1) + 1 + 1) / 3
        let sessions = vec![session(NOW - HOUR_MS, HOUR_MS / 2)];

        let index = ActivityIndex::new(&sessions, NOW, HOUR_MS / 2);

        let expected = 5.0 - 5.0 * (1.0 / (FRAC_PI_2 + 1.0) + 2.0) / 3.0;
        assert!((index.value() - expected).abs() < 1e-9);
        assert_eq!(index.group(), ActivityGroup::Irregular);
    }
}
