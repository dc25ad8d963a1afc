//! The feeding progress engine: streaks, level bands, achievements, and
//! windowed activity counts, all derived from the raw event history.
//!
//! Every function here is pure. The evaluation instant (`now` / `today`) is
//! always a parameter, never read from the system clock, so callers control
//! it and tests are deterministic.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

/// Level bands in ascending order with their inclusive point thresholds.
pub const LEVELS: &[(&str, i64)] = &[
    ("Curious Parent", 0),
    ("Food Explorer", 50),
    ("Nutrition Navigator", 150),
    ("Feeding Expert", 300),
    ("Baby Food Master", 500),
];

#[derive(Debug, Clone, Copy)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// Fixed achievement table, in the order rules are evaluated.
pub const ACHIEVEMENTS: &[Achievement] = &[
    Achievement {
        id: "first_food",
        name: "First Food",
        description: "Introduced your first food",
    },
    Achievement {
        id: "week_streak",
        name: "Week Warrior",
        description: "7-day tracking streak",
    },
    Achievement {
        id: "food_explorer",
        name: "Food Explorer",
        description: "Introduced 10 different foods",
    },
    Achievement {
        id: "recipe_master",
        name: "Recipe Master",
        description: "Tried 5 recipes",
    },
    Achievement {
        id: "consistent_tracker",
        name: "Consistent Tracker",
        description: "30-day streak",
    },
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Streaks {
    pub current: i64,
    pub longest: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelInfo {
    pub label: &'static str,
    pub progress_percent: i64,
}

/// Aggregated stats the achievement rules run against.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressStats {
    pub foods_introduced: i64,
    pub recipes_tried: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
}

#[derive(Debug, Clone, Default)]
pub struct AchievementUpdate {
    /// Full unlocked set after evaluation: always a superset of the input.
    pub unlocked: Vec<String>,
    /// Ids added by this evaluation, for notification.
    pub newly_unlocked: Vec<String>,
}

/// Count events inside the trailing window `[now - days, now]`. Both
/// boundaries are inclusive; timestamps after `now` fall outside every
/// window.
#[must_use]
pub fn count_in_window(timestamps: &[DateTime<Utc>], now: DateTime<Utc>, days: i64) -> usize {
    let start = window_start(now, days);
    timestamps.iter().filter(|t| **t >= start && **t <= now).count()
}

/// Trailing-window start for the standard 7- and 30-day windows.
#[must_use]
pub fn window_start(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days)
}

/// Derive current and longest consecutive-day streaks from activity dates.
///
/// Input order does not matter and duplicate dates count once. The current
/// streak covers the run containing `today`, or the run ending yesterday.
/// A streak only breaks once a full calendar day passes with no activity.
#[must_use]
pub fn compute_streaks(activity_dates: &[NaiveDate], today: NaiveDate) -> Streaks {
    let dates: BTreeSet<NaiveDate> = activity_dates.iter().copied().collect();
    if dates.is_empty() {
        return Streaks::default();
    }

    let yesterday = today - Duration::days(1);
    let mut longest: i64 = 0;
    let mut current: i64 = 0;

    let mut run_len: i64 = 0;
    let mut prev: Option<NaiveDate> = None;
    for &date in &dates {
        run_len = match prev {
            Some(p) if date - p == Duration::days(1) => run_len + 1,
            _ => 1,
        };
        longest = longest.max(run_len);
        // A run is "live" while it reaches today or ended yesterday.
        if date == today || date == yesterday {
            current = run_len;
        }
        prev = Some(date);
    }

    Streaks { current, longest }
}

/// Map cumulative points onto the level table: the highest band whose
/// threshold is at or below `total_points`, plus percent progress toward the
/// next band (100 in the top band). Negative points clamp to the lowest band.
#[must_use]
pub fn map_level(total_points: i64) -> LevelInfo {
    let points = total_points.max(0);

    let mut band = 0;
    for (i, (_, threshold)) in LEVELS.iter().enumerate() {
        if points >= *threshold {
            band = i;
        }
    }

    let (label, floor) = LEVELS[band];
    let progress_percent = match LEVELS.get(band + 1) {
        Some((_, ceiling)) => (points - floor) * 100 / (ceiling - floor),
        None => 100,
    };

    LevelInfo {
        label,
        progress_percent,
    }
}

/// Apply the achievement rule table. The returned set is always a superset
/// of `already_unlocked`: an achievement, once earned, is never removed
/// even if the stat behind it later regresses.
#[must_use]
pub fn evaluate_achievements(
    stats: &ProgressStats,
    already_unlocked: &[String],
) -> AchievementUpdate {
    let mut unlocked: Vec<String> = Vec::with_capacity(already_unlocked.len());
    for id in already_unlocked {
        if !unlocked.contains(id) {
            unlocked.push(id.clone());
        }
    }

    let mut newly_unlocked = Vec::new();
    for achievement in ACHIEVEMENTS {
        let earned = match achievement.id {
            "first_food" => stats.foods_introduced >= 1,
            "week_streak" => stats.current_streak >= 7,
            "food_explorer" => stats.foods_introduced >= 10,
            "recipe_master" => stats.recipes_tried >= 5,
            "consistent_tracker" => stats.longest_streak >= 30,
            _ => false,
        };
        if earned && !unlocked.iter().any(|id| id == achievement.id) {
            unlocked.push(achievement.id.to_string());
            newly_unlocked.push(achievement.id.to_string());
        }
    }

    AchievementUpdate {
        unlocked,
        newly_unlocked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    // --- Streaks ---

    #[test]
    fn test_streaks_empty() {
        let today = d(2026, 1, 5);
        assert_eq!(compute_streaks(&[], today), Streaks::default());
    }

    #[test]
    fn test_streaks_run_including_today() {
        // Jan 1-3 + Jan 5, evaluated on Jan 3: current run is 3 days long.
        let dates = [d(2026, 1, 1), d(2026, 1, 2), d(2026, 1, 3), d(2026, 1, 5)];
        let streaks = compute_streaks(&dates, d(2026, 1, 3));
        assert_eq!(streaks, Streaks { current: 3, longest: 3 });
    }

    #[test]
    fn test_streaks_after_gap() {
        // Same dates on Jan 5: the gap on Jan 4 reset the run.
        let dates = [d(2026, 1, 1), d(2026, 1, 2), d(2026, 1, 3), d(2026, 1, 5)];
        let streaks = compute_streaks(&dates, d(2026, 1, 5));
        assert_eq!(streaks, Streaks { current: 1, longest: 3 });
    }

    #[test]
    fn test_streaks_live_through_yesterday() {
        // No activity yet today; yesterday's run still counts as current.
        let dates = [d(2026, 1, 2), d(2026, 1, 3), d(2026, 1, 4)];
        let streaks = compute_streaks(&dates, d(2026, 1, 5));
        assert_eq!(streaks, Streaks { current: 3, longest: 3 });
    }

    #[test]
    fn test_streaks_broken_after_full_empty_day() {
        let dates = [d(2026, 1, 2), d(2026, 1, 3)];
        let streaks = compute_streaks(&dates, d(2026, 1, 5));
        assert_eq!(streaks, Streaks { current: 0, longest: 2 });
    }

    #[test]
    fn test_streaks_order_insensitive_and_dedup() {
        let today = d(2026, 1, 3);
        let shuffled = [
            d(2026, 1, 3),
            d(2026, 1, 1),
            d(2026, 1, 2),
            d(2026, 1, 2),
            d(2026, 1, 1),
        ];
        let sorted = [d(2026, 1, 1), d(2026, 1, 2), d(2026, 1, 3)];
        assert_eq!(
            compute_streaks(&shuffled, today),
            compute_streaks(&sorted, today)
        );
        assert_eq!(compute_streaks(&shuffled, today).current, 3);
    }

    #[test]
    fn test_streaks_longest_in_past() {
        // Long run far in the past, short live run now.
        let dates = [
            d(2025, 11, 1),
            d(2025, 11, 2),
            d(2025, 11, 3),
            d(2025, 11, 4),
            d(2025, 11, 5),
            d(2026, 1, 4),
            d(2026, 1, 5),
        ];
        let streaks = compute_streaks(&dates, d(2026, 1, 5));
        assert_eq!(streaks, Streaks { current: 2, longest: 5 });
    }

    // --- Level mapping ---

    #[test]
    fn test_map_level_zero_points() {
        let info = map_level(0);
        assert_eq!(info.label, "Curious Parent");
        assert_eq!(info.progress_percent, 0);
    }

    #[test]
    fn test_map_level_negative_clamps() {
        let info = map_level(-40);
        assert_eq!(info.label, "Curious Parent");
        assert_eq!(info.progress_percent, 0);
    }

    #[test]
    fn test_map_level_mid_band() {
        // 25 points: halfway from 0 toward the 50-point threshold.
        let info = map_level(25);
        assert_eq!(info.label, "Curious Parent");
        assert_eq!(info.progress_percent, 50);
    }

    #[test]
    fn test_map_level_band_boundaries() {
        assert_eq!(map_level(50).label, "Food Explorer");
        assert_eq!(map_level(50).progress_percent, 0);
        assert_eq!(map_level(149).label, "Food Explorer");
        assert_eq!(map_level(150).label, "Nutrition Navigator");
        assert_eq!(map_level(300).label, "Feeding Expert");
    }

    #[test]
    fn test_map_level_top_band() {
        assert_eq!(map_level(500).label, "Baby Food Master");
        assert_eq!(map_level(500).progress_percent, 100);
        assert_eq!(map_level(10_000).progress_percent, 100);
    }

    #[test]
    fn test_map_level_percent_bounds_and_monotone() {
        let mut prev_label = map_level(0).label;
        let mut prev_pct = -1;
        for points in 0..=600 {
            let info = map_level(points);
            assert!((0..=100).contains(&info.progress_percent), "at {points}");
            if info.label == prev_label {
                assert!(info.progress_percent >= prev_pct, "at {points}");
            } else {
                prev_label = info.label;
            }
            prev_pct = info.progress_percent;
        }
    }

    // --- Achievements ---

    #[test]
    fn test_achievements_food_rules() {
        let stats = ProgressStats {
            foods_introduced: 10,
            ..ProgressStats::default()
        };
        let update = evaluate_achievements(&stats, &[]);
        assert!(update.unlocked.iter().any(|id| id == "first_food"));
        assert!(update.unlocked.iter().any(|id| id == "food_explorer"));
        assert!(!update.unlocked.iter().any(|id| id == "recipe_master"));
        assert_eq!(update.unlocked, update.newly_unlocked);
    }

    #[test]
    fn test_achievements_streak_rules() {
        let stats = ProgressStats {
            current_streak: 7,
            longest_streak: 30,
            ..ProgressStats::default()
        };
        let update = evaluate_achievements(&stats, &[]);
        assert!(update.unlocked.iter().any(|id| id == "week_streak"));
        assert!(update.unlocked.iter().any(|id| id == "consistent_tracker"));
    }

    #[test]
    fn test_achievements_monotonic_after_regression() {
        // week_streak was earned earlier; the streak has since reset to 0.
        let already = vec!["week_streak".to_string()];
        let stats = ProgressStats {
            foods_introduced: 1,
            ..ProgressStats::default()
        };
        let update = evaluate_achievements(&stats, &already);
        assert!(update.unlocked.iter().any(|id| id == "week_streak"));
        assert_eq!(update.newly_unlocked, vec!["first_food".to_string()]);
    }

    #[test]
    fn test_achievements_no_duplicates() {
        let already = vec!["first_food".to_string(), "first_food".to_string()];
        let stats = ProgressStats {
            foods_introduced: 3,
            ..ProgressStats::default()
        };
        let update = evaluate_achievements(&stats, &already);
        let count = update.unlocked.iter().filter(|id| *id == "first_food").count();
        assert_eq!(count, 1);
        assert!(update.newly_unlocked.is_empty());
    }

    #[test]
    fn test_achievements_superset_property() {
        let already = vec!["recipe_master".to_string(), "week_streak".to_string()];
        let update = evaluate_achievements(&ProgressStats::default(), &already);
        for id in &already {
            assert!(update.unlocked.contains(id));
        }
        assert!(update.newly_unlocked.is_empty());
    }

    // --- Activity windows ---

    #[test]
    fn test_count_in_window() {
        let now = Utc.with_ymd_and_hms(2026, 1, 31, 12, 0, 0).unwrap();
        let timestamps = vec![
            now - Duration::days(1),
            now - Duration::days(6),
            now - Duration::days(8),
            now - Duration::days(29),
            now - Duration::days(40),
        ];
        assert_eq!(count_in_window(&timestamps, now, 7), 2);
        assert_eq!(count_in_window(&timestamps, now, 30), 4);
    }

    #[test]
    fn test_count_in_window_boundaries_inclusive() {
        let now = Utc.with_ymd_and_hms(2026, 1, 31, 12, 0, 0).unwrap();
        let at_boundaries = vec![window_start(now, 7), now];
        assert_eq!(count_in_window(&at_boundaries, now, 7), 2);
    }

    #[test]
    fn test_count_in_window_ignores_future_timestamps() {
        let now = Utc.with_ymd_and_hms(2026, 1, 31, 12, 0, 0).unwrap();
        let timestamps = vec![now - Duration::days(1), now + Duration::hours(1)];
        assert_eq!(count_in_window(&timestamps, now, 7), 1);
        assert_eq!(count_in_window(&timestamps, now, 30), 1);
    }

    #[test]
    fn test_levels_table_is_sorted() {
        for pair in LEVELS.windows(2) {
            assert!(pair[0].1 < pair[1].1);
        }
        assert_eq!(LEVELS.len(), 5);
        assert_eq!(LEVELS[0].1, 0);
    }
}
