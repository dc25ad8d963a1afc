use anyhow::Result;
use chrono::Utc;

use crate::config::Config;
use sprout_core::progress::{ACHIEVEMENTS, LEVELS};
use sprout_core::service::SproutService;

use super::acting_owner;
use super::helpers::progress_bar;

pub(crate) fn cmd_progress(
    service: &SproutService,
    config: &Config,
    user: Option<&str>,
    json: bool,
) -> Result<()> {
    let owner = acting_owner(service, config, user)?;
    let report = service.recompute_progress(&owner, Utc::now())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let p = &report.progress;
    println!("=== Feeding Progress ===\n");
    println!("  Level: {} ({} points)", p.feeding_level, p.total_points);
    println!(
        "  [{}] {}%{}",
        progress_bar(p.level_progress, 20),
        p.level_progress,
        next_level_hint(&p.feeding_level)
    );
    println!();
    println!("  Foods introduced: {}", report.foods_introduced);
    println!("  Recipes tried:    {}", report.recipes_tried);
    println!(
        "  Streak: {} day(s) (longest {})",
        p.current_streak, p.longest_streak
    );
    println!(
        "  Activity: {} this week, {} this month",
        report.weekly_activity, report.monthly_activity
    );

    println!("\n  Achievements:");
    for achievement in ACHIEVEMENTS {
        let id = achievement.id.to_string();
        let mark = if p.achievements.contains(&id) {
            "★"
        } else {
            "·"
        };
        let new = if report.newly_unlocked.contains(&id) {
            "  (new!)"
        } else {
            ""
        };
        println!(
            "    {mark} {} - {}{new}",
            achievement.name, achievement.description
        );
    }
    Ok(())
}

/// Name the next level band, if there is one above the current band.
fn next_level_hint(current: &str) -> String {
    let idx = LEVELS.iter().position(|(label, _)| *label == current);
    match idx.and_then(|i| LEVELS.get(i + 1)) {
        Some((next, threshold)) => format!(" to {next} ({threshold} points)"),
        None => String::new(),
    }
}
