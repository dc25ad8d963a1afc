use anyhow::Result;
use chrono::Local;

use crate::config::Config;
use sprout_core::service::SproutService;

use super::acting_owner;

pub(crate) fn cmd_home(
    service: &SproutService,
    config: &Config,
    user: Option<&str>,
    json: bool,
) -> Result<()> {
    let owner = acting_owner(service, config, user)?;
    let dashboard = service.dashboard(&owner)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    match dashboard.profile {
        Some(ref p) => {
            let age_days = (Local::now().date_naive() - p.birth_date).num_days();
            let months = age_days / 30;
            println!("=== {} ({months} months) ===\n", p.name);
        }
        None => {
            println!("=== sprout ===\n");
            eprintln!("No baby profile yet. Run `sprout profile set <name> --birth-date <date>`\n");
        }
    }

    println!(
        "  Foods introduced: {} of {}",
        dashboard.introduced_foods, dashboard.total_foods
    );
    println!("  Favorite recipes: {}", dashboard.favorite_recipes);
    println!("  Current streak:   {} day(s)", dashboard.current_streak);

    if let Some(ref tip) = dashboard.tip {
        println!("\n  Tip: {}", tip.title);
        println!("       {}", tip.description);
    }
    Ok(())
}
