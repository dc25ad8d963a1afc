use anyhow::Result;
use chrono::Local;

use crate::config::Config;
use sprout_core::models::NewBabyProfile;
use sprout_core::service::SproutService;

use super::acting_owner;
use super::helpers::parse_date;

/// Flattened `profile set` arguments, kept together so the clap arm in
/// main stays readable.
pub(crate) struct ProfileArgs {
    pub name: String,
    pub birth_date: String,
    pub weight: Option<f64>,
    pub feeding_type: Option<String>,
    pub allergies: Vec<String>,
    pub medical_conditions: Vec<String>,
    pub dietary_restrictions: Vec<String>,
    pub feeding_goals: Vec<String>,
}

pub(crate) fn cmd_profile_set(
    service: &SproutService,
    config: &Config,
    user: Option<&str>,
    args: ProfileArgs,
    json: bool,
) -> Result<()> {
    let owner = acting_owner(service, config, user)?;
    let birth_date = parse_date(Some(args.birth_date))?;

    let profile = NewBabyProfile {
        name: args.name,
        birth_date,
        weight_kg: args.weight,
        feeding_type: args.feeding_type,
        allergies: args.allergies,
        medical_conditions: args.medical_conditions,
        dietary_restrictions: args.dietary_restrictions,
        feeding_goals: args.feeding_goals,
    };
    let saved = service.save_profile(&owner, &profile, Local::now().date_naive())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&saved)?);
    } else {
        let name = &saved.name;
        let birth = saved.birth_date.format("%Y-%m-%d");
        println!("Saved profile for {name} (born {birth})");
    }
    Ok(())
}

pub(crate) fn cmd_profile_show(
    service: &SproutService,
    config: &Config,
    user: Option<&str>,
    json: bool,
) -> Result<()> {
    let owner = acting_owner(service, config, user)?;
    let profile = service.get_profile(&owner)?;

    let Some(p) = profile else {
        if json {
            println!("{}", serde_json::json!({ "error": "No baby profile yet" }));
        } else {
            eprintln!("No baby profile yet. Run `sprout profile set <name> --birth-date <date>`");
        }
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&p)?);
        return Ok(());
    }

    let name = &p.name;
    println!("=== {name} ===");
    println!("  Born: {}", p.birth_date.format("%Y-%m-%d"));
    if let Some(w) = p.weight_kg {
        println!("  Weight: {w:.1} kg");
    }
    if let Some(ref ft) = p.feeding_type {
        println!("  Feeding: {ft}");
    }
    if !p.allergies.is_empty() {
        println!("  Allergies: {}", p.allergies.join(", "));
    }
    if !p.medical_conditions.is_empty() {
        println!("  Conditions: {}", p.medical_conditions.join(", "));
    }
    if !p.dietary_restrictions.is_empty() {
        println!("  Restrictions: {}", p.dietary_restrictions.join(", "));
    }
    if !p.feeding_goals.is_empty() {
        println!("  Goals: {}", p.feeding_goals.join(", "));
    }
    Ok(())
}
