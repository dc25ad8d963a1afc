use anyhow::Result;
use chrono::Utc;
use std::process;
use tabled::{
    Table, Tabled,
    settings::Style,
};

use crate::config::Config;
use sprout_core::service::SproutService;

use super::acting_owner;
use super::helpers::{parse_date, truncate};

pub(crate) fn cmd_food_list(
    service: &SproutService,
    config: &Config,
    user: Option<&str>,
    search: Option<&str>,
    category: Option<&str>,
    introduced_only: bool,
    json: bool,
) -> Result<()> {
    let owner = acting_owner(service, config, user)?;
    let foods = service.list_foods(&owner, search, category, introduced_only)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&foods)?);
        return Ok(());
    }

    if foods.is_empty() {
        eprintln!("No foods found. Seed the catalog with `sprout import <catalog.json>`");
        process::exit(2);
    }

    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Type")]
        food_type: String,
        #[tabled(rename = "Age")]
        age: String,
        #[tabled(rename = "Iron")]
        iron: String,
        #[tabled(rename = "Introduced")]
        introduced: String,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .map(|f| FoodRow {
            name: truncate(&f.food.name, 30),
            food_type: f.food.food_type.clone().unwrap_or_default(),
            age: f.food.age_suggestion.clone().unwrap_or_default(),
            iron: if f.food.iron_rich { "yes" } else { "" }.to_string(),
            introduced: f
                .introduced_date
                .map_or_else(String::new, |d| d.format("%Y-%m-%d").to_string()),
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_food_introduce(
    service: &SproutService,
    config: &Config,
    user: Option<&str>,
    name: &str,
    date: Option<String>,
    notes: Option<&str>,
    json: bool,
) -> Result<()> {
    let owner = acting_owner(service, config, user)?;
    let date = parse_date(date)?;
    let (food, outcome) =
        service.toggle_food_introduction(&owner, name, date, notes, Utc::now())?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "food": food.name, "introduced": outcome.active })
        );
    } else if outcome.active {
        println!(
            "Marked {} as introduced on {}",
            food.name,
            date.format("%Y-%m-%d")
        );
        if let Some(info) = food.allergen_info.as_deref() {
            eprintln!("  Allergen note: {info}");
        }
        if let Some(info) = food.choking_hazard_info.as_deref() {
            eprintln!("  Choking note: {info}");
        }
    } else {
        println!("Unmarked {} (no longer introduced)", food.name);
    }
    Ok(())
}
