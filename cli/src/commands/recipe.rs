use anyhow::Result;
use chrono::Utc;
use std::process;
use tabled::{
    Table, Tabled,
    settings::Style,
};

use crate::config::Config;
use sprout_core::error::SproutError;
use sprout_core::service::SproutService;

use super::acting_owner;
use super::helpers::truncate;

pub(crate) fn cmd_recipe_list(
    service: &SproutService,
    config: &Config,
    user: Option<&str>,
    search: Option<&str>,
    favorites_only: bool,
    json: bool,
) -> Result<()> {
    let owner = acting_owner(service, config, user)?;
    let recipes = service.list_recipes(&owner, search, favorites_only)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recipes)?);
        return Ok(());
    }

    if recipes.is_empty() {
        eprintln!("No recipes found. Seed the catalog with `sprout import <catalog.json>`");
        process::exit(2);
    }

    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Servings")]
        servings: String,
        #[tabled(rename = "Time")]
        time: String,
        #[tabled(rename = "Fav")]
        favorite: String,
        #[tabled(rename = "Tried")]
        tried: String,
    }

    let rows: Vec<RecipeRow> = recipes
        .iter()
        .map(|r| RecipeRow {
            title: truncate(&r.recipe.title, 35),
            servings: r.recipe.servings.map_or_else(String::new, |s| s.to_string()),
            time: r.recipe.time.clone().unwrap_or_default(),
            favorite: if r.favorite { "♥" } else { "" }.to_string(),
            tried: if r.tried { "yes" } else { "" }.to_string(),
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_recipe_show(
    service: &SproutService,
    config: &Config,
    user: Option<&str>,
    title: &str,
    json: bool,
) -> Result<()> {
    let owner = acting_owner(service, config, user)?;
    let recipes = service.list_recipes(&owner, Some(title), false)?;
    let recipe = recipes
        .into_iter()
        .find(|r| r.recipe.title.eq_ignore_ascii_case(title))
        .ok_or_else(|| SproutError::not_found("recipe", title))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
        return Ok(());
    }

    let r = &recipe.recipe;
    println!("=== {} ===", r.title);
    if let Some(ref d) = r.description {
        println!("{d}");
    }
    if let Some(s) = r.servings {
        println!("  Servings: {s}");
    }
    if let Some(ref t) = r.time {
        println!("  Time: {t}");
    }
    if !r.ingredients.is_empty() {
        println!("\nIngredients:");
        for i in &r.ingredients {
            println!("  - {i}");
        }
    }
    if !r.method.is_empty() {
        println!("\nMethod:");
        for (n, step) in r.method.iter().enumerate() {
            println!("  {}. {step}", n + 1);
        }
    }
    if let Some(ref link) = r.link {
        println!("\n  Source: {link}");
    }
    if recipe.favorite {
        println!("\n  ♥ favorite");
    }
    Ok(())
}

pub(crate) fn cmd_recipe_favorite(
    service: &SproutService,
    config: &Config,
    user: Option<&str>,
    title: &str,
    json: bool,
) -> Result<()> {
    let owner = acting_owner(service, config, user)?;
    let (recipe, outcome) = service.toggle_recipe_favorite(&owner, title, Utc::now())?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "recipe": recipe.title, "favorite": outcome.active })
        );
    } else if outcome.active {
        println!("Added {} to favorites", recipe.title);
    } else {
        println!("Removed {} from favorites", recipe.title);
    }
    Ok(())
}

pub(crate) fn cmd_recipe_tried(
    service: &SproutService,
    config: &Config,
    user: Option<&str>,
    title: &str,
    json: bool,
) -> Result<()> {
    let owner = acting_owner(service, config, user)?;
    let (recipe, newly_tried) = service.mark_recipe_tried(&owner, title, Utc::now())?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "recipe": recipe.title, "tried": true, "first_time": newly_tried })
        );
    } else if newly_tried {
        println!("Marked {} as tried", recipe.title);
    } else {
        println!("{} was already marked as tried", recipe.title);
    }
    Ok(())
}
