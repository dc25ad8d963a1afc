//! Bulk import of foods, recipes, and tips from a JSON catalog file.

use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::error::Result;
use crate::models::{NewFood, NewRecipe, NewTip, validate_food_data, validate_recipe_data};

/// On-disk catalog shape. All sections are optional so a file can ship
/// only foods, only recipes, or any mix.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub foods: Vec<NewFood>,
    #[serde(default)]
    pub recipes: Vec<NewRecipe>,
    #[serde(default)]
    pub tips: Vec<NewTip>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ImportSummary {
    pub foods: usize,
    pub recipes: usize,
    pub tips: usize,
}

pub fn parse_catalog(json: &str) -> Result<CatalogFile> {
    Ok(serde_json::from_str(json)?)
}

/// Validate and upsert every catalog entry. Entries are keyed by name or
/// title, so re-importing the same file updates rows in place instead of
/// duplicating them.
pub fn import_catalog(db: &Database, catalog: &CatalogFile) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    for food in &catalog.foods {
        validate_food_data(food)?;
        db.upsert_food(food)?;
        summary.foods += 1;
    }
    for recipe in &catalog.recipes {
        validate_recipe_data(recipe)?;
        db.upsert_recipe(recipe)?;
        summary.recipes += 1;
    }
    for tip in &catalog.tips {
        db.upsert_tip(tip)?;
        summary.tips += 1;
    }
    Ok(summary)
}
