use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SproutError};

/// The acting user. Resolved by the caller (CLI config or `--user`) and
/// passed explicitly into every owner-scoped operation, so core never
/// reads an ambient identity.
#[derive(Debug, Clone, Serialize)]
pub struct Owner {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BabyProfile {
    pub id: i64,
    pub uuid: String,
    pub owner_id: i64,
    pub name: String,
    pub birth_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feeding_type: Option<String>,
    pub allergies: Vec<String>,
    pub medical_conditions: Vec<String>,
    pub dietary_restrictions: Vec<String>,
    pub feeding_goals: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewBabyProfile {
    pub name: String,
    pub birth_date: NaiveDate,
    pub weight_kg: Option<f64>,
    pub feeding_type: Option<String>,
    pub allergies: Vec<String>,
    pub medical_conditions: Vec<String>,
    pub dietary_restrictions: Vec<String>,
    pub feeding_goals: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Food {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub food_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub age_suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub allergen_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub choking_hazard_info: Option<String>,
    #[serde(default)]
    pub iron_rich: bool,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFood {
    pub name: String,
    #[serde(default)]
    pub food_type: Option<String>,
    #[serde(default)]
    pub age_suggestion: Option<String>,
    #[serde(default)]
    pub allergen_info: Option<String>,
    #[serde(default)]
    pub choking_hazard_info: Option<String>,
    #[serde(default)]
    pub iron_rich: bool,
}

/// A catalog food joined with the acting owner's introduction status.
#[derive(Debug, Clone, Serialize)]
pub struct FoodStatus {
    #[serde(flatten)]
    pub food: Food,
    pub introduced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introduced_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introduction_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntroducedFood {
    pub id: i64,
    pub uuid: String,
    pub owner_id: i64,
    pub profile_id: i64,
    pub food_id: i64,
    pub introduced_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub method: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub servings: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub link: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRecipe {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub method: Vec<String>,
    #[serde(default)]
    pub servings: Option<i64>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

/// A catalog recipe joined with the acting owner's favorite/tried status.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeStatus {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub favorite: bool,
    pub tried: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProgress {
    pub id: i64,
    pub uuid: String,
    pub owner_id: i64,
    pub total_points: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity_date: Option<NaiveDate>,
    pub level_progress: i64,
    pub feeding_level: String,
    pub achievements: Vec<String>,
    pub updated_at: String,
}

/// What happened, for the user_activities log. The log is append-only and is
/// the engine's only source of truth for streaks and points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    FoodIntroduced,
    RecipeTried,
    RecipeFavorited,
}

impl ActivityKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::FoodIntroduced => "food_introduced",
            ActivityKind::RecipeTried => "recipe_tried",
            ActivityKind::RecipeFavorited => "recipe_favorited",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "food_introduced" => Ok(ActivityKind::FoodIntroduced),
            "recipe_tried" => Ok(ActivityKind::RecipeTried),
            "recipe_favorited" => Ok(ActivityKind::RecipeFavorited),
            _ => Err(SproutError::invalid(format!("unknown activity kind '{s}'"))),
        }
    }

    /// Points awarded per logged activity. Total points are always recomputed
    /// by summing the log, never incremented in place.
    #[must_use]
    pub fn points(self) -> i64 {
        match self {
            ActivityKind::FoodIntroduced => 10,
            ActivityKind::RecipeTried => 5,
            ActivityKind::RecipeFavorited => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityRecord {
    pub id: i64,
    pub owner_id: i64,
    pub timestamp: DateTime<Utc>,
    pub kind: ActivityKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tip {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub age_range: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTip {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub age_range: Option<String>,
}

/// Result of a relation toggle: `active` is the state *after* the call.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ToggleOutcome {
    pub active: bool,
}

/// A freshly recomputed progress row, ready to persist. This is a derived
/// cache of the engine's output; the activity log stays the source of truth.
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub total_points: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub last_activity_date: Option<NaiveDate>,
    pub level_progress: i64,
    pub feeding_level: String,
    pub achievements: Vec<String>,
}

pub fn validate_profile(profile: &NewBabyProfile, today: NaiveDate) -> Result<()> {
    if profile.name.trim().is_empty() {
        return Err(SproutError::invalid("Baby name must not be empty"));
    }
    if profile.birth_date > today {
        return Err(SproutError::invalid(format!(
            "Birth date {} is in the future",
            profile.birth_date
        )));
    }
    if profile.weight_kg.is_some_and(|w| w <= 0.0) {
        return Err(SproutError::invalid("Weight must be greater than 0"));
    }
    Ok(())
}

pub fn validate_food_data(food: &NewFood) -> Result<()> {
    if food.name.trim().is_empty() {
        return Err(SproutError::invalid("Food name must not be empty"));
    }
    Ok(())
}

pub fn validate_recipe_data(recipe: &NewRecipe) -> Result<()> {
    if recipe.title.trim().is_empty() {
        return Err(SproutError::invalid("Recipe title must not be empty"));
    }
    if recipe.servings.is_some_and(|s| s <= 0) {
        return Err(SproutError::invalid("Servings must be greater than 0"));
    }
    Ok(())
}
